use std::sync::Arc;

use axum::http::{header, HeaderMap};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::authz::{IdentityClaim, Role};
use crate::errors::AppError;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
const MIN_SECRET_LENGTH: usize = 32;

/// Token signing settings.
///
/// `exp_minutes` is also the upper bound on how stale an `isManager` claim
/// can get: hierarchy changes reach the caller at the next login or refresh.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_minutes: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>, exp_minutes: i64) -> Result<Self, AppError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::configuration(format!(
                "JWT_SECRET must be at least {} bytes (got {})",
                MIN_SECRET_LENGTH,
                secret.len()
            )));
        }
        if exp_minutes <= 0 {
            return Err(AppError::configuration("JWT_EXP_MINUTES must be positive"));
        }

        Ok(Self {
            secret: Arc::new(secret),
            exp_minutes,
        })
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_minutes = std::env::var("JWT_EXP_MINUTES")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(15))
            .map_err(|_| AppError::configuration("JWT_EXP_MINUTES must be a valid integer"))?;

        Self::new(secret.into_bytes(), exp_minutes)
    }

    pub fn encode(&self, user_id: Uuid, role: Role, is_manager: bool) -> Result<String, AppError> {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let exp = now + Duration::minutes(self.exp_minutes);

        self.encode_claims(&Claims {
            sub: user_id,
            role: role.as_str().to_string(),
            is_manager: Some(is_manager),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        })
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String, AppError> {
        jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.exp_minutes * 60
    }
}

/// Token payload. `role` stays a string on the wire so an unknown value can be
/// reported as a configuration fault instead of a generic decode failure.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    #[serde(rename = "isManager", default, skip_serializing_if = "Option::is_none")]
    pub is_manager: Option<bool>,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn into_identity(self) -> Result<IdentityClaim, AppError> {
        let role: Role = self.role.parse().map_err(|err: crate::authz::UnknownRole| {
            tracing::error!(user_id = %self.sub, role = %err.0, "token carries a role outside the closed enum");
            AppError::configuration(err.to_string())
        })?;

        Ok(IdentityClaim {
            user_id: self.sub,
            role,
            is_manager: self.is_manager,
        })
    }
}

/// Prefer the httpOnly cookie, fall back to `Authorization: Bearer`.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value);

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .filter(|token| !token.is_empty())
    })
}

pub fn access_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        ACCESS_TOKEN_COOKIE, token, max_age_secs
    )
}
