//! Role x manager matrix over HTTP.
//!
//! Six users cover the valid role/isManager combinations; isManager comes
//! from the reporting hierarchy at login, never from the test.

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use badge_gate::create_app_with;
use badge_gate::db::users;
use badge_gate::jwt::{Claims, JwtConfig};
use badge_gate::models::user::NewUser;
use badge_gate::Role;

const SECRET: &str = "role-matrix-test-secret-0123456789abcdef";
const PASSWORD: &str = "TestPassword123!";

struct TestApp {
    _dir: TempDir,
    pool: SqlitePool,
    app: Router,
    jwt: JwtConfig,
}

async fn setup() -> Result<TestApp> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("role_matrix.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    let jwt = JwtConfig::new(SECRET, 15)?;
    let app = create_app_with(pool.clone(), jwt.clone()).await?;

    Ok(TestApp { _dir: dir, pool, app, jwt })
}

async fn create_user(pool: &SqlitePool, role: Role, manager_id: Option<Uuid>) -> Result<(Uuid, String)> {
    let email = format!("{}-{}@example.com", role.as_str().to_lowercase(), Uuid::new_v4());
    let user = users::insert_user(
        pool,
        NewUser {
            email: email.clone(),
            password: PASSWORD.to_string(),
            role,
            manager_id,
        },
    )
    .await?;
    Ok((user.id, email))
}

/// Creates a user of `role`, plus a direct report when `with_report` is set.
async fn create_combo(pool: &SqlitePool, role: Role, with_report: bool) -> Result<(Uuid, String)> {
    let (id, email) = create_user(pool, role, None).await?;
    if with_report {
        create_user(pool, Role::Employee, Some(id)).await?;
    }
    Ok((id, email))
}

async fn send(app: &Router, req: Request<Body>) -> Result<(StatusCode, Value)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

async fn login(app: &Router, email: &str, password: &str) -> Result<(StatusCode, Value)> {
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(json!({"email": email, "password": password}).to_string()))?;
    send(app, req).await
}

async fn login_token(app: &Router, email: &str) -> Result<String> {
    let (status, body) = login(app, email, PASSWORD).await?;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body.get("token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("login response has no token")
}

async fn get(app: &Router, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())?;
    send(app, req).await
}

fn claims(role: &str, is_manager: Option<bool>) -> Claims {
    let now = chrono::Utc::now().timestamp() as usize;
    Claims {
        sub: Uuid::new_v4(),
        role: role.to_string(),
        is_manager,
        exp: now + 600,
        iat: now,
    }
}

#[tokio::test]
async fn dashboards_follow_the_role_manager_matrix() -> Result<()> {
    let t = setup().await?;

    // (role, has reports, employee, team, issuer, admin)
    let expectations = [
        (Role::Employee, false, 200, 403, 403, 403),
        (Role::Employee, true, 200, 200, 403, 403),
        (Role::Issuer, false, 200, 403, 200, 403),
        (Role::Issuer, true, 200, 200, 200, 403),
        (Role::Admin, false, 200, 200, 200, 200),
        (Role::Admin, true, 200, 200, 200, 200),
    ];

    for (role, with_report, employee, team, issuer, admin) in expectations {
        let (_, email) = create_combo(&t.pool, role, with_report).await?;
        let token = login_token(&t.app, &email).await?;

        for (path, expected) in [
            ("/api/dashboard/employee", employee),
            ("/api/dashboard/team", team),
            ("/api/dashboard/issuer", issuer),
            ("/api/dashboard/admin", admin),
        ] {
            let (status, body) = get(&t.app, path, &token).await?;
            assert_eq!(
                status.as_u16(),
                expected,
                "{} isManager={} on {}: {}",
                role,
                with_report,
                path,
                body
            );
        }
    }

    Ok(())
}

#[tokio::test]
async fn login_computes_is_manager_from_the_hierarchy() -> Result<()> {
    let t = setup().await?;

    let (_, lead) = create_combo(&t.pool, Role::Employee, true).await?;
    let (_, solo) = create_combo(&t.pool, Role::Employee, false).await?;

    let (status, body) = login(&t.app, &lead, PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isManager"], json!(true));
    assert_eq!(body["user"]["role"], json!("EMPLOYEE"));

    let (_, body) = login(&t.app, &solo, PASSWORD).await?;
    assert_eq!(body["user"]["isManager"], json!(false));

    Ok(())
}

#[tokio::test]
async fn inactive_reports_do_not_make_a_manager() -> Result<()> {
    let t = setup().await?;

    let (lead_id, lead) = create_user(&t.pool, Role::Issuer, None).await?;
    let (report_id, _) = create_user(&t.pool, Role::Employee, Some(lead_id)).await?;
    users::set_active(&t.pool, report_id, false).await?;

    let (_, body) = login(&t.app, &lead, PASSWORD).await?;
    assert_eq!(body["user"]["isManager"], json!(false));

    Ok(())
}

#[tokio::test]
async fn permissions_endpoint_returns_the_matrix_row() -> Result<()> {
    let t = setup().await?;
    let (_, email) = create_combo(&t.pool, Role::Admin, true).await?;
    let token = login_token(&t.app, &email).await?;

    let (status, body) = get(&t.app, "/api/users/me/permissions", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "role": "ADMIN",
            "isManager": true,
            "dashboardTabs": ["my-badges", "team", "issuance", "admin"],
            "sidebarGroups": ["base", "team", "issuance", "admin"],
            "permissions": {"canViewTeam": true, "canIssueBadges": true, "canManageUsers": true}
        })
    );
    assert!(body.get("email").is_none() && body.get("userId").is_none(), "no PII expected");

    let (status, nav) = get(&t.app, "/api/users/me/navigation", &token).await?;
    assert_eq!(status, StatusCode::OK);
    let groups: Vec<&str> = nav
        .as_array()
        .context("navigation must be an array")?
        .iter()
        .filter_map(|s| s["group"].as_str())
        .collect();
    assert_eq!(groups, vec!["base", "team", "issuance", "admin"]);

    Ok(())
}

#[tokio::test]
async fn denial_carries_an_explicit_forbidden_reason() -> Result<()> {
    let t = setup().await?;
    let (_, email) = create_combo(&t.pool, Role::Employee, false).await?;
    let token = login_token(&t.app, &email).await?;

    let (status, body) = get(&t.app, "/api/dashboard/team", &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "forbidden", "message": "Manager access required"}));

    let (status, body) = get(&t.app, "/api/dashboard/admin", &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], json!("Insufficient role"));

    Ok(())
}

#[tokio::test]
async fn old_token_shape_without_is_manager_is_denied_manager_routes() -> Result<()> {
    let t = setup().await?;

    let stale_employee = t.jwt.encode_claims(&claims("EMPLOYEE", None))?;
    let (status, _) = get(&t.app, "/api/dashboard/team", &stale_employee).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get(&t.app, "/api/dashboard/employee", &stale_employee).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&t.app, "/api/users/me/permissions", &stale_employee).await?;
    assert_eq!(body["isManager"], json!(false));
    assert_eq!(body["dashboardTabs"], json!(["my-badges"]));

    // ADMIN bypass does not depend on the claim being present.
    let stale_admin = t.jwt.encode_claims(&claims("ADMIN", None))?;
    let (status, _) = get(&t.app, "/api/dashboard/team", &stale_admin).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn unknown_role_in_token_is_a_server_configuration_error() -> Result<()> {
    let t = setup().await?;
    let token = t.jwt.encode_claims(&claims("SUPERVISOR", Some(true)))?;

    let (status, body) = get(&t.app, "/api/dashboard/employee", &token).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("configuration"));

    Ok(())
}

#[tokio::test]
async fn missing_or_invalid_tokens_are_unauthenticated() -> Result<()> {
    let t = setup().await?;

    let req = Request::builder()
        .method("GET")
        .uri("/api/dashboard/employee")
        .body(Body::empty())?;
    let (status, _) = send(&t.app, req).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&t.app, "/api/users/me/permissions", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let other = JwtConfig::new("another-secret-that-is-long-enough-123", 15)?;
    let foreign = other.encode(Uuid::new_v4(), Role::Admin, true)?;
    let (status, _) = get(&t.app, "/api/dashboard/admin", &foreign).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_rejected() -> Result<()> {
    let t = setup().await?;
    let (_, email) = create_combo(&t.pool, Role::Issuer, false).await?;

    let (status, _) = login(&t.app, &email, "wrong-password").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&t.app, "nobody@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn session_cookie_authenticates_requests() -> Result<()> {
    let t = setup().await?;
    let (_, email) = create_combo(&t.pool, Role::Issuer, false).await?;

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(json!({"email": email, "password": PASSWORD}).to_string()))?;
    let resp = t.app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .context("login must set a session cookie")?;
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().context("empty cookie")?.to_string();

    let req = Request::builder()
        .method("GET")
        .uri("/api/dashboard/issuer")
        .header(header::COOKIE, cookie)
        .body(Body::empty())?;
    let (status, body) = send(&t.app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tab"], json!("issuance"));

    Ok(())
}

#[tokio::test]
async fn refresh_picks_up_hierarchy_changes() -> Result<()> {
    let t = setup().await?;

    let (lead_id, lead) = create_user(&t.pool, Role::Employee, None).await?;
    let (report_id, _) = create_user(&t.pool, Role::Employee, Some(lead_id)).await?;
    let token = login_token(&t.app, &lead).await?;

    // The report moves to another manager; the old token stays valid until refreshed.
    users::set_manager(&t.pool, report_id, None).await?;
    let (status, _) = get(&t.app, "/api/dashboard/team", &token).await?;
    assert_eq!(status, StatusCode::OK);

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())?;
    let (status, body) = send(&t.app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isManager"], json!(false));

    let fresh = body["token"].as_str().context("refresh must return a token")?;
    let (status, _) = get(&t.app, "/api/dashboard/team", fresh).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn refresh_rejects_deactivated_accounts() -> Result<()> {
    let t = setup().await?;
    let (id, email) = create_user(&t.pool, Role::Admin, None).await?;
    let token = login_token(&t.app, &email).await?;
    users::set_active(&t.pool, id, false).await?;

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())?;
    let (status, _) = send(&t.app, req).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
