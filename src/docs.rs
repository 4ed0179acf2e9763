use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, errors, models, navigation, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::login,
		routes::auth::refresh,
		routes::users::my_permissions,
		routes::users::my_navigation,
		routes::dashboard::employee,
		routes::dashboard::team,
		routes::dashboard::issuer,
		routes::dashboard::admin
	),
	components(
		schemas(
			authz::Role,
			authz::DashboardTab,
			authz::SidebarGroup,
			authz::FlatCapabilities,
			authz::PermissionDecision,
			navigation::NavItem,
			navigation::NavSection,
			models::user::LoginRequest,
			models::user::SessionUser,
			models::user::AuthResponse,
			routes::health::HealthResponse,
			routes::dashboard::DashboardResponse,
			errors::ErrorResponse
		)
	),
	tags(
		(name = "Health", description = "Service health"),
		(name = "Auth", description = "Session issuance and refresh"),
		(name = "Users", description = "Capabilities of the signed-in user"),
		(name = "Dashboard", description = "Role and manager gated dashboard tabs")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc);
	add_examples(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn object_entry<'a>(parent: &'a mut Value, key: &str) -> Option<&'a mut Map<String, Value>> {
	parent
		.as_object_mut()?
		.entry(key.to_string())
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
}

fn ensure_security_components(doc: &mut Value) {
	let Some(components) = object_entry(doc, "components") else {
		return;
	};
	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()));

	if let Some(schemes) = schemes.as_object_mut() {
		schemes.insert(
			"bearerAuth".to_string(),
			json!({
				"type": "http",
				"scheme": "bearer",
				"bearerFormat": "JWT"
			}),
		);
	}
}

fn add_examples(doc: &mut Value) {
	let Some(schemas) = doc
		.get_mut("components")
		.and_then(|c| c.get_mut("schemas"))
		.and_then(Value::as_object_mut)
	else {
		return;
	};

	if let Some(schema) = schemas.get_mut("PermissionDecision").and_then(Value::as_object_mut) {
		let example = serde_json::to_value(authz::compute_permissions(authz::Role::Issuer, true)).unwrap_or_default();
		schema.insert("example".to_string(), example);
	}

	if let Some(schema) = schemas.get_mut("LoginRequest").and_then(Value::as_object_mut) {
		schema.insert(
			"example".to_string(),
			json!({ "email": "ada@example.com", "password": "S3cureP@ssw0rd" }),
		);
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
