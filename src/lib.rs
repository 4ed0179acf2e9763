pub mod app;
pub mod audit;
pub mod authz;
pub mod db;
pub mod docs;
pub mod errors;
pub mod hierarchy;
pub mod jwt;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod utils;

// Re-export commonly used items for tests
pub use app::{create_app, create_app_with};
pub use authz::{can_activate, compute_permissions, GuardDeclaration, IdentityClaim, PermissionDecision, Role};
