//! HTTP routes for Waymark

pub mod admin;
pub mod auth_routes;
pub mod health;
pub mod hunt;

pub use admin::handle_admin_request;
pub use auth_routes::handle_login;
pub use health::{health_check, readiness_check, root_echo, version_info};
pub use hunt::handle_group_request;
