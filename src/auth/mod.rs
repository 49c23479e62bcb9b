//! Authentication for Waymark
//!
//! Provides:
//! - Group password hashing with Argon2
//! - Static admin key check for the /admin surface

pub mod admin_key;
pub mod password;

pub use admin_key::{extract_admin_key, AdminKeyValidator};
pub use password::{hash_password, verify_password};
