//! Waymark - Location-claim progression service for scavenger hunts
//!
//! Waymark tracks teams through checkpoint sequences in the field: a
//! group claims a checkpoint by reporting its position, and the claim
//! commits only when the position falls inside the admission radius and
//! the claim policy allows that checkpoint next.
//!
//! ## Services
//!
//! - **Hunt API**: current checkpoint, location claims, progress summary
//! - **Admin API**: bulk hunt setup and checkpoint recalibration
//! - **Auth**: group credential login with argon2 hashing
//! - **Store**: MongoDB-backed hunt state with an in-memory dev fallback

pub mod auth;
pub mod config;
pub mod db;
pub mod geo;
pub mod ident;
pub mod progress;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, WaymarkError};
