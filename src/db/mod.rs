//! Persistence layer
//!
//! The store contract in `store` is the only surface the rest of the
//! crate sees. `mongo` implements it against MongoDB for production,
//! `memory` against DashMap for dev mode and tests.

pub mod memory;
pub mod mongo;
pub mod schemas;
pub mod store;

pub use memory::MemoryHuntStore;
pub use mongo::{MongoClient, MongoCollection, MongoHuntStore};
pub use store::{AppendOutcome, HuntStore};
