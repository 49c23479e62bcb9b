//! Shared error types for Waymark
//!
//! Every failure mode resolves to a typed value returned to the caller;
//! nothing in this crate terminates the process on a request path.
//! Geofence rejections and lost commit races are *not* errors; they are
//! negative outcomes carried by [`crate::progress::ClaimOutcome`].

use thiserror::Error;

/// Waymark error taxonomy
#[derive(Error, Debug)]
pub enum WaymarkError {
    /// Unknown group, sequence or checkpoint. Propagated to the caller
    /// as a rejection, never a crash.
    #[error("not found: {0}")]
    NotFound(String),

    /// A group's last visited checkpoint is absent from its assigned
    /// sequence. Corrupted assignment; non-retryable, logged at error
    /// level, and never conflated with hunt completion.
    #[error("integrity fault: {0}")]
    Integrity(String),

    /// The persistence layer could not be reached. Connectivity
    /// management belongs to the store, not this core.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Unique-index collision on insert. Setup inserts treat the id as
    /// already provisioned and skip the document; never surfaced over
    /// HTTP.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Credential machinery failure (hash generation, malformed stored
    /// hash). Distinct from a plain wrong-password rejection.
    #[error("auth error: {0}")]
    Auth(String),

    /// Malformed request (body too large, invalid JSON, bad path
    /// segment).
    #[error("http error: {0}")]
    Http(String),

    /// Socket-level failure while serving.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, WaymarkError>;
