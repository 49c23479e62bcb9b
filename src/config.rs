//! Configuration for Waymark
//!
//! CLI arguments and environment variable handling using clap. Parsed
//! once at startup and carried inside the shared application state;
//! nothing reads the environment after that.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::progress::ClaimPolicy;

/// Waymark - location-based scavenger hunt backend
#[derive(Parser, Debug, Clone)]
#[command(name = "waymark")]
#[command(about = "Checkpoint progression backend for location-based scavenger hunts")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory store fallback, admin key optional)
    #[arg(long, env = "DEV_MODE", default_value = "false", action = clap::ArgAction::Set)]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "waymark")]
    pub mongodb_db: String,

    /// Geofence admission radius in kilometers
    #[arg(long, env = "ADMISSION_RADIUS_KM", default_value = "0.1")]
    pub admission_radius_km: f64,

    /// Claim ordering policy: enforce-order or flexible
    #[arg(long, env = "CLAIM_POLICY", default_value = "enforce-order")]
    pub claim_policy: String,

    /// Admin key guarding the /admin surface (required in production)
    #[arg(long, env = "ADMIN_KEY")]
    pub admin_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Parsed claim policy
    pub fn policy(&self) -> Result<ClaimPolicy, String> {
        self.claim_policy.parse()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.admission_radius_km.is_finite() || self.admission_radius_km <= 0.0 {
            return Err("ADMISSION_RADIUS_KM must be a positive number".to_string());
        }

        self.policy()?;

        if !self.dev_mode && self.admin_key.is_none() {
            return Err("ADMIN_KEY is required in production mode".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["waymark"]);
        assert_eq!(args.listen.port(), 8080);
        assert_eq!(args.mongodb_db, "waymark");
        assert!((args.admission_radius_km - 0.1).abs() < f64::EPSILON);
        assert_eq!(args.policy().unwrap(), ClaimPolicy::EnforceOrder);
        assert!(!args.dev_mode);
    }

    #[test]
    fn test_production_requires_admin_key() {
        let args = parse(&["waymark"]);
        assert!(args.validate().is_err());

        let args = parse(&["waymark", "--admin-key", "k"]);
        assert!(args.validate().is_ok());

        let args = parse(&["waymark", "--dev-mode", "true"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_radius_must_be_positive() {
        let args = parse(&["waymark", "--dev-mode", "true", "--admission-radius-km", "0"]);
        assert!(args.validate().is_err());

        let args = parse(&[
            "waymark",
            "--dev-mode",
            "true",
            "--admission-radius-km",
            "0.05",
        ]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_unknown_claim_policy_is_rejected() {
        let args = parse(&["waymark", "--dev-mode", "true", "--claim-policy", "chaotic"]);
        assert!(args.validate().is_err());

        let args = parse(&["waymark", "--dev-mode", "true", "--claim-policy", "flexible"]);
        assert_eq!(args.policy().unwrap(), ClaimPolicy::Flexible);
    }
}
