//! Static admin key check for setup and calibration routes
//!
//! The /admin surface mutates reference data, so it sits behind a
//! shared key supplied either as `x-admin-key` or as a bearer token.
//! Without a configured key the routes are open only in dev mode;
//! config validation refuses to start production without one.

use hyper::http::HeaderMap;

/// Authorizes admin requests against the configured key
#[derive(Debug, Clone)]
pub struct AdminKeyValidator {
    key: Option<String>,
    dev_mode: bool,
}

impl AdminKeyValidator {
    pub fn new(key: Option<String>, dev_mode: bool) -> Self {
        Self { key, dev_mode }
    }

    /// Whether a provided key grants access to the admin surface
    pub fn authorize(&self, provided: Option<&str>) -> bool {
        match (&self.key, provided) {
            (Some(expected), Some(given)) => expected == given,
            (Some(_), None) => false,
            // No key configured: only acceptable in dev mode
            (None, _) => self.dev_mode,
        }
    }
}

/// Extract an admin key from request headers
///
/// Accepts `x-admin-key: <key>` or `Authorization: Bearer <key>`.
pub fn extract_admin_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get("x-admin-key").and_then(|v| v.to_str().ok()) {
        return Some(key);
    }

    headers
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::http::HeaderValue;

    #[test]
    fn test_configured_key_must_match() {
        let validator = AdminKeyValidator::new(Some("hunt-master".to_string()), false);
        assert!(validator.authorize(Some("hunt-master")));
        assert!(!validator.authorize(Some("wrong")));
        assert!(!validator.authorize(None));
    }

    #[test]
    fn test_missing_key_only_passes_in_dev_mode() {
        let dev = AdminKeyValidator::new(None, true);
        assert!(dev.authorize(None));
        assert!(dev.authorize(Some("anything")));

        let prod = AdminKeyValidator::new(None, false);
        assert!(!prod.authorize(None));
        assert!(!prod.authorize(Some("anything")));
    }

    #[test]
    fn test_extracts_from_either_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-key", HeaderValue::from_static("k1"));
        assert_eq!(extract_admin_key(&headers), Some("k1"));

        let mut headers = HeaderMap::new();
        headers.insert(
            hyper::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer k2"),
        );
        assert_eq!(extract_admin_key(&headers), Some("k2"));

        let headers = HeaderMap::new();
        assert_eq!(extract_admin_key(&headers), None);
    }

    #[test]
    fn test_x_admin_key_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-key", HeaderValue::from_static("direct"));
        headers.insert(
            hyper::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer other"),
        );
        assert_eq!(extract_admin_key(&headers), Some("direct"));
    }
}
