//! Connection binding
//!
//! An [`Engine`] names the store to talk to: host, token and organization.
//! It is set once when the store is built and never changes afterwards.

use crate::config::ConnectionConfig;

/// Host, credentials and organization of one store
#[derive(Clone)]
pub struct Engine {
    /// Base URL, e.g. `http://localhost:8086`
    pub host: String,
    /// API token
    pub token: String,
    /// Organization ID
    pub org_id: String,
    /// Per-request timeout
    pub request_timeout_ms: u64,
}

impl Engine {
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        org_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            org_id: org_id.into(),
            request_timeout_ms: 5000,
        }
    }

    /// Set the request timeout (builder pattern)
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(&config.host, &config.token, &config.org_id)
            .timeout_ms(config.request_timeout_ms)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("org_id", &self.org_id)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// Bind a host, token and organization
pub fn create_engine(
    host: impl Into<String>,
    token: impl Into<String>,
    org_id: impl Into<String>,
) -> Engine {
    Engine::new(host, token, org_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_engine() {
        let engine = create_engine("http://localhost:8086", "token", "org");
        assert_eq!(engine.host, "http://localhost:8086");
        assert_eq!(engine.org_id, "org");
        assert_eq!(engine.request_timeout_ms, 5000);
    }

    #[test]
    fn test_from_config() {
        let mut config = ConnectionConfig::default();
        config.org_id = "org-2".into();
        config.request_timeout_ms = 250;

        let engine = Engine::from_config(&config);
        assert_eq!(engine.host, config.host);
        assert_eq!(engine.org_id, "org-2");
        assert_eq!(engine.request_timeout_ms, 250);
    }

    #[test]
    fn test_debug_hides_token() {
        let engine = create_engine("http://h", "hunter2", "o");
        let debug = format!("{:?}", engine);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("http://h"));
    }
}
