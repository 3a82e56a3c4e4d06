//! `[serve]` section configuration.
//!
//! Contains http server settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// URL prefixes served straight from the build output directory.
///
/// No `[[pages]]` route may live under one of these.
pub const STATIC_PREFIXES: [&str; 3] = ["/stylesheets/", "/javascripts/", "/images/"];

/// `[serve]` section in letters.toml - http server settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # Listen on all interfaces
/// port = 4567
/// workers = 4
/// socket = "tmp/letters.sock"  # Unix only; overrides interface/port
///
/// [serve.cache]
/// max_age = 300
/// public = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 4567).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Threads pulling requests off the shared listener.
    #[serde(default = "defaults::serve::workers")]
    #[educe(Default = defaults::serve::workers())]
    pub workers: usize,

    /// Unix socket path for running behind a reverse proxy.
    #[serde(default)]
    pub socket: Option<PathBuf>,

    /// `Cache-Control` policy for page responses.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// `[serve.cache]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Seconds a page may be cached.
    #[serde(default = "defaults::serve::cache::max_age")]
    #[educe(Default = defaults::serve::cache::max_age())]
    pub max_age: u32,

    /// Allow shared caches (proxies, CDNs) to store pages.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub public: bool,
}

impl CacheConfig {
    /// The `Cache-Control` header value, e.g. `max-age=300, public`.
    pub fn header_value(&self) -> String {
        if self.public {
            format!("max-age={}, public", self.max_age)
        } else {
            format!("max-age={}, private", self.max_age)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_serve_config() {
        let config = r#"
            [serve]
            interface = "0.0.0.0"
            port = 8080
            workers = 2
            socket = "tmp/letters.sock"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.serve.interface, "0.0.0.0");
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.workers, 2);
        assert_eq!(config.serve.socket, Some(PathBuf::from("tmp/letters.sock")));
    }

    #[test]
    fn test_serve_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.serve.interface, "127.0.0.1");
        assert_eq!(config.serve.port, 4567);
        assert_eq!(config.serve.workers, 4);
        assert!(config.serve.socket.is_none());
        assert_eq!(config.serve.cache.max_age, 300);
        assert!(config.serve.cache.public);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [serve]
            unknown_field = "should_fail"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
    }

    #[test]
    fn test_cache_header_value() {
        assert_eq!(
            CacheConfig::default().header_value(),
            "max-age=300, public"
        );

        let private = CacheConfig {
            max_age: 60,
            public: false,
        };
        assert_eq!(private.header_value(), "max-age=60, private");
    }

    #[test]
    fn test_cache_config_partial_override() {
        let config = r#"
            [serve.cache]
            max_age = 3600
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.serve.cache.max_age, 3600);
        assert!(config.serve.cache.public);
        assert_eq!(config.serve.cache.header_value(), "max-age=3600, public");
    }
}
