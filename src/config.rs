//! Configuration management

use std::{env, path::Path, path::PathBuf, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use ops_console_core::{RouteConfig, RouteTable, default_routes};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Prefix for environment overrides (`__` separates nested keys)
pub const ENV_PREFIX: &str = "OPS_CONSOLE_";

/// Shortcut selecting the backend the dev proxy forwards to
pub const API_TARGET_ENV: &str = "OPS_CONSOLE_API_TARGET";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dev proxy listener configuration
    pub server: ServerConfig,
    /// Dev proxy forwarding configuration
    pub proxy: ProxyConfig,
    /// Backend API client configuration
    pub api: ApiConfig,
    /// Session token storage
    pub session: SessionConfig,
    /// Client-side route tree guarded by the navigation gate
    pub routes: Vec<RouteConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            proxy: ProxyConfig::default(),
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            routes: default_routes(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist, cannot be parsed,
    /// or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (OPS_CONSOLE_ prefix)
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(&figment, env::var(API_TARGET_ENV).ok())
    }

    /// Extract and validate configuration from a prepared figment
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: &Figment, api_target: Option<String>) -> Result<Self> {
        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        if let Some(target) = api_target.filter(|t| !t.trim().is_empty()) {
            tracing::debug!(target = %target, "Proxy target overridden from {API_TARGET_ENV}");
            config.proxy.target = target;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an overridden URL is malformed or not http(s).
    pub fn apply_overrides(
        &mut self,
        api_url: Option<String>,
        session_file: Option<PathBuf>,
    ) -> Result<()> {
        if let Some(url) = api_url {
            self.api.base_url = url;
        }
        if let Some(path) = session_file {
            self.session.path = Some(path);
        }
        self.validate()
    }

    /// Check URLs and the route tree
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for malformed URLs or proxy prefix, and
    /// [`Error::Route`] when the route tree does not compile.
    pub fn validate(&self) -> Result<()> {
        parse_http_url("api.base_url", &self.api.base_url)?;
        parse_http_url("proxy.target", &self.proxy.target)?;
        if !self.proxy.prefix.starts_with('/') {
            return Err(Error::Config(format!(
                "proxy.prefix must start with '/': {}",
                self.proxy.prefix
            )));
        }
        self.route_table()?;
        Ok(())
    }

    /// Compile the configured route tree
    ///
    /// # Errors
    ///
    /// Returns [`Error::Route`] on duplicate paths or redirect loops.
    pub fn route_table(&self) -> Result<RouteTable> {
        Ok(RouteTable::compile(&self.routes)?)
    }
}

fn parse_http_url(field: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| Error::Config(format!("{field}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "{field}: unsupported scheme '{other}'"
        ))),
    }
}

/// Dev proxy listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum number of requests handled concurrently
    pub max_concurrent_requests: usize,
    /// Maximum request body size forwarded upstream (bytes)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5173,
            max_concurrent_requests: 512,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Dev proxy forwarding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Path prefix forwarded to the backend
    pub prefix: String,
    /// Backend origin (local process or container)
    pub target: String,
    /// Rewrite the `Host` header to the target's authority
    pub change_origin: bool,
    /// Upstream request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
            target: "http://localhost:8000".to_string(),
            change_origin: true,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Backend API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the versioned API
    pub base_url: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Session token storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file; defaults to `<config dir>/ops-console/session.json`
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    /// Resolve the session file location
    #[must_use]
    pub fn resolve_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        dirs::config_dir().map_or_else(
            || PathBuf::from(".ops-console-session.json"),
            |dir| dir.join("ops-console").join("session.json"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5173);
        assert_eq!(config.proxy.prefix, "/api");
        assert_eq!(config.proxy.target, "http://localhost:8000");
        assert!(config.proxy.change_origin);
        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.routes, default_routes());
        config.validate().unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/ops-console.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("not found")));
    }

    #[test]
    fn test_yaml_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
server:
  port: 8080
proxy:
  target: "http://backend:8000"
  timeout: 5s
routes:
  - path: /login
    requiresAuth: false
  - path: /
    requires_auth: true
    children:
      - path: dashboard
"#
        )
        .unwrap();
        drop(f);

        let figment = Figment::new().merge(Yaml::file(&path));
        let config = Config::from_figment(&figment, None).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.proxy.target, "http://backend:8000");
        assert_eq!(config.proxy.timeout, Duration::from_secs(5));

        let table = config.route_table().unwrap();
        assert!(!table.lookup("/login").unwrap().requires_auth);
        assert!(table.lookup("/dashboard").unwrap().requires_auth);
    }

    #[test]
    fn test_api_target_override() {
        let config = Config::from_figment(&Figment::new(), Some("http://ops-backend:8000".into()))
            .unwrap();
        assert_eq!(config.proxy.target, "http://ops-backend:8000");

        let config = Config::from_figment(&Figment::new(), Some("  ".into())).unwrap();
        assert_eq!(config.proxy.target, "http://localhost:8000");
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = Config::default();
        config.proxy.target = "not a url".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.api.base_url = "ftp://localhost/api".into();
        assert!(matches!(config.validate(), Err(Error::Config(msg)) if msg.contains("scheme")));

        let mut config = Config::default();
        config.proxy.prefix = "api".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut config = Config::default();
        config
            .apply_overrides(
                Some("https://ops.example.com/api/v1".into()),
                Some(PathBuf::from("/tmp/ops-session.json")),
            )
            .unwrap();
        assert_eq!(config.api.base_url, "https://ops.example.com/api/v1");
        assert_eq!(config.session.resolve_path(), PathBuf::from("/tmp/ops-session.json"));

        let mut config = Config::default();
        let err = config
            .apply_overrides(Some("ftp://ops.example.com/api".into()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("api.base_url")));
    }

    #[test]
    fn test_validate_rejects_bad_routes() {
        let mut config = Config::default();
        config.routes.push(RouteConfig::new("/login"));
        assert!(matches!(config.validate(), Err(Error::Route(_))));
    }

    #[test]
    fn test_session_path() {
        let config = SessionConfig {
            path: Some(PathBuf::from("/tmp/session.json")),
        };
        assert_eq!(config.resolve_path(), PathBuf::from("/tmp/session.json"));
        assert!(
            SessionConfig::default()
                .resolve_path()
                .ends_with("session.json")
        );
    }
}
