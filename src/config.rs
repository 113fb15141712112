/*
 * Responsibility
 * - 環境変数からの設定読み込み (HMAC_KEY / ISSUER / AUDIENCE, router 設定, HTTP 制限, PORT)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;

pub const DEFAULT_AUTH_HEADER: &str = "Authorization";
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("APP_ENV")
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Secrets the token authenticator cannot run without.
///
/// Key material is not printable via Debug.
#[derive(Clone)]
pub struct AuthSettings {
    pub hmac_key: String,
    pub issuer: String,
    pub audience: String,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl AuthSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// An empty value counts as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        Ok(Self {
            hmac_key: required("HMAC_KEY")?,
            issuer: required("ISSUER")?,
            audience: required("AUDIENCE")?,
        })
    }
}

/// Dispatcher construction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSettings {
    /// Prepended to every handler name before it is resolved.
    pub handler_prefix: String,
    /// Handler name (before prefixing) run when no route matches. Empty disables it.
    pub default_handler: String,
    pub auth_header: String,
    /// Path segment stripped before matching, without slashes. Empty disables it.
    pub base_uri: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            handler_prefix: String::new(),
            default_handler: String::new(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            base_uri: String::new(),
        }
    }
}

impl RouterSettings {
    pub fn new(
        handler_prefix: impl Into<String>,
        default_handler: impl Into<String>,
        auth_header: impl Into<String>,
        base_uri: impl Into<String>,
    ) -> Self {
        Self {
            handler_prefix: handler_prefix.into(),
            default_handler: default_handler.into(),
            auth_header: auth_header.into(),
            base_uri: base_uri.into(),
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth_header = lookup("ROUTER_AUTH_HEADER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTH_HEADER.to_string());

        let base_uri = lookup("ROUTER_BASE_URI")
            .unwrap_or_default()
            .trim()
            .trim_matches('/')
            .to_string();

        let settings = Self {
            handler_prefix: lookup("ROUTER_HANDLER_PREFIX").unwrap_or_default(),
            default_handler: lookup("ROUTER_DEFAULT_HANDLER").unwrap_or_default(),
            auth_header,
            base_uri,
        };
        settings.auth_header_name()?;

        Ok(settings)
    }

    /// `auth_header` as a typed header name.
    pub fn auth_header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::from_str(&self.auth_header)
            .map_err(|_| ConfigError::Invalid("ROUTER_AUTH_HEADER"))
    }
}

/// Limits applied by the HTTP middleware stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl HttpSettings {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let body_limit_bytes = match lookup("HTTP_BODY_LIMIT_BYTES") {
            Some(s) => s
                .trim()
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or(ConfigError::Invalid("HTTP_BODY_LIMIT_BYTES"))?,
            None => DEFAULT_BODY_LIMIT_BYTES,
        };

        let timeout_secs = match lookup("HTTP_REQUEST_TIMEOUT_SECS") {
            Some(s) => s
                .trim()
                .parse()
                .ok()
                .filter(|n: &u64| *n > 0)
                .ok_or(ConfigError::Invalid("HTTP_REQUEST_TIMEOUT_SECS"))?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            body_limit_bytes,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub router: RouterSettings,
    pub http: HttpSettings,
    pub auth: AuthSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(s) => s.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_lookup(&lookup);
        let router = RouterSettings::from_lookup(&lookup)?;
        let http = HttpSettings::from_lookup(&lookup)?;
        let auth = AuthSettings::from_lookup(&lookup)?;

        Ok(Self {
            addr,
            app_env,
            router,
            http,
            auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const SECRETS: [(&str, &str); 3] = [
        ("HMAC_KEY", "mBC5v1sOKVvbdEitdSBenu59nfNfhwkedkJVNabosTw"),
        ("ISSUER", "http://www.example.com"),
        ("AUDIENCE", "http://www.example.com"),
    ];

    #[test]
    fn auth_settings_require_all_secrets() {
        assert!(AuthSettings::from_lookup(lookup_from(&SECRETS)).is_ok());

        for skip in ["HMAC_KEY", "ISSUER", "AUDIENCE"] {
            let pairs: Vec<_> = SECRETS.iter().copied().filter(|(k, _)| *k != skip).collect();
            let err = AuthSettings::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert_eq!(err, ConfigError::Missing(skip));
        }
    }

    #[test]
    fn empty_secret_counts_as_missing() {
        let err = AuthSettings::from_lookup(lookup_from(&[
            ("HMAC_KEY", ""),
            ("ISSUER", "iss"),
            ("AUDIENCE", "aud"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("HMAC_KEY"));
    }

    #[test]
    fn auth_settings_debug_hides_key() {
        let settings = AuthSettings::from_lookup(lookup_from(&SECRETS)).unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("mBC5v1sOKVvbdEitdSBenu59nfNfhwkedkJVNabosTw"));
        assert!(printed.contains("http://www.example.com"));
    }

    #[test]
    fn router_settings_defaults() {
        let settings = RouterSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, RouterSettings::default());
        assert_eq!(settings.auth_header, "Authorization");
    }

    #[test]
    fn router_settings_trim_base_uri_slashes() {
        let settings = RouterSettings::from_lookup(lookup_from(&[
            ("ROUTER_BASE_URI", "/api/"),
            ("ROUTER_HANDLER_PREFIX", "route_"),
            ("ROUTER_DEFAULT_HANDLER", "default"),
        ]))
        .unwrap();
        assert_eq!(settings.base_uri, "api");
        assert_eq!(settings.handler_prefix, "route_");
        assert_eq!(settings.default_handler, "default");
    }

    #[test]
    fn router_settings_reject_bad_header_name() {
        let err =
            RouterSettings::from_lookup(lookup_from(&[("ROUTER_AUTH_HEADER", "bad header")]))
                .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("ROUTER_AUTH_HEADER"));
    }

    #[test]
    fn auth_header_name_checks_constructed_settings() {
        let good = RouterSettings::new("", "", "X-Api-Token", "");
        assert_eq!(good.auth_header_name().unwrap().as_str(), "x-api-token");

        let bad = RouterSettings::new("", "", "bad header", "");
        assert_eq!(
            bad.auth_header_name().unwrap_err(),
            ConfigError::Invalid("ROUTER_AUTH_HEADER")
        );
    }

    #[test]
    fn http_settings_defaults_and_overrides() {
        let settings = HttpSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, HttpSettings::default());
        assert_eq!(settings.body_limit_bytes, 1024 * 1024);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));

        let settings = HttpSettings::from_lookup(lookup_from(&[
            ("HTTP_BODY_LIMIT_BYTES", "2048"),
            ("HTTP_REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(settings.body_limit_bytes, 2048);
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn http_settings_reject_zero_or_garbage() {
        assert_eq!(
            HttpSettings::from_lookup(lookup_from(&[("HTTP_BODY_LIMIT_BYTES", "0")])).unwrap_err(),
            ConfigError::Invalid("HTTP_BODY_LIMIT_BYTES")
        );
        assert_eq!(
            HttpSettings::from_lookup(lookup_from(&[("HTTP_REQUEST_TIMEOUT_SECS", "soon")]))
                .unwrap_err(),
            ConfigError::Invalid("HTTP_REQUEST_TIMEOUT_SECS")
        );
    }

    #[test]
    fn config_port_and_env() {
        let mut pairs = SECRETS.to_vec();
        pairs.push(("PORT", "8080"));
        pairs.push(("APP_ENV", "prod"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert!(config.app_env.is_production());

        let mut pairs = SECRETS.to_vec();
        pairs.push(("PORT", "not-a-port"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("PORT"));
    }
}
