use crate::errors::{OrderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const API_KEY_ENV: &str = "BINANCE_API_KEY";
pub const SECRET_KEY_ENV: &str = "BINANCE_SECRET_KEY";
pub const BASE_URL_ENV: &str = "BINANCE_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://testnet.binance.vision";

const API_KEY_PLACEHOLDER: &str = "your_testnet_api_key";
const SECRET_KEY_PLACEHOLDER: &str = "your_testnet_secret_key";

/// Largest decimal precision accepted for quantity and price rounding
const MAX_PRECISION: u32 = 18;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_quantity_precision")]
    pub quantity_precision: u32,
    #[serde(default = "default_price_precision")]
    pub price_precision: u32,
    #[serde(default = "default_time_in_force")]
    pub time_in_force: String,
    #[serde(default = "default_order_resp_type")]
    pub order_resp_type: String,
    #[serde(default)]
    pub recv_window_ms: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_console_level")]
    pub level: String,
    #[serde(default = "default_file_level")]
    pub file_level: String,
    #[serde(default = "default_file_output")]
    pub file_output: String,
    #[serde(default = "default_order_journal")]
    pub order_journal: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_quantity_precision() -> u32 {
    8
}

fn default_price_precision() -> u32 {
    2
}

fn default_time_in_force() -> String {
    "GTC".to_string()
}

fn default_order_resp_type() -> String {
    "RESULT".to_string()
}

fn default_console_level() -> String {
    "warn".to_string()
}

fn default_file_level() -> String {
    "debug".to_string()
}

fn default_file_output() -> String {
    "orders.log".to_string()
}

fn default_order_journal() -> String {
    "orders.jsonl".to_string()
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            secret_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
            quantity_precision: default_quantity_precision(),
            price_precision: default_price_precision(),
            time_in_force: default_time_in_force(),
            order_resp_type: default_order_resp_type(),
            recv_window_ms: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_console_level(),
            file_level: default_file_level(),
            file_output: default_file_output(),
            order_journal: default_order_journal(),
        }
    }
}

// Keys stay out of debug output.
impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &"<redacted>")
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("quantity_precision", &self.quantity_precision)
            .field("price_precision", &self.price_precision)
            .field("time_in_force", &self.time_in_force)
            .field("order_resp_type", &self.order_resp_type)
            .field("recv_window_ms", &self.recv_window_ms)
            .finish()
    }
}

/// API key and secret, checked for presence and placeholder values.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(api_key: &str, secret_key: &str) -> Result<Self> {
        let api_key = api_key.trim();
        let secret_key = secret_key.trim();

        let mut missing = Vec::new();
        if api_key.is_empty() || api_key == API_KEY_PLACEHOLDER {
            missing.push(API_KEY_ENV);
        }
        if secret_key.is_empty() || secret_key == SECRET_KEY_PLACEHOLDER {
            missing.push(SECRET_KEY_ENV);
        }
        if !missing.is_empty() {
            return Err(OrderError::ConfigError(format!(
                "Missing or placeholder credentials ({}). Set them in the environment or a .env file",
                missing.join(", ")
            )));
        }

        Ok(Self {
            api_key: api_key.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

fn redact(value: &str) -> String {
    match value.get(..4) {
        Some(prefix) if value.len() > 8 => format!("{}...", prefix),
        _ => "<redacted>".to_string(),
    }
}

impl ExchangeConfig {
    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::new(&self.api_key, &self.secret_key)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Base URL without a trailing slash, so paths can be appended directly.
    pub fn endpoint(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    fn validate(&self) -> Result<()> {
        self.credentials()?;

        let url = Url::parse(&self.base_url).map_err(|e| {
            OrderError::ConfigError(format!("Invalid base URL {}: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OrderError::ConfigError(format!(
                "Base URL must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.request_timeout_ms == 0 {
            return Err(OrderError::ConfigError(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.quantity_precision > MAX_PRECISION || self.price_precision > MAX_PRECISION {
            return Err(OrderError::ConfigError(format!(
                "quantity_precision and price_precision must be at most {}",
                MAX_PRECISION
            )));
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply environment
    /// overrides and validate. A missing file means defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Config::default()
        };

        config.expand_env_vars()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML file without validating it
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            OrderError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.exchange.validate()
    }

    /// Expand `${VAR}` references in credential and endpoint fields
    pub fn expand_env_vars(&mut self) -> Result<()> {
        for value in [
            &mut self.exchange.api_key,
            &mut self.exchange.secret_key,
            &mut self.exchange.base_url,
        ] {
            if let Some(var_name) = value
                .strip_prefix("${")
                .and_then(|rest| rest.strip_suffix('}'))
            {
                *value = std::env::var(var_name).map_err(|_| {
                    OrderError::ConfigError(format!("Environment variable {} not set", var_name))
                })?;
            }
        }

        Ok(())
    }

    /// Environment variables win over file values when set and non-empty
    pub fn apply_env_overrides(&mut self) {
        let overrides = [
            (API_KEY_ENV, &mut self.exchange.api_key),
            (SECRET_KEY_ENV, &mut self.exchange.secret_key),
            (BASE_URL_ENV, &mut self.exchange.base_url),
        ];

        for (var_name, slot) in overrides {
            if let Ok(value) = std::env::var(var_name) {
                if !value.trim().is_empty() {
                    *slot = value;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(SECRET_KEY_ENV);
        std::env::remove_var(BASE_URL_ENV);
    }

    #[test]
    fn test_credentials_reject_placeholders() {
        let err = Credentials::new("your_testnet_api_key", "real-secret").unwrap_err();
        match err {
            OrderError::ConfigError(msg) => {
                assert!(msg.contains(API_KEY_ENV));
                assert!(!msg.contains(SECRET_KEY_ENV));
            }
            other => panic!("Expected ConfigError, got {:?}", other),
        }

        assert!(Credentials::new("real-key", "your_testnet_secret_key").is_err());
        assert!(Credentials::new("", "").is_err());
        assert!(Credentials::new("real-key", "real-secret").is_ok());
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let creds = Credentials::new("abcdefghijkl", "super-secret-value").unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("super-secret-value"));
        assert!(!debug.contains("abcdefghijkl"));
        assert!(debug.contains("abcd..."));
    }

    #[test]
    #[serial(env)]
    fn test_load_without_credentials_fails() {
        clear_env();
        let result = Config::load("/nonexistent/config.toml");
        assert!(matches!(result, Err(OrderError::ConfigError(_))));
    }

    #[test]
    #[serial(env)]
    fn test_load_from_env_uses_defaults() {
        clear_env();
        std::env::set_var(API_KEY_ENV, "env-api-key");
        std::env::set_var(SECRET_KEY_ENV, "env-secret-key");

        let config = Config::load("/nonexistent/config.toml").unwrap();
        assert_eq!(config.exchange.api_key, "env-api-key");
        assert_eq!(config.exchange.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.exchange.quantity_precision, 8);
        assert_eq!(config.exchange.price_precision, 2);
        assert_eq!(config.exchange.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.logging.file_output, "orders.log");

        clear_env();
    }

    #[test]
    #[serial(env)]
    fn test_load_file_with_env_expansion() {
        clear_env();
        std::env::set_var("ORDER_PLACER_TEST_SECRET", "expanded-secret");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[exchange]
base_url = "http://127.0.0.1:9999/"
api_key = "file-api-key"
secret_key = "${{ORDER_PLACER_TEST_SECRET}}"
price_precision = 4
recv_window_ms = 5000

[logging]
level = "info"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.exchange.secret_key, "expanded-secret");
        assert_eq!(config.exchange.api_key, "file-api-key");
        assert_eq!(config.exchange.endpoint(), "http://127.0.0.1:9999");
        assert_eq!(config.exchange.price_precision, 4);
        assert_eq!(config.exchange.recv_window_ms, Some(5000));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file_level, "debug");

        std::env::remove_var("ORDER_PLACER_TEST_SECRET");
    }

    #[test]
    #[serial(env)]
    fn test_env_overrides_file_values() {
        clear_env();
        std::env::set_var(API_KEY_ENV, "env-api-key");
        std::env::set_var(BASE_URL_ENV, "http://localhost:1234");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[exchange]\napi_key = \"file-api-key\"\nsecret_key = \"file-secret\"\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.exchange.api_key, "env-api-key");
        assert_eq!(config.exchange.secret_key, "file-secret");
        assert_eq!(config.exchange.base_url, "http://localhost:1234");

        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let base = ExchangeConfig {
            api_key: "key".to_string(),
            secret_key: "secret".to_string(),
            ..ExchangeConfig::default()
        };
        assert!(base.validate().is_ok());

        let bad_scheme = ExchangeConfig {
            base_url: "ftp://testnet.binance.vision".to_string(),
            ..base.clone()
        };
        assert!(bad_scheme.validate().is_err());

        let zero_timeout = ExchangeConfig {
            request_timeout_ms: 0,
            ..base.clone()
        };
        assert!(zero_timeout.validate().is_err());

        let huge_precision = ExchangeConfig {
            quantity_precision: 30,
            ..base
        };
        assert!(huge_precision.validate().is_err());
    }
}
