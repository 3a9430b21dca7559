use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payments::DEFAULT_CARD_PROCESSOR_TOKENS;

pub const DEFAULT_BASE_URL: &str = "https://api.bookeo.com/v2";
pub const CONFIG_FILE_CANDIDATES: &[&str] = &["bookeo.toml", "config/bookeo.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bookeo: BookeoConfig,
    pub payments: PaymentsConfig,
    pub transport: TransportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BookeoConfig {
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub base_url: String,
    pub timezone: String,
    pub items_per_page: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PaymentsConfig {
    pub card_processor_tokens: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub mode: TransportMode,
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Stdio,
    Http,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub base_url: Option<String>,
    pub transport_mode: Option<TransportMode>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bookeo: BookeoConfig {
                api_key: String::new().into(),
                api_secret: String::new().into(),
                base_url: DEFAULT_BASE_URL.to_string(),
                timezone: "America/Los_Angeles".to_string(),
                items_per_page: 100,
                timeout_secs: 30,
            },
            payments: PaymentsConfig {
                card_processor_tokens: DEFAULT_CARD_PROCESSOR_TOKENS
                    .iter()
                    .map(|token| token.to_string())
                    .collect(),
            },
            transport: TransportConfig {
                mode: TransportMode::Stdio,
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::Validation(format!(
                "unsupported transport `{other}` (expected stdio|http)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl BookeoConfig {
    /// Parsed business timezone. Only fails on configs that skipped validation.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.trim().parse::<Tz>().map_err(|_| {
            ConfigError::Validation(format!(
                "bookeo.timezone `{}` is not a known IANA timezone",
                self.timezone
            ))
        })
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("bookeo.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(bookeo) = patch.bookeo {
            if let Some(api_key_value) = bookeo.api_key {
                self.bookeo.api_key = secret_value(api_key_value);
            }
            if let Some(api_secret_value) = bookeo.api_secret {
                self.bookeo.api_secret = secret_value(api_secret_value);
            }
            if let Some(base_url) = bookeo.base_url {
                self.bookeo.base_url = base_url;
            }
            if let Some(timezone) = bookeo.timezone {
                self.bookeo.timezone = timezone;
            }
            if let Some(items_per_page) = bookeo.items_per_page {
                self.bookeo.items_per_page = items_per_page;
            }
            if let Some(timeout_secs) = bookeo.timeout_secs {
                self.bookeo.timeout_secs = timeout_secs;
            }
        }

        if let Some(payments) = patch.payments {
            if let Some(tokens) = payments.card_processor_tokens {
                self.payments.card_processor_tokens = tokens;
            }
        }

        if let Some(transport) = patch.transport {
            if let Some(mode) = transport.mode {
                self.transport.mode = mode;
            }
            if let Some(bind_address) = transport.bind_address {
                self.transport.bind_address = bind_address;
            }
            if let Some(port) = transport.port {
                self.transport.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BOOKEO_API_KEY").or_else(|| read_env("API_KEY")) {
            self.bookeo.api_key = secret_value(value);
        }
        if let Some(value) = read_env("BOOKEO_API_SECRET").or_else(|| read_env("API_SECRET")) {
            self.bookeo.api_secret = secret_value(value);
        }
        if let Some(value) = read_env("BOOKEO_BASE_URL") {
            self.bookeo.base_url = value;
        }
        if let Some(value) = read_env("BOOKEO_TIMEZONE") {
            self.bookeo.timezone = value;
        }
        if let Some(value) = read_env("BOOKEO_ITEMS_PER_PAGE") {
            self.bookeo.items_per_page = parse_u32("BOOKEO_ITEMS_PER_PAGE", &value)?;
        }
        if let Some(value) = read_env("BOOKEO_TIMEOUT_SECS") {
            self.bookeo.timeout_secs = parse_u64("BOOKEO_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BOOKEO_CARD_PROCESSOR_TOKENS") {
            self.payments.card_processor_tokens =
                value.split(',').map(|token| token.trim().to_string()).collect();
        }

        if let Some(value) = read_env("BOOKEO_TRANSPORT") {
            self.transport.mode = value.parse()?;
        }
        if let Some(value) = read_env("BOOKEO_BIND_ADDRESS") {
            self.transport.bind_address = value;
        }
        if let Some(value) = read_env("BOOKEO_PORT") {
            self.transport.port = parse_u16("BOOKEO_PORT", &value)?;
        }

        if let Some(value) = read_env("BOOKEO_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("BOOKEO_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_key) = overrides.api_key {
            self.bookeo.api_key = secret_value(api_key);
        }
        if let Some(api_secret) = overrides.api_secret {
            self.bookeo.api_secret = secret_value(api_secret);
        }
        if let Some(base_url) = overrides.base_url {
            self.bookeo.base_url = base_url;
        }
        if let Some(mode) = overrides.transport_mode {
            self.transport.mode = mode;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.transport.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.transport.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bookeo(&self.bookeo)?;
        validate_payments(&self.payments)?;
        validate_transport(&self.transport)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_bookeo(bookeo: &BookeoConfig) -> Result<(), ConfigError> {
    if bookeo.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "bookeo.api_key is required. Set BOOKEO_API_KEY (or API_KEY) or add it to bookeo.toml"
                .to_string(),
        ));
    }
    if bookeo.api_secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "bookeo.api_secret is required. Set BOOKEO_API_SECRET (or API_SECRET) or add it to bookeo.toml"
                .to_string(),
        ));
    }

    let base_url = bookeo.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "bookeo.base_url must start with http:// or https://".to_string(),
        ));
    }

    bookeo.tz()?;

    if bookeo.items_per_page == 0 || bookeo.items_per_page > 100 {
        return Err(ConfigError::Validation(
            "bookeo.items_per_page must be in range 1..=100".to_string(),
        ));
    }

    if bookeo.timeout_secs == 0 || bookeo.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "bookeo.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_payments(payments: &PaymentsConfig) -> Result<(), ConfigError> {
    if payments.card_processor_tokens.is_empty() {
        return Err(ConfigError::Validation(
            "payments.card_processor_tokens must contain at least one token".to_string(),
        ));
    }
    if payments.card_processor_tokens.iter().any(|token| token.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "payments.card_processor_tokens must not contain blank tokens".to_string(),
        ));
    }
    Ok(())
}

fn validate_transport(transport: &TransportConfig) -> Result<(), ConfigError> {
    if transport.mode == TransportMode::Http {
        if transport.bind_address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "transport.bind_address is required for http transport".to_string(),
            ));
        }
        if transport.port == 0 {
            return Err(ConfigError::Validation(
                "transport.port must be greater than zero".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    bookeo: Option<BookeoPatch>,
    payments: Option<PaymentsPatch>,
    transport: Option<TransportPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BookeoPatch {
    api_key: Option<String>,
    api_secret: Option<String>,
    base_url: Option<String>,
    timezone: Option<String>,
    items_per_page: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentsPatch {
    card_processor_tokens: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct TransportPatch {
    mode: Option<TransportMode>,
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
