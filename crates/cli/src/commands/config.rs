use std::env;
use std::fs;
use std::path::Path;

use bookeo_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: [(&str, String, &[&str]); 12] = [
        (
            "bookeo.api_key",
            redact_secret(config.bookeo.api_key.expose_secret()),
            &["BOOKEO_API_KEY", "API_KEY"],
        ),
        (
            "bookeo.api_secret",
            redact_secret(config.bookeo.api_secret.expose_secret()),
            &["BOOKEO_API_SECRET", "API_SECRET"],
        ),
        ("bookeo.base_url", config.bookeo.base_url.clone(), &["BOOKEO_BASE_URL"]),
        ("bookeo.timezone", config.bookeo.timezone.clone(), &["BOOKEO_TIMEZONE"]),
        (
            "bookeo.items_per_page",
            config.bookeo.items_per_page.to_string(),
            &["BOOKEO_ITEMS_PER_PAGE"],
        ),
        ("bookeo.timeout_secs", config.bookeo.timeout_secs.to_string(), &["BOOKEO_TIMEOUT_SECS"]),
        (
            "payments.card_processor_tokens",
            config.payments.card_processor_tokens.join(","),
            &["BOOKEO_CARD_PROCESSOR_TOKENS"],
        ),
        ("transport.mode", format!("{:?}", config.transport.mode), &["BOOKEO_TRANSPORT"]),
        (
            "transport.bind_address",
            config.transport.bind_address.clone(),
            &["BOOKEO_BIND_ADDRESS"],
        ),
        ("transport.port", config.transport.port.to_string(), &["BOOKEO_PORT"]),
        ("logging.level", config.logging.level.clone(), &["BOOKEO_LOG_LEVEL"]),
        ("logging.format", format!("{:?}", config.logging.format), &["BOOKEO_LOG_FORMAT"]),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in fields {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    CommandResult::text(0, lines.join("\n"))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
    {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the last four characters of long secrets so operators can tell keys apart.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() < 12 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_secret};

    #[test]
    fn short_secrets_are_fully_redacted() {
        assert_eq!(redact_secret(""), "<empty>");
        assert_eq!(redact_secret("abc123"), "<redacted>");
        assert_eq!(redact_secret("AKx9-2222-3333-WXYZ"), "***WXYZ");
    }

    #[test]
    fn dotted_paths_walk_nested_tables() {
        let doc: toml::Value =
            "[bookeo]\ntimezone = \"UTC\"\n".parse().expect("toml document should parse");
        assert!(contains_path(&doc, "bookeo.timezone"));
        assert!(!contains_path(&doc, "bookeo.base_url"));
        assert!(!contains_path(&doc, "logging.level"));
    }
}
