use anyhow::{bail, Context, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::llm_client::{
    GenerationDefaults, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT,
};

/// Application configuration loaded from environment variables.
/// Startup aborts if required variables are missing or malformed.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
    pub request_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            default_temperature: parse_env("DEFAULT_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            default_max_tokens: parse_env("DEFAULT_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT.as_secs())?,
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_temperature) {
            bail!("DEFAULT_TEMPERATURE must be between 0.0 and 1.0");
        }
        if self.default_max_tokens == 0 {
            bail!("DEFAULT_MAX_TOKENS must be positive");
        }
        if self.request_timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be positive");
        }
        Ok(())
    }

    pub fn generation_defaults(&self) -> GenerationDefaults {
        GenerationDefaults {
            temperature: self.default_temperature,
            max_tokens: self.default_max_tokens,
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

// Keeps the API key out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            gemini_api_key: "secret-key".to_string(),
            gemini_model: DEFAULT_MODEL.to_string(),
            default_temperature: 0.7,
            default_max_tokens: 2048,
            request_timeout_secs: 10,
            port: 8000,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u32 = parse_env("QUOTE_API_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("QUOTE_API_TEST_BAD_TIMEOUT", "ten");
        let result: Result<u64> = parse_env("QUOTE_API_TEST_BAD_TIMEOUT", 10);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_env_reads_value() {
        std::env::set_var("QUOTE_API_TEST_TEMPERATURE", " 0.3 ");
        let value: f32 = parse_env("QUOTE_API_TEST_TEMPERATURE", 0.7).unwrap();
        assert_eq!(value, 0.3);
    }

    #[test]
    fn test_require_env_rejects_blank() {
        std::env::set_var("QUOTE_API_TEST_BLANK_KEY", "   ");
        assert!(require_env("QUOTE_API_TEST_BLANK_KEY").is_err());
        assert!(require_env("QUOTE_API_TEST_MISSING_KEY").is_err());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(config().validate().is_ok());
        assert!(Config { default_temperature: 1.2, ..config() }.validate().is_err());
        assert!(Config { request_timeout_secs: 0, ..config() }.validate().is_err());
    }

    #[test]
    fn test_generation_defaults_from_config() {
        let defaults = Config { request_timeout_secs: 3, ..config() }.generation_defaults();
        assert_eq!(defaults.timeout, Duration::from_secs(3));
        assert_eq!(defaults.max_tokens, 2048);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
