use serde::Deserialize;
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_MODEL: &str = "mistral-ocr-latest";
pub const DEFAULT_URL_EXPIRY_HOURS: u32 = 24;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    pub max_upload_bytes: usize,
}

/// Per-deployment OCR provider settings.
///
/// `api_key`, `base_url` and `model` each hold either a literal value, a
/// `${NAME}` placeholder resolved through the secret store, or nothing.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: Option<u64>,
    pub url_expiry_hours: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            model: String::new(),
            timeout_secs: None,
            url_expiry_hours: DEFAULT_URL_EXPIRY_HOURS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("PAGEWISE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("PAGEWISE_PORT", 3000),
                api_keys: env::var("PAGEWISE_API_KEYS")
                    .map(|keys| {
                        keys.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                max_upload_bytes: parse_env_or("PAGEWISE_MAX_UPLOAD_BYTES", 104857600),
            },
            ocr: OcrConfig {
                api_key: env::var("PAGEWISE_OCR_API_KEY").unwrap_or_default(),
                base_url: env::var("PAGEWISE_OCR_BASE_URL").unwrap_or_default(),
                model: env::var("PAGEWISE_OCR_MODEL").unwrap_or_default(),
                timeout_secs: parse_env_opt("PAGEWISE_OCR_TIMEOUT"),
                url_expiry_hours: parse_env_or(
                    "PAGEWISE_OCR_URL_EXPIRY_HOURS",
                    DEFAULT_URL_EXPIRY_HOURS,
                ),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_ocr_env() {
        for var in [
            "PAGEWISE_OCR_API_KEY",
            "PAGEWISE_OCR_BASE_URL",
            "PAGEWISE_OCR_MODEL",
            "PAGEWISE_OCR_TIMEOUT",
            "PAGEWISE_OCR_URL_EXPIRY_HOURS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_ocr_config_defaults() {
        clear_ocr_env();

        let config = Config::default();
        assert!(config.ocr.api_key.is_empty());
        assert!(config.ocr.base_url.is_empty());
        assert!(config.ocr.model.is_empty());
        assert!(config.ocr.timeout_secs.is_none());
        assert_eq!(config.ocr.url_expiry_hours, 24);
    }

    #[test]
    #[serial]
    fn test_ocr_config_from_env() {
        clear_ocr_env();
        std::env::set_var("PAGEWISE_OCR_API_KEY", "${MY_OCR_KEY}");
        std::env::set_var("PAGEWISE_OCR_BASE_URL", "https://ocr.internal/v1");
        std::env::set_var("PAGEWISE_OCR_TIMEOUT", "90");
        std::env::set_var("PAGEWISE_OCR_URL_EXPIRY_HOURS", "2");

        let config = Config::default();
        assert_eq!(config.ocr.api_key, "${MY_OCR_KEY}");
        assert_eq!(config.ocr.base_url, "https://ocr.internal/v1");
        assert_eq!(config.ocr.timeout_secs, Some(90));
        assert_eq!(config.ocr.url_expiry_hours, 2);

        clear_ocr_env();
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_is_ignored() {
        clear_ocr_env();
        std::env::set_var("PAGEWISE_OCR_TIMEOUT", "soon");

        let config = Config::default();
        assert!(config.ocr.timeout_secs.is_none());

        clear_ocr_env();
    }

    #[test]
    #[serial]
    fn test_api_keys_split_and_trimmed() {
        std::env::set_var("PAGEWISE_API_KEYS", "alpha, beta,,gamma ");
        let config = Config::default();
        assert_eq!(config.server.api_keys, vec!["alpha", "beta", "gamma"]);
        std::env::remove_var("PAGEWISE_API_KEYS");
    }

    #[test]
    #[serial]
    fn test_parse_env_or_valid_value() {
        std::env::set_var("__TEST_PARSE_PORT", "8080");
        let result: u16 = parse_env_or("__TEST_PARSE_PORT", 3000);
        assert_eq!(result, 8080);
        std::env::remove_var("__TEST_PARSE_PORT");
    }
}
