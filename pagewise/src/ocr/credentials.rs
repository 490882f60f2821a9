use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::config::{OcrConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::error::{PagewiseError, Result};
use crate::secrets::SecretStore;

pub const FALLBACK_API_KEY_VAR: &str = "OCR_API_KEY";
pub const FALLBACK_BASE_URL_VAR: &str = "OCR_BASEURL";

/// A configuration string classified once at the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Literal(String),
    /// `${NAME}` placeholder; holds `NAME`.
    Reference(String),
    Empty,
}

impl ConfigValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ConfigValue::Empty;
        }

        match trimmed
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Some(name) if !name.is_empty() => ConfigValue::Reference(name.to_string()),
            _ => ConfigValue::Literal(trimmed.to_string()),
        }
    }

    /// Variable name to look up, or `None` for literals.
    fn lookup_name(&self, fallback: &str) -> Option<String> {
        match self {
            ConfigValue::Literal(_) => None,
            ConfigValue::Reference(name) => Some(name.clone()),
            ConfigValue::Empty => Some(fallback.to_string()),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialResolver {
    api_key: ConfigValue,
    base_url: ConfigValue,
    model: ConfigValue,
}

impl CredentialResolver {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            api_key: ConfigValue::parse(&config.api_key),
            base_url: ConfigValue::parse(&config.base_url),
            model: ConfigValue::parse(&config.model),
        }
    }

    /// True when both the key and the base URL are literals, so resolution
    /// never touches the secret store.
    pub fn is_static(&self) -> bool {
        matches!(
            (&self.api_key, &self.base_url),
            (ConfigValue::Literal(_), ConfigValue::Literal(_))
        )
    }

    pub async fn resolve(
        &self,
        store: &dyn SecretStore,
        user_id: &str,
    ) -> Result<ResolvedCredentials> {
        let model_var = match &self.model {
            ConfigValue::Reference(name) => Some(name.clone()),
            _ => None,
        };

        if self.is_static() && model_var.is_none() {
            return Ok(ResolvedCredentials {
                api_key: literal(&self.api_key),
                base_url: trim_base_url(&literal(&self.base_url)),
                model: self.literal_model(),
            });
        }

        let api_key_var = self.api_key.lookup_name(FALLBACK_API_KEY_VAR);
        let base_url_var = self.base_url.lookup_name(FALLBACK_BASE_URL_VAR);

        let mut names = Vec::with_capacity(3);
        let mut optional = HashSet::new();
        if let Some(name) = &base_url_var {
            names.push(name.clone());
            optional.insert(name.clone());
        }
        if let Some(name) = &api_key_var {
            names.push(name.clone());
        }
        if let Some(name) = &model_var {
            names.push(name.clone());
            optional.insert(name.clone());
        }

        debug!(
            user_id = %user_id,
            names = ?names,
            "Resolving OCR credentials from secret store"
        );
        let values = store.resolve(user_id, &names, &optional).await?;

        let api_key = match &api_key_var {
            Some(name) => lookup(&values, name).ok_or_else(|| {
                PagewiseError::CredentialResolution(format!("OCR API key {name} is not set"))
            })?,
            None => literal(&self.api_key),
        };

        let base_url = match &base_url_var {
            Some(name) => lookup(&values, name).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            None => literal(&self.base_url),
        };

        let model = match &model_var {
            Some(name) => lookup(&values, name).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            None => self.literal_model(),
        };

        Ok(ResolvedCredentials {
            api_key,
            base_url: trim_base_url(&base_url),
            model,
        })
    }

    fn literal_model(&self) -> String {
        match &self.model {
            ConfigValue::Literal(model) => model.clone(),
            _ => DEFAULT_MODEL.to_string(),
        }
    }
}

fn literal(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Literal(v) => v.clone(),
        _ => String::new(),
    }
}

fn lookup(values: &HashMap<String, String>, name: &str) -> Option<String> {
    values
        .get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
