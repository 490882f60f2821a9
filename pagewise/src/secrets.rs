//! User-scoped secret lookup.
//!
//! The hosting application owns where secrets live. The pipeline only needs a
//! batched lookup that fails when a required name cannot be resolved.

use std::collections::{HashMap, HashSet};
use std::env;

use async_trait::async_trait;

use crate::error::{PagewiseError, Result};

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Resolve `names` for `user_id` in a single call.
    ///
    /// Names in `optional` may be absent from the returned map. Any other
    /// unresolved name fails the whole lookup.
    async fn resolve(
        &self,
        user_id: &str,
        names: &[String],
        optional: &HashSet<String>,
    ) -> Result<HashMap<String, String>>;
}

fn collect<F>(
    names: &[String],
    optional: &HashSet<String>,
    lookup: F,
) -> Result<HashMap<String, String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut values = HashMap::with_capacity(names.len());
    for name in names {
        match lookup(name).filter(|v| !v.trim().is_empty()) {
            Some(value) => {
                values.insert(name.clone(), value);
            }
            None if optional.contains(name) => {}
            None => {
                return Err(PagewiseError::CredentialResolution(format!(
                    "required secret {name} is not set"
                )));
            }
        }
    }
    Ok(values)
}

/// Deployment-wide secrets read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn resolve(
        &self,
        _user_id: &str,
        names: &[String],
        optional: &HashSet<String>,
    ) -> Result<HashMap<String, String>> {
        collect(names, optional, |name| env::var(name).ok())
    }
}

/// In-memory store with per-user values layered over shared defaults.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    shared: HashMap<String, String>,
    per_user: HashMap<String, HashMap<String, String>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shared(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.shared.insert(name.into(), value.into());
        self
    }

    pub fn with_user_secret(
        mut self,
        user_id: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.per_user
            .entry(user_id.into())
            .or_default()
            .insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn resolve(
        &self,
        user_id: &str,
        names: &[String],
        optional: &HashSet<String>,
    ) -> Result<HashMap<String, String>> {
        let user = self.per_user.get(user_id);
        collect(names, optional, |name| {
            user.and_then(|values| values.get(name))
                .or_else(|| self.shared.get(name))
                .cloned()
        })
    }
}
