use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

/// Name of the only credential the service needs.
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

pub type LookupFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + 'a>>;

/// A credential that never shows up in logs or `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Trim surrounding whitespace; blank values count as unset.
    #[must_use]
    pub fn from_raw(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self::new(trimmed))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Where credentials are looked up at startup.
pub trait SecretSource: Send + Sync {
    fn lookup(&self, key: &str) -> LookupFuture<'_>;
}

/// Process environment, which includes anything `dotenvy` loaded from `.env`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn lookup(&self, key: &str) -> LookupFuture<'_> {
        let value = std::env::var(key).ok();
        Box::pin(async move { Ok(value) })
    }
}

/// Fixed key/value credentials, for embedding the service or tests.
#[derive(Default, Clone)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

impl StaticSecrets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl fmt::Debug for StaticSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSecrets")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecretSource for StaticSecrets {
    fn lookup(&self, key: &str) -> LookupFuture<'_> {
        let value = self.values.get(key).cloned();
        Box::pin(async move { Ok(value) })
    }
}
