use std::fmt;

use serde::Deserialize;

/// Wrapper for sensitive strings with redacted Debug/Display.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
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

/// Where secret values come from.
pub trait SecretSource: Send + Sync {
    fn get_secret(&self, key: &str) -> Option<String>;

    /// First non-blank value among `keys`, in order.
    fn first_secret(&self, keys: &[&str]) -> Option<Secret> {
        keys.iter()
            .filter_map(|k| self.get_secret(k))
            .find(|v| !v.trim().is_empty())
            .map(Secret::new)
    }
}

/// Reads secrets from process environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn get_secret(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Test helper with HashMap-based secret storage.
#[cfg(test)]
#[derive(Default)]
pub struct MapSecrets {
    secrets: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MapSecrets {
    #[must_use]
    pub fn with_secret(mut self, key: &str, value: &str) -> Self {
        self.secrets.insert(key.to_owned(), value.to_owned());
        self
    }
}

#[cfg(test)]
impl SecretSource for MapSecrets {
    fn get_secret(&self, key: &str) -> Option<String> {
        self.secrets.get(key).cloned()
    }
}
