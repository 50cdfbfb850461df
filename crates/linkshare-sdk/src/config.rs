use std::path::Path;

use linkshare_replica::{ProjectionLimits, DEFAULT_RETENTION_CAP};
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};
use crate::share::ShareBase;

/// Namespace the posts live under in the replicated store.
pub const DEFAULT_NAMESPACE: &str = "linkshare-posts-v2";

/// Settings for a [`Session`](crate::Session).
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// namespace = "linkshare-posts-v2"
/// retention_cap = 50
///
/// [projection]
/// recent = 10
/// trending = 10
///
/// [share]
/// origin = "https://linkshare.example"
/// path = "/"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub namespace: String,
    /// Records kept by a live session.
    pub retention_cap: usize,
    pub projection: ProjectionLimits,
    pub share: ShareBase,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.into(),
            retention_cap: DEFAULT_RETENTION_CAP,
            projection: ProjectionLimits::default(),
            share: ShareBase::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SdkResult<()> {
        if self.namespace.trim().is_empty() {
            return Err(SdkError::Config("namespace must not be empty".into()));
        }
        if self.retention_cap == 0 {
            return Err(SdkError::Config("retention_cap must be at least 1".into()));
        }
        Ok(())
    }
}
