//! Client configuration loaded from `ORCA_*` environment variables.

use serde::Deserialize;

use crate::error::ApiError;

/// Connection settings for an `OrcaClient`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the ORCA API server, e.g. `http://orca.local:8000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Karte UID identifying this client's session to the service.
    #[serde(default)]
    pub karte_uid: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            karte_uid: String::new(),
        }
    }
}

impl ClientConfig {
    /// Load from `ORCA_BASE_URL` and `ORCA_KARTE_UID`, falling back to defaults.
    pub fn from_env() -> Result<Self, ApiError> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("ORCA"))
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let c: ClientConfig = cfg
            .try_deserialize()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        c.validate()?;
        Ok(c)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ApiError::Config("ORCA_BASE_URL must not be empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "ORCA_BASE_URL must be an http(s) URL, got {url:?}"
            )));
        }
        Ok(())
    }
}
