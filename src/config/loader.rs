use std::env;

use tokio::fs;
use tracing::{info, warn};

use crate::types::WizardError;

use super::{paths, Config};

const API_URL_ENV: &str = "WIZARD_API_URL";

impl Config {
    /// Load configuration from config.json in the app directory
    /// Falls back to defaults if the file doesn't exist or can't be parsed
    pub async fn load() -> Self {
        let mut config = match Self::try_load().await {
            Ok(config) => config,
            Err(err) => {
                warn!(error = ?err, "Failed to load config.json, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        info!(
            api = %config.api_base_url,
            status_every_ms = config.status_poll_interval_ms,
            logs_every_ms = config.logs_poll_interval_ms,
            "Loaded configuration"
        );
        config
    }

    async fn try_load() -> Result<Self, WizardError> {
        let config_path = paths::get_config_path()?;

        if !config_path.exists() {
            warn!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .await
            .map_err(|err| WizardError::Config(format!("Failed to read config file: {err}")))?;

        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, WizardError> {
        serde_json::from_str(contents)
            .map_err(|err| WizardError::Config(format!("Failed to parse config.json: {err}")))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(custom) = env::var(API_URL_ENV) {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                self.api_base_url = trimmed.to_string();
            }
        }
    }
}
