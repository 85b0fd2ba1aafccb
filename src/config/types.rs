use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the wizard client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_status_poll_interval_ms")]
    pub status_poll_interval_ms: u64,

    #[serde(default = "default_logs_poll_interval_ms")]
    pub logs_poll_interval_ms: u64,

    #[serde(default = "default_auth_timer_tick_ms")]
    pub auth_timer_tick_ms: u64,

    #[serde(default = "default_credentials_step_delay_ms")]
    pub credentials_step_delay_ms: u64,

    #[serde(default = "default_stop_settle_delay_ms")]
    pub stop_settle_delay_ms: u64,

    #[serde(default = "default_log_window")]
    pub log_window: usize,

    /// `current_step` values that mean the job is waiting for browser authentication.
    #[serde(default = "default_auth_step_labels")]
    pub auth_step_labels: Vec<String>,

    #[serde(default = "default_download_dir")]
    pub download_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            status_poll_interval_ms: default_status_poll_interval_ms(),
            logs_poll_interval_ms: default_logs_poll_interval_ms(),
            auth_timer_tick_ms: default_auth_timer_tick_ms(),
            credentials_step_delay_ms: default_credentials_step_delay_ms(),
            stop_settle_delay_ms: default_stop_settle_delay_ms(),
            log_window: default_log_window(),
            auth_step_labels: default_auth_step_labels(),
            download_dir: default_download_dir(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms.max(1))
    }

    pub fn logs_poll_interval(&self) -> Duration {
        Duration::from_millis(self.logs_poll_interval_ms.max(1))
    }

    pub fn auth_timer_tick(&self) -> Duration {
        Duration::from_millis(self.auth_timer_tick_ms.max(1))
    }

    pub fn credentials_step_delay(&self) -> Duration {
        Duration::from_millis(self.credentials_step_delay_ms)
    }

    pub fn stop_settle_delay(&self) -> Duration {
        Duration::from_millis(self.stop_settle_delay_ms)
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_status_poll_interval_ms() -> u64 {
    2_000
}

fn default_logs_poll_interval_ms() -> u64 {
    3_000
}

fn default_auth_timer_tick_ms() -> u64 {
    1_000
}

fn default_credentials_step_delay_ms() -> u64 {
    500
}

fn default_stop_settle_delay_ms() -> u64 {
    1_000
}

fn default_log_window() -> usize {
    30
}

fn default_auth_step_labels() -> Vec<String> {
    vec!["Authentication".to_string(), "Авторизация".to_string()]
}

fn default_download_dir() -> String {
    ".".to_string()
}
