//! User-initiated mutations. Each applies an optimistic local change and
//! leaves ground truth to the next status poll.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::JobApiClient;
use crate::config::Config;
use crate::types::WizardError;

use super::files::FileListing;
use super::log_view::LogLevel;
use super::state::{ClientState, FollowUp};
use super::step::Step;
use super::view::{Confirm, ConfirmPrompt};

const EMPTY_FIELDS_TEXT: &str = "Please fill in all fields";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
    /// The server confirmed the reset.
    Reset,
    /// `/api/reset` does not exist; only the client state was cleared.
    LocalOnly,
}

pub struct ActionController<'a> {
    api: &'a JobApiClient,
    state: &'a mut ClientState,
    config: &'a Config,
}

impl<'a> ActionController<'a> {
    pub fn new(api: &'a JobApiClient, state: &'a mut ClientState, config: &'a Config) -> Self {
        Self { api, state, config }
    }

    /// Ask the server whether credentials are stored. Only ever sets the flag.
    pub async fn sync_credentials(&mut self) -> Result<bool, WizardError> {
        let stored = self.api.has_credentials().await?;
        if stored {
            self.state.mark_credentials_saved();
        }
        let step = if self.state.credentials_saved() {
            Step::Launch
        } else {
            Step::Credentials
        };
        self.state.show_step(step);
        Ok(self.state.credentials_saved())
    }

    pub async fn save_credentials(
        &mut self,
        login: &str,
        password: &str,
    ) -> Result<(), WizardError> {
        let login = login.trim();
        let password = password.trim();
        if login.is_empty() || password.is_empty() {
            return Err(WizardError::Validation(EMPTY_FIELDS_TEXT.to_string()));
        }

        self.api.save_credentials(login, password).await?;
        self.state.mark_credentials_saved();
        self.state.push_log("Credentials saved", LogLevel::Success);
        info!("Credentials saved");

        sleep(self.config.credentials_step_delay()).await;
        self.state.show_step(Step::Launch);
        Ok(())
    }

    pub async fn start_job(&mut self) -> Result<(), WizardError> {
        if !self.state.credentials_saved() {
            if !self.api.has_credentials().await? {
                self.state.show_step(Step::Credentials);
                return Err(WizardError::MissingCredentials);
            }
            self.state.mark_credentials_saved();
        }

        self.state.set_start_enabled(false);
        match self.api.start_job().await {
            Ok(()) => {
                self.state.mark_running();
                self.state.show_step(Step::Launch);
                self.state.push_log("Job started", LogLevel::Info);
                info!("Job started");
                Ok(())
            }
            Err(err) => {
                self.state.set_start_enabled(true);
                Err(err)
            }
        }
    }

    pub async fn select_school(&mut self, school_number: i64) -> Result<String, WizardError> {
        let name = self.api.select_school(school_number).await?;
        self.state.mark_school_selected(school_number);
        self.state
            .push_log(format!("School selected: {name}"), LogLevel::Success);
        info!(school_number, school = %name, "School selected");
        Ok(name)
    }

    pub async fn select_class(&mut self, class_name: &str) -> Result<String, WizardError> {
        let confirmed = self.api.select_class(class_name).await?;
        self.state.mark_class_selected(class_name);
        self.state
            .push_log(format!("Class selected: {confirmed}"), LogLevel::Success);
        info!(class = %confirmed, "Class selected");
        Ok(confirmed)
    }

    /// Stop (if running) and reset the job, falling back to a local-only
    /// reset when the server has no reset endpoint.
    pub async fn restart(&mut self, confirm: &dyn Confirm) -> Result<RestartOutcome, WizardError> {
        let live = self.api.status().await?;
        let prompt = if live.running {
            ConfirmPrompt::StopRunningJob
        } else {
            ConfirmPrompt::RestartIdle
        };
        if !confirm.confirm(prompt).await {
            return Ok(RestartOutcome::Cancelled);
        }

        if live.running {
            if let Err(err) = self.api.stop_job().await {
                warn!(error = ?err, "Stop request failed, resetting anyway");
            }
            sleep(self.config.stop_settle_delay()).await;
        }

        match self.api.reset().await {
            Ok(_) => {
                self.state.reset_local();
                self.state
                    .push_log("State reset. Ready for a new run.", LogLevel::Info);
                info!("Job state reset");
                self.refresh_status().await;
                Ok(RestartOutcome::Reset)
            }
            Err(err) if err.is_not_found() => {
                warn!("Reset endpoint missing, clearing local state only");
                self.state.reset_local();
                self.state.push_log(
                    "Server reset unavailable; local state cleared only",
                    LogLevel::Warning,
                );
                Ok(RestartOutcome::LocalOnly)
            }
            Err(err) => Err(err),
        }
    }

    /// Fetch and reconcile one snapshot outside the poll schedule.
    pub async fn refresh_status(&mut self) {
        match self.api.status().await {
            Ok(snapshot) => {
                let follow_ups = self.state.apply_snapshot(&snapshot);
                self.run_follow_ups(&follow_ups).await;
            }
            Err(err) => warn!(error = ?err, "Status refresh failed"),
        }
    }

    pub async fn refresh_files(&mut self) -> Result<(), WizardError> {
        let files = self.api.files().await?;
        self.state.set_files(FileListing::partition(&files));
        Ok(())
    }

    pub async fn run_follow_ups(&mut self, follow_ups: &[FollowUp]) {
        for follow_up in follow_ups {
            match follow_up {
                FollowUp::RefreshFiles => {
                    if let Err(err) = self.refresh_files().await {
                        warn!(error = ?err, "File list refresh failed");
                    }
                }
            }
        }
    }
}
