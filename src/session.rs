//! The single event loop that owns [`ClientState`]. Every wake-up (poll
//! result, timer tick, user command) runs to completion before the next one
//! is looked at, then the view is re-rendered.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{download_to_dir, DownloadProgress, JobApiClient};
use crate::config::Config;
use crate::poller::PollFeeds;
use crate::types::WizardError;
use crate::wizard::{ActionController, ClientState, Confirm, LogLevel, RestartOutcome, WizardView};

const DOWNLOAD_PROGRESS_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    SaveCredentials { login: String, password: String },
    Start,
    SelectSchool(i64),
    SelectClass(String),
    Restart,
    ToggleLogs,
    RefreshFiles,
    Download(String),
}

enum Wake {
    Cancelled,
    Status,
    Logs,
    AuthTick(u64),
    Command(UserCommand),
    StatusClosed,
    LogsClosed,
    CommandsClosed,
}

pub struct Session<V, C> {
    api: JobApiClient,
    config: Config,
    state: ClientState,
    view: V,
    confirm: C,
}

impl<V, C> Session<V, C>
where
    V: WizardView,
    C: Confirm,
{
    pub fn new(api: JobApiClient, config: Config, view: V, confirm: C) -> Self {
        let state = ClientState::new(&config);
        Self {
            api,
            config,
            state,
            view,
            confirm,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Runs until `cancel` fires. A closed command channel only stops input;
    /// polling and rendering carry on.
    pub async fn run(
        &mut self,
        mut feeds: PollFeeds,
        mut commands: mpsc::Receiver<UserCommand>,
        cancel: CancellationToken,
    ) {
        self.bootstrap().await;
        self.render();

        let mut status_open = true;
        let mut logs_open = true;
        let mut commands_open = true;

        loop {
            let wake = tokio::select! {
                _ = cancel.cancelled() => Wake::Cancelled,
                changed = feeds.status.changed(), if status_open => match changed {
                    Ok(()) => Wake::Status,
                    Err(_) => Wake::StatusClosed,
                },
                changed = feeds.logs.changed(), if logs_open => match changed {
                    Ok(()) => Wake::Logs,
                    Err(_) => Wake::LogsClosed,
                },
                elapsed = self.state.next_auth_tick() => Wake::AuthTick(elapsed),
                command = commands.recv(), if commands_open => match command {
                    Some(command) => Wake::Command(command),
                    None => Wake::CommandsClosed,
                },
            };

            match wake {
                Wake::Cancelled => break,
                Wake::Status => {
                    let snapshot = feeds.status.borrow_and_update().clone();
                    if let Some(snapshot) = snapshot {
                        let follow_ups = self.state.apply_snapshot(&snapshot);
                        self.actions().run_follow_ups(&follow_ups).await;
                    }
                }
                Wake::Logs => {
                    let entries = feeds.logs.borrow_and_update().clone();
                    if let Some(entries) = entries {
                        self.state.apply_logs(&entries);
                    }
                }
                Wake::AuthTick(elapsed) => self.state.on_auth_tick(elapsed),
                Wake::Command(command) => {
                    if let Err(err) = self.handle_command(command).await {
                        warn!(error = ?err, "Action failed");
                        self.state.push_log(err.to_string(), LogLevel::Error);
                        self.view.alert(&err.to_string());
                    }
                }
                Wake::StatusClosed => {
                    warn!("Status feed closed");
                    status_open = false;
                }
                Wake::LogsClosed => {
                    warn!("Log feed closed");
                    logs_open = false;
                }
                Wake::CommandsClosed => {
                    debug!("Command input closed");
                    commands_open = false;
                }
            }

            self.render();
        }

        self.state.shutdown();
        info!("Session ended");
    }

    fn actions(&mut self) -> ActionController<'_> {
        ActionController::new(&self.api, &mut self.state, &self.config)
    }

    async fn bootstrap(&mut self) {
        match self.actions().sync_credentials().await {
            Ok(saved) => debug!(credentials_saved = saved, "Credential check finished"),
            Err(err) => warn!(error = ?err, "Credential check failed"),
        }
    }

    async fn handle_command(&mut self, command: UserCommand) -> Result<(), WizardError> {
        debug!(?command, "Handling command");
        match command {
            UserCommand::SaveCredentials { login, password } => {
                self.actions().save_credentials(&login, &password).await
            }
            UserCommand::Start => self.actions().start_job().await,
            UserCommand::SelectSchool(number) => {
                self.actions().select_school(number).await.map(|_| ())
            }
            UserCommand::SelectClass(name) => self.actions().select_class(&name).await.map(|_| ()),
            UserCommand::Restart => {
                let outcome = ActionController::new(&self.api, &mut self.state, &self.config)
                    .restart(&self.confirm)
                    .await?;
                if outcome == RestartOutcome::LocalOnly {
                    self.view
                        .alert("The server has no reset endpoint; only local state was cleared.");
                }
                Ok(())
            }
            UserCommand::ToggleLogs => {
                self.state.toggle_logs();
                Ok(())
            }
            UserCommand::RefreshFiles => self.actions().refresh_files().await,
            UserCommand::Download(name) => self.download(&name).await,
        }
    }

    async fn download(&mut self, name: &str) -> Result<(), WizardError> {
        let (progress_tx, mut progress_rx) =
            mpsc::channel::<DownloadProgress>(DOWNLOAD_PROGRESS_BUFFER);
        let file = name.to_string();
        let reporter = tokio::spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                debug!(
                    file = %file,
                    bytes = progress.downloaded_bytes,
                    percent = ?progress.percent(),
                    "Download progress"
                );
            }
        });

        let result = download_to_dir(
            &self.api,
            name,
            &self.config.download_path(),
            Some(progress_tx),
        )
        .await;
        let _ = reporter.await;

        let path = result?;
        self.state.push_log(
            format!("Downloaded {name} to {}", path.display()),
            LogLevel::Success,
        );
        Ok(())
    }

    fn render(&mut self) {
        let view_model = self.state.view_model();
        self.view.render(&view_model);
    }
}
