mod console;

use std::process::ExitCode;

use mektep_wizard::api::JobApiClient;
use mektep_wizard::config::Config;
use mektep_wizard::poller::Poller;
use mektep_wizard::session::Session;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use console::{ConsoleConfirm, TerminalView};

const COMMAND_BUFFER: usize = 16;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().await;
    let api = match JobApiClient::new(&config) {
        Ok(api) => api,
        Err(err) => {
            error!(error = %err, "Cannot build job API client");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let feeds = match Poller::new(api.clone(), &config).start(cancel.clone()).await {
        Ok(feeds) => feeds,
        Err(err) => {
            error!(error = %err, api = %api.base_url(), "Job service is not reachable");
            return ExitCode::FAILURE;
        }
    };

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupted, shutting down");
                    cancel.cancel();
                }
                Err(err) => warn!(error = ?err, "Cannot listen for Ctrl-C"),
            }
        }
    });

    let confirm = ConsoleConfirm::new();
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    tokio::spawn(console::read_commands(
        commands_tx,
        confirm.clone(),
        cancel.clone(),
    ));

    println!("{}", console::HELP);
    let mut session = Session::new(api, config, TerminalView::default(), confirm);
    session.run(feeds, commands_rx, cancel).await;

    ExitCode::SUCCESS
}
