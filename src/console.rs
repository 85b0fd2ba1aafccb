//! Terminal front-end: line commands on stdin, confirmation prompts answered
//! by the next line, and a plain-text rendering of the view model.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mektep_wizard::session::UserCommand;
use mektep_wizard::wizard::{
    Confirm, ConfirmPrompt, FileItem, SelectionItem, StatusTone, StepStatus, ViewModel,
    WizardView,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const HELP: &str = "\
Commands:
  save <login> <password>   store credentials
  start                     start the job
  school <number>           select a school
  class <name>              select a class
  restart                   stop and reset the job
  logs                      expand/collapse the log panel
  files                     reload the result file list
  download <name>           download a result file
  quit                      exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Command(UserCommand),
    Quit,
}

pub fn parse_line(line: &str) -> Result<Option<ConsoleInput>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_lowercase().as_str() {
        "save" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(login), Some(password), None) => UserCommand::SaveCredentials {
                    login: login.to_string(),
                    password: password.to_string(),
                },
                _ => return Err("usage: save <login> <password>".to_string()),
            }
        }
        "start" => UserCommand::Start,
        "school" => match rest.parse::<i64>() {
            Ok(number) => UserCommand::SelectSchool(number),
            Err(_) => return Err("usage: school <number>".to_string()),
        },
        "class" if !rest.is_empty() => UserCommand::SelectClass(rest.to_string()),
        "class" => return Err("usage: class <name>".to_string()),
        "restart" => UserCommand::Restart,
        "logs" => UserCommand::ToggleLogs,
        "files" => UserCommand::RefreshFiles,
        "download" if !rest.is_empty() => UserCommand::Download(rest.to_string()),
        "download" => return Err("usage: download <name>".to_string()),
        "quit" | "exit" => return Ok(Some(ConsoleInput::Quit)),
        other => return Err(format!("unknown command `{other}`, type `help`")),
    };
    Ok(Some(ConsoleInput::Command(command)))
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

type PendingAnswer = Arc<Mutex<Option<oneshot::Sender<bool>>>>;

/// Confirmation via stdin: the prompt is printed and the next input line
/// answers it instead of being parsed as a command.
#[derive(Clone, Default)]
pub struct ConsoleConfirm {
    pending: PendingAnswer,
}

impl ConsoleConfirm {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_pending(&self) -> Option<oneshot::Sender<bool>> {
        match self.pending.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Hands `line` to a waiting prompt. Returns false if none is waiting.
    fn answer(&self, line: &str) -> bool {
        match self.take_pending() {
            Some(tx) => {
                let _ = tx.send(is_yes(line));
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Confirm for ConsoleConfirm {
    async fn confirm(&self, prompt: ConfirmPrompt) -> bool {
        let (tx, rx) = oneshot::channel();
        match self.pending.lock() {
            Ok(mut slot) => *slot = Some(tx),
            Err(poisoned) => *poisoned.into_inner() = Some(tx),
        }
        println!("{} [y/N]", prompt.message());
        rx.await.unwrap_or(false)
    }
}

/// Reads stdin until EOF or `quit`. `quit` cancels the whole session.
pub async fn read_commands(
    commands: mpsc::Sender<UserCommand>,
    confirm: ConsoleConfirm,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            Err(err) => {
                warn!(error = ?err, "Failed to read stdin");
                break;
            }
        };

        if confirm.answer(&line) {
            continue;
        }
        if line.trim().eq_ignore_ascii_case("help") {
            println!("{HELP}");
            continue;
        }

        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ConsoleInput::Quit)) => {
                cancel.cancel();
                break;
            }
            Ok(Some(ConsoleInput::Command(command))) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Err(message) => println!("{message}"),
        }
    }
    // A prompt still waiting on input resolves as "no".
    confirm.take_pending();
}

/// Prints the view only when it differs from the last print.
#[derive(Default)]
pub struct TerminalView {
    last: Option<ViewModel>,
}

impl WizardView for TerminalView {
    fn render(&mut self, view: &ViewModel) {
        if self.last.as_ref() == Some(view) {
            return;
        }
        println!("{}", format_view(view));
        self.last = Some(view.clone());
    }

    fn alert(&mut self, message: &str) {
        println!("!! {message}");
    }
}

pub fn format_view(view: &ViewModel) -> String {
    let mut out = String::new();

    let steps: Vec<String> = view
        .steps
        .iter()
        .map(|step| {
            let mark = match step.status {
                StepStatus::Completed => "x",
                StepStatus::Active => ">",
                StepStatus::Pending => " ",
            };
            format!("[{mark}] {}", step.title)
        })
        .collect();
    let _ = writeln!(out, "{}", steps.join("  "));

    let tone = match view.status.tone {
        StatusTone::Neutral => "",
        StatusTone::Warning => "(!) ",
        StatusTone::Success => "(ok) ",
        StatusTone::Error => "(error) ",
    };
    let _ = writeln!(out, "Status: {tone}{}", view.status.text);
    if let Some(progress) = view.progress {
        let _ = writeln!(out, "Progress: {progress}%");
    }
    if view.controls.auth_wait_visible {
        let _ = writeln!(
            out,
            "Complete the login in the browser window. Waiting {}s",
            view.auth_wait_seconds
        );
    }
    if !view.credentials_saved {
        let _ = writeln!(out, "No credentials stored yet: save <login> <password>");
    }

    write_selection(&mut out, "Schools", &view.schools);
    write_selection(&mut out, "Classes", &view.classes);

    if let Some(files) = &view.files {
        if files.is_empty() {
            let _ = writeln!(out, "No result files found");
        }
        write_files(&mut out, "Intermediate files", &files.intermediate);
        write_files(&mut out, "Processed files", &files.processed);
    }

    let actions: Vec<&str> = [
        (view.controls.start_enabled, "start"),
        (view.controls.restart_visible, "restart"),
    ]
    .iter()
    .filter(|(enabled, _)| *enabled)
    .map(|(_, name)| *name)
    .collect();
    if !actions.is_empty() {
        let _ = writeln!(out, "Available: {}", actions.join(", "));
    }

    if !view.logs.is_empty() {
        let label = if view.logs_auto_scroll {
            "Logs (following)"
        } else {
            "Logs"
        };
        let _ = writeln!(out, "{label}:");
        for line in &view.logs {
            let _ = writeln!(
                out,
                "  {} [{}] {} {}",
                line.timestamp, line.source, line.level, line.message
            );
        }
    }

    out.trim_end().to_string()
}

fn write_selection(out: &mut String, title: &str, items: &[SelectionItem]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{title}:");
    for item in items {
        let mark = if item.selected { " (selected)" } else { "" };
        let _ = writeln!(out, "  No. {} {}{mark}", item.number, item.name);
    }
}

fn write_files(out: &mut String, title: &str, files: &[FileItem]) {
    if files.is_empty() {
        return;
    }
    let _ = writeln!(out, "{title}:");
    for file in files {
        let _ = writeln!(
            out,
            "  {} | {} | {} | {}",
            file.name, file.size, file.modified, file.download_path
        );
    }
}
