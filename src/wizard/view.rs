//! View-model records handed to the rendering front-end, and the two seams
//! the front-end implements: rendering and confirmation prompts.

use async_trait::async_trait;
use serde::Serialize;

use super::files::FileListing;
use super::log_view::LogLine;
use super::reconciler::{Category, Controls, StatusLine};
use super::step::{Step, StepStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub step: Step,
    pub title: &'static str,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionItem {
    pub number: i64,
    pub name: String,
    pub selected: bool,
}

/// Everything a front-end needs to paint the wizard. Rendering the same value
/// twice must produce the same display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub steps: Vec<StepView>,
    pub category: Option<Category>,
    pub status: StatusLine,
    pub controls: Controls,
    pub progress: Option<u8>,
    pub auth_wait_seconds: u64,
    pub credentials_saved: bool,
    pub schools: Vec<SelectionItem>,
    pub classes: Vec<SelectionItem>,
    pub files: Option<FileListing>,
    pub logs: Vec<LogLine>,
    pub logs_auto_scroll: bool,
}

impl ViewModel {
    pub fn active_step(&self) -> Option<Step> {
        self.steps
            .iter()
            .find(|view| view.status == StepStatus::Active)
            .map(|view| view.step)
    }
}

pub trait WizardView {
    fn render(&mut self, view: &ViewModel);

    /// Blocking notice for a failed user action.
    fn alert(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPrompt {
    StopRunningJob,
    RestartIdle,
}

impl ConfirmPrompt {
    pub fn message(self) -> &'static str {
        match self {
            ConfirmPrompt::StopRunningJob => {
                "The process is running. Stop it and start over? Unsaved data will be lost."
            }
            ConfirmPrompt::RestartIdle => "Are you sure you want to start over?",
        }
    }
}

#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: ConfirmPrompt) -> bool;
}
