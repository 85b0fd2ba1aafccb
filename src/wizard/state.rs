//! The one mutable client-side state object. Only the reconciler output and
//! the action controller change it.

use tracing::debug;

use crate::api::LogEntry;
use crate::config::Config;

use super::auth_timer::AuthWaitTimer;
use super::files::FileListing;
use super::log_view::{LogLevel, LogView};
use super::reconciler::{
    reconcile, Category, Controls, Effect, ReconcileContext, Reconciliation, StatusLine,
    StatusTone,
};
use super::snapshot::{SelectionOption, StatusSnapshot};
use super::step::{Step, StepMachine};
use super::view::{SelectionItem, StepView, ViewModel};

const LOCAL_LOG_SOURCE: &str = "SYSTEM";
const STARTING_TEXT: &str = "Starting...";

/// Async work a reconciliation asks for but cannot do itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    RefreshFiles,
}

/// A school or class list. Marks are one-way and survive re-population with
/// the same entries.
#[derive(Debug, Clone, Default)]
pub struct SelectionList {
    items: Vec<SelectionItem>,
}

impl SelectionList {
    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    fn populate(&mut self, options: &[SelectionOption]) {
        let items = options
            .iter()
            .map(|option| SelectionItem {
                number: option.number,
                name: option.name.clone(),
                selected: self.items.iter().any(|item| {
                    item.selected && item.number == option.number && item.name == option.name
                }),
            })
            .collect();
        self.items = items;
    }

    fn mark(&mut self, matches: impl Fn(&SelectionItem) -> bool) -> bool {
        let mut marked = false;
        for item in self.items.iter_mut().filter(|item| matches(item)) {
            item.selected = true;
            marked = true;
        }
        marked
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

pub struct ClientState {
    credentials_saved: bool,
    steps: StepMachine,
    auth_timer: AuthWaitTimer,
    auth_wait_seconds: u64,
    category: Option<Category>,
    status: StatusLine,
    controls: Controls,
    progress: Option<u8>,
    schools: SelectionList,
    classes: SelectionList,
    files: Option<FileListing>,
    logs: LogView,
    auth_step_labels: Vec<String>,
}

impl ClientState {
    pub fn new(config: &Config) -> Self {
        Self {
            credentials_saved: false,
            steps: StepMachine::default(),
            auth_timer: AuthWaitTimer::new(config.auth_timer_tick()),
            auth_wait_seconds: 0,
            category: None,
            status: StatusLine::ready(),
            controls: Controls::IDLE,
            progress: None,
            schools: SelectionList::default(),
            classes: SelectionList::default(),
            files: None,
            logs: LogView::new(config.log_window),
            auth_step_labels: config.auth_step_labels.clone(),
        }
    }

    pub fn credentials_saved(&self) -> bool {
        self.credentials_saved
    }

    pub fn step(&self) -> Step {
        self.steps.active()
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    pub fn auth_wait_seconds(&self) -> u64 {
        self.auth_wait_seconds
    }

    pub fn auth_timer_running(&self) -> bool {
        self.auth_timer.is_running()
    }

    pub fn schools(&self) -> &[SelectionItem] {
        self.schools.items()
    }

    pub fn classes(&self) -> &[SelectionItem] {
        self.classes.items()
    }

    pub fn files(&self) -> Option<&FileListing> {
        self.files.as_ref()
    }

    pub fn logs(&self) -> &LogView {
        &self.logs
    }

    pub fn reconcile(&self, snapshot: &StatusSnapshot) -> Reconciliation {
        let ctx = ReconcileContext {
            credentials_saved: self.credentials_saved,
            current_step: self.steps.active(),
            auth_timer_running: self.auth_timer.is_running(),
            previous_category: self.category,
            auth_step_labels: &self.auth_step_labels,
        };
        reconcile(snapshot, &ctx)
    }

    /// Reconcile a polled snapshot and apply the result.
    pub fn apply_snapshot(&mut self, snapshot: &StatusSnapshot) -> Vec<FollowUp> {
        let reconciliation = self.reconcile(snapshot);
        self.apply(reconciliation)
    }

    pub fn apply(&mut self, reconciliation: Reconciliation) -> Vec<FollowUp> {
        let Reconciliation {
            category,
            status,
            controls,
            step,
            progress,
            effects,
        } = reconciliation;

        if self.category != Some(category) {
            debug!(from = ?self.category, to = ?category, "Status category changed");
        }
        self.category = Some(category);
        self.status = status;
        self.controls = controls;
        if progress.is_some() {
            self.progress = progress;
        }
        if let Some(step) = step {
            self.steps.show_step(step);
        }

        let mut follow_ups = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartAuthTimer => {
                    if self.auth_timer.start() {
                        self.auth_wait_seconds = 0;
                    }
                }
                Effect::StopAuthTimer => self.stop_auth_timer(),
                Effect::ShowAuthWait(seconds) => self.auth_wait_seconds = seconds,
                Effect::PopulateSchools(schools) => self.schools.populate(&schools),
                Effect::PopulateClasses(classes) => self.classes.populate(&classes),
                Effect::RefreshFiles => follow_ups.push(FollowUp::RefreshFiles),
            }
        }
        follow_ups
    }

    pub fn apply_logs(&mut self, entries: &[LogEntry]) -> bool {
        self.logs.replace(entries)
    }

    pub fn on_auth_tick(&mut self, elapsed: u64) {
        if self.auth_timer.is_running() {
            self.auth_wait_seconds = elapsed;
        }
    }

    /// Resolves on the next local auth timer tick; pending while no timer runs.
    pub async fn next_auth_tick(&mut self) -> u64 {
        self.auth_timer.next_tick().await
    }

    pub fn set_files(&mut self, files: FileListing) {
        self.files = Some(files);
    }

    pub fn toggle_logs(&mut self) -> bool {
        self.logs.toggle()
    }

    pub fn shutdown(&mut self) {
        self.auth_timer.stop();
    }

    pub fn view_model(&self) -> ViewModel {
        ViewModel {
            steps: Step::ALL
                .iter()
                .map(|step| StepView {
                    step: *step,
                    title: step.title(),
                    status: self.steps.status(*step),
                })
                .collect(),
            category: self.category,
            status: self.status.clone(),
            controls: self.controls,
            progress: self.progress,
            auth_wait_seconds: self.auth_wait_seconds,
            credentials_saved: self.credentials_saved,
            schools: self.schools.items().to_vec(),
            classes: self.classes.items().to_vec(),
            files: self.files.clone(),
            logs: self.logs.lines().to_vec(),
            logs_auto_scroll: self.logs.auto_scroll(),
        }
    }

    pub(crate) fn mark_credentials_saved(&mut self) {
        self.credentials_saved = true;
    }

    pub(crate) fn show_step(&mut self, step: Step) -> bool {
        self.steps.show_step(step)
    }

    pub(crate) fn set_start_enabled(&mut self, enabled: bool) {
        self.controls.start_enabled = enabled;
    }

    /// Local guess after a successful start; the next poll overwrites it.
    pub(crate) fn mark_running(&mut self) {
        self.category = Some(Category::Running);
        self.status = StatusLine::new(StatusTone::Neutral, STARTING_TEXT);
        self.controls = Controls::BUSY;
    }

    pub(crate) fn mark_school_selected(&mut self, number: i64) -> bool {
        self.schools.mark(|item| item.number == number)
    }

    pub(crate) fn mark_class_selected(&mut self, name: &str) -> bool {
        self.classes.mark(|item| item.name == name)
    }

    pub(crate) fn push_log(&mut self, message: impl Into<String>, level: LogLevel) {
        self.logs.push_local(LOCAL_LOG_SOURCE, message, level);
    }

    /// Clear every transient piece of UI state. Credentials are kept.
    pub(crate) fn reset_local(&mut self) {
        self.stop_auth_timer();
        self.category = Some(Category::Idle);
        self.status = StatusLine::ready();
        self.controls = Controls::IDLE;
        self.progress = None;
        self.schools.clear();
        self.classes.clear();
        self.files = None;
        let step = if self.credentials_saved {
            Step::Launch
        } else {
            Step::Credentials
        };
        self.steps.show_step(step);
    }

    fn stop_auth_timer(&mut self) {
        self.auth_timer.stop();
        self.auth_wait_seconds = 0;
    }
}
