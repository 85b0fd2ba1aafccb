//! Maps one status snapshot plus the prior client state to the UI category,
//! the step to display and the side effects to run.
//!
//! Pure: no clock, no I/O. Each call is a full overwrite derived from the
//! snapshot alone, so a late or reordered snapshot can never merge stale data
//! into the result.

use serde::Serialize;

use super::snapshot::{ClassOption, JobPhase, School, StatusSnapshot};
use super::step::Step;

const AUTH_WAIT_TEXT: &str = "Waiting for browser authentication...";
const SCHOOL_WAIT_TEXT: &str = "Waiting for school selection...";
const CLASS_WAIT_TEXT: &str = "Waiting for class selection...";
const RUNNING_TEXT: &str = "Running...";
const COMPLETED_TEXT: &str = "Process completed!";
pub(crate) const READY_TEXT: &str = "Ready to start";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Error,
    AwaitingAuth,
    SelectSchool,
    SelectClass,
    Running,
    Completed,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Neutral,
    Warning,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub tone: StatusTone,
    pub text: String,
}

impl StatusLine {
    pub fn new(tone: StatusTone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    pub fn ready() -> Self {
        Self::new(StatusTone::Neutral, READY_TEXT)
    }
}

/// Enablement of the wizard's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub start_enabled: bool,
    pub restart_visible: bool,
    pub auth_wait_visible: bool,
}

impl Controls {
    pub const IDLE: Controls = Controls {
        start_enabled: true,
        restart_visible: false,
        auth_wait_visible: false,
    };

    pub const BUSY: Controls = Controls {
        start_enabled: false,
        restart_visible: true,
        auth_wait_visible: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartAuthTimer,
    /// Stop the local timer (if any) and reset the displayed wait to zero.
    StopAuthTimer,
    /// Display the wait time reported by the server.
    ShowAuthWait(u64),
    PopulateSchools(Vec<School>),
    PopulateClasses(Vec<ClassOption>),
    RefreshFiles,
}

/// The slice of client state the reconciler reads.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    pub credentials_saved: bool,
    pub current_step: Step,
    pub auth_timer_running: bool,
    pub previous_category: Option<Category>,
    pub auth_step_labels: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub category: Category,
    pub status: StatusLine,
    pub controls: Controls,
    /// Step to show, `None` to leave the current one alone.
    pub step: Option<Step>,
    /// Progress to display, only reported while the job runs.
    pub progress: Option<u8>,
    pub effects: Vec<Effect>,
}

pub fn reconcile(snapshot: &StatusSnapshot, ctx: &ReconcileContext<'_>) -> Reconciliation {
    let progress = snapshot.running.then_some(snapshot.progress);

    match snapshot.phase(ctx.auth_step_labels) {
        JobPhase::Failed { error } => Reconciliation {
            category: Category::Error,
            status: StatusLine::new(StatusTone::Error, format!("Error: {error}")),
            controls: Controls {
                start_enabled: true,
                ..Controls::BUSY
            },
            step: None,
            progress,
            effects: vec![Effect::StopAuthTimer],
        },
        JobPhase::AwaitingAuth { server_wait } => {
            let effects = match server_wait {
                Some(seconds) => vec![Effect::StopAuthTimer, Effect::ShowAuthWait(seconds)],
                None if ctx.auth_timer_running => Vec::new(),
                None => vec![Effect::StartAuthTimer],
            };
            Reconciliation {
                category: Category::AwaitingAuth,
                status: StatusLine::new(StatusTone::Warning, AUTH_WAIT_TEXT),
                controls: Controls {
                    auth_wait_visible: true,
                    ..Controls::BUSY
                },
                step: None,
                progress,
                effects,
            }
        }
        JobPhase::SelectSchool { schools } => {
            let mut effects = vec![Effect::StopAuthTimer];
            let step = schools.map(|list| {
                effects.push(Effect::PopulateSchools(list.to_vec()));
                Step::SchoolSelection
            });
            Reconciliation {
                category: Category::SelectSchool,
                status: StatusLine::new(StatusTone::Warning, SCHOOL_WAIT_TEXT),
                controls: Controls::BUSY,
                step,
                progress,
                effects,
            }
        }
        JobPhase::SelectClass { classes } => {
            let mut effects = vec![Effect::StopAuthTimer];
            let step = classes.map(|list| {
                effects.push(Effect::PopulateClasses(list.to_vec()));
                Step::ClassSelection
            });
            Reconciliation {
                category: Category::SelectClass,
                status: StatusLine::new(StatusTone::Warning, CLASS_WAIT_TEXT),
                controls: Controls::BUSY,
                step,
                progress,
                effects,
            }
        }
        JobPhase::Running { message } => Reconciliation {
            category: Category::Running,
            status: StatusLine::new(StatusTone::Neutral, message.unwrap_or(RUNNING_TEXT)),
            controls: Controls::BUSY,
            step: None,
            progress,
            effects: vec![Effect::StopAuthTimer],
        },
        JobPhase::Completed => {
            let mut effects = vec![Effect::StopAuthTimer];
            if ctx.previous_category != Some(Category::Completed) {
                effects.push(Effect::RefreshFiles);
            }
            Reconciliation {
                category: Category::Completed,
                status: StatusLine::new(StatusTone::Success, COMPLETED_TEXT),
                controls: Controls::BUSY,
                step: Some(Step::Completed),
                progress,
                effects,
            }
        }
        JobPhase::Idle { message } => {
            let target = if ctx.credentials_saved {
                Step::Launch
            } else {
                Step::Credentials
            };
            Reconciliation {
                category: Category::Idle,
                status: StatusLine::new(StatusTone::Neutral, message.unwrap_or(READY_TEXT)),
                controls: Controls::IDLE,
                step: (ctx.current_step != target).then_some(target),
                progress,
                effects: vec![Effect::StopAuthTimer],
            }
        }
        JobPhase::Unsettled { message } => Reconciliation {
            category: Category::Idle,
            status: StatusLine::new(StatusTone::Neutral, message.unwrap_or(READY_TEXT)),
            controls: Controls::IDLE,
            step: None,
            progress,
            effects: vec![Effect::StopAuthTimer],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn labels() -> Vec<String> {
        vec!["Authentication".to_string()]
    }

    fn snapshot(value: Value) -> StatusSnapshot {
        serde_json::from_value(value).expect("snapshot should parse")
    }

    fn ctx(labels: &[String]) -> ReconcileContext<'_> {
        ReconcileContext {
            credentials_saved: false,
            current_step: Step::Credentials,
            auth_timer_running: false,
            previous_category: None,
            auth_step_labels: labels,
        }
    }

    #[test]
    fn error_dominates_every_flag_combination() {
        let labels = labels();
        for bits in 0u8..32 {
            let flag = |bit: u8| bits & (1 << bit) != 0;
            let current_step = if flag(3) { "Authentication" } else { "Export" };
            let progress = if flag(4) { 100 } else { 0 };
            let snap = snapshot(json!({
                "error": "Login failed",
                "running": flag(0),
                "waiting_for_school": flag(1),
                "waiting_for_class": flag(2),
                "current_step": current_step,
                "progress": progress,
                "schools": [{ "number": 1, "name": "A" }]
            }));
            let result = reconcile(&snap, &ctx(&labels));
            assert_eq!(result.category, Category::Error, "flags {bits:05b}");
            assert_eq!(result.step, None);
            assert!(result.controls.start_enabled);
            assert!(result.controls.restart_visible);
            assert_eq!(result.status.text, "Error: Login failed");
        }
    }

    #[test]
    fn scenario_auth_wait_without_server_time_starts_local_timer() {
        let labels = labels();
        let snap = snapshot(json!({
            "running": true,
            "progress": 45,
            "current_step": "Authentication"
        }));

        let result = reconcile(&snap, &ctx(&labels));
        assert_eq!(result.category, Category::AwaitingAuth);
        assert!(!result.controls.start_enabled);
        assert!(result.controls.auth_wait_visible);
        assert_eq!(result.effects, vec![Effect::StartAuthTimer]);
        assert_eq!(result.progress, Some(45));

        let running = ReconcileContext {
            auth_timer_running: true,
            ..ctx(&labels)
        };
        assert!(reconcile(&snap, &running).effects.is_empty());
    }

    #[test]
    fn server_wait_time_suppresses_local_timer() {
        let labels = labels();
        let snap = snapshot(json!({
            "running": true,
            "current_step": "Authentication",
            "auth_wait_time": 17
        }));
        let context = ReconcileContext {
            auth_timer_running: true,
            ..ctx(&labels)
        };

        let result = reconcile(&snap, &context);
        assert_eq!(
            result.effects,
            vec![Effect::StopAuthTimer, Effect::ShowAuthWait(17)]
        );
    }

    #[test]
    fn school_list_moves_to_step_two() {
        let labels = labels();
        let snap = snapshot(json!({
            "running": true,
            "waiting_for_school": true,
            "schools": [
                { "number": 7, "name": "School 7" },
                { "number": 12, "name": "School 12" },
                { "number": 3, "name": "School 3" }
            ]
        }));

        let result = reconcile(&snap, &ctx(&labels));
        assert_eq!(result.category, Category::SelectSchool);
        assert_eq!(result.step, Some(Step::SchoolSelection));
        let Some(Effect::PopulateSchools(schools)) = result.effects.last() else {
            panic!("expected school population, got {:?}", result.effects);
        };
        assert_eq!(
            schools.iter().map(|school| school.number).collect::<Vec<_>>(),
            vec![7, 12, 3]
        );
    }

    #[test]
    fn selection_wait_without_list_keeps_step() {
        let labels = labels();
        let snap = snapshot(json!({ "running": true, "waiting_for_class": true }));
        let result = reconcile(&snap, &ctx(&labels));
        assert_eq!(result.category, Category::SelectClass);
        assert_eq!(result.step, None);
        assert_eq!(result.effects, vec![Effect::StopAuthTimer]);
    }

    #[test]
    fn class_list_moves_to_step_three() {
        let labels = labels();
        let snap = snapshot(json!({
            "running": true,
            "waiting_for_class": true,
            "classes": [{ "number": 1, "name": "9A" }]
        }));
        let result = reconcile(&snap, &ctx(&labels));
        assert_eq!(result.step, Some(Step::ClassSelection));
        assert!(matches!(
            result.effects.last(),
            Some(Effect::PopulateClasses(classes)) if classes[0].name == "9A"
        ));
    }

    #[test]
    fn generic_running_uses_server_message() {
        let labels = labels();
        let snap = snapshot(json!({ "running": true, "progress": 60, "message": "Exporting" }));
        let result = reconcile(&snap, &ctx(&labels));
        assert_eq!(result.category, Category::Running);
        assert_eq!(result.status.text, "Exporting");
        assert_eq!(result.controls, Controls::BUSY);

        let snap = snapshot(json!({ "running": true, "message": "" }));
        assert_eq!(reconcile(&snap, &ctx(&labels)).status.text, RUNNING_TEXT);
    }

    #[test]
    fn scenario_completion_refreshes_files_once_per_transition() {
        let labels = labels();
        let snap = snapshot(json!({ "running": false, "progress": 100 }));

        let first = reconcile(&snap, &ctx(&labels));
        assert_eq!(first.category, Category::Completed);
        assert_eq!(first.step, Some(Step::Completed));
        assert!(!first.controls.start_enabled);
        assert!(first.effects.contains(&Effect::RefreshFiles));

        let again = ReconcileContext {
            previous_category: Some(first.category),
            current_step: Step::Completed,
            ..ctx(&labels)
        };
        assert!(!reconcile(&snap, &again).effects.contains(&Effect::RefreshFiles));
    }

    #[test]
    fn scenario_idle_without_credentials_shows_step_zero() {
        let labels = labels();
        let snap = snapshot(json!({ "running": false, "progress": 0 }));
        let context = ReconcileContext {
            current_step: Step::Launch,
            ..ctx(&labels)
        };

        let result = reconcile(&snap, &context);
        assert_eq!(result.category, Category::Idle);
        assert_eq!(result.step, Some(Step::Credentials));
        assert!(result.controls.start_enabled);
        assert!(!result.controls.restart_visible);
    }

    #[test]
    fn idle_skips_redundant_step_change() {
        let labels = labels();
        let snap = snapshot(json!({ "running": false, "progress": 0 }));
        let context = ReconcileContext {
            credentials_saved: true,
            current_step: Step::Launch,
            ..ctx(&labels)
        };
        assert_eq!(reconcile(&snap, &context).step, None);
    }

    #[test]
    fn unsettled_snapshot_is_idle_without_step_change() {
        let labels = labels();
        let snap = snapshot(json!({ "running": false, "progress": 55 }));
        let context = ReconcileContext {
            current_step: Step::ClassSelection,
            ..ctx(&labels)
        };
        let result = reconcile(&snap, &context);
        assert_eq!(result.category, Category::Idle);
        assert_eq!(result.step, None);
        assert_eq!(result.controls, Controls::IDLE);
        assert_eq!(result.status.text, READY_TEXT);
    }

    #[test]
    fn saved_credentials_never_force_step_zero() {
        let labels = labels();
        let snapshots = [
            json!({ "running": false, "progress": 0 }),
            json!({ "error": "boom" }),
            json!({ "running": true, "current_step": "Authentication" }),
            json!({ "running": true, "waiting_for_school": true }),
            json!({ "running": false, "progress": 30 }),
            json!({ "running": false, "progress": 100 }),
            json!({}),
        ];
        let mut current = Step::Launch;
        for value in snapshots {
            let context = ReconcileContext {
                credentials_saved: true,
                current_step: current,
                ..ctx(&labels)
            };
            let result = reconcile(&snapshot(value), &context);
            if let Some(step) = result.step {
                assert_ne!(step, Step::Credentials);
                current = step;
            }
        }
    }
}
