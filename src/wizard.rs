//! Client-side wizard: snapshot model, reconciliation, step tracking and the
//! user actions that drive the remote job.

mod actions;
mod auth_timer;
mod files;
mod log_view;
mod reconciler;
mod snapshot;
mod state;
mod step;
mod view;

pub use actions::{ActionController, RestartOutcome};
pub use auth_timer::AuthWaitTimer;
pub use files::{is_intermediate, FileItem, FileListing};
pub use log_view::{LogLevel, LogLine, LogView};
pub use reconciler::{
    reconcile, Category, Controls, Effect, ReconcileContext, Reconciliation, StatusLine,
    StatusTone,
};
pub use snapshot::{ClassOption, JobPhase, School, SelectionOption, StatusSnapshot};
pub use state::{ClientState, FollowUp, SelectionList};
pub use step::{Step, StepMachine, StepStatus};
pub use view::{Confirm, ConfirmPrompt, SelectionItem, StepView, ViewModel, WizardView};
