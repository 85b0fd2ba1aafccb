use serde::Serialize;

/// The five wizard steps, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Credentials = 0,
    Launch = 1,
    SchoolSelection = 2,
    ClassSelection = 3,
    Completed = 4,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Credentials,
        Step::Launch,
        Step::SchoolSelection,
        Step::ClassSelection,
        Step::Completed,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Step::Credentials => "Credentials",
            Step::Launch => "Launch",
            Step::SchoolSelection => "School",
            Step::ClassSelection => "Class",
            Step::Completed => "Results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Active,
    Pending,
}

/// Linear progress indicator. Exactly one step is active, every earlier step is
/// completed and every later one is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMachine {
    active: Step,
}

impl Default for StepMachine {
    fn default() -> Self {
        Self {
            active: Step::Credentials,
        }
    }
}

impl StepMachine {
    pub fn active(&self) -> Step {
        self.active
    }

    /// Make `step` the active one. Returns whether anything changed.
    pub fn show_step(&mut self, step: Step) -> bool {
        let changed = self.active != step;
        self.active = step;
        changed
    }

    pub fn status(&self, step: Step) -> StepStatus {
        match step.cmp(&self.active) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Active,
            std::cmp::Ordering::Greater => StepStatus::Pending,
        }
    }

    pub fn statuses(&self) -> [StepStatus; 5] {
        Step::ALL.map(|step| self.status(step))
    }
}
