//! Typed form of one `GET /api/status/scraper` response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One selectable entry offered by the job: a school or a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOption {
    pub number: i64,
    pub name: String,
}

pub type School = SelectionOption;
pub type ClassOption = SelectionOption;

/// Snapshot of the remote job as reported by one status poll.
///
/// Every field is optional on the wire; missing booleans read as `false` and a
/// missing or malformed progress reads as `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub running: bool,
    #[serde(default, deserialize_with = "clamped_progress")]
    pub progress: u8,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub waiting_for_school: bool,
    #[serde(default)]
    pub schools: Option<Vec<School>>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub waiting_for_class: bool,
    #[serde(default)]
    pub classes: Option<Vec<ClassOption>>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub auth_wait_time: Option<u64>,
}

/// The one phase a snapshot resolves to once overlapping flags are ranked.
///
/// Variants are listed in priority order: the first condition that holds wins
/// and later ones are never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase<'a> {
    Failed { error: &'a str },
    AwaitingAuth { server_wait: Option<u64> },
    SelectSchool { schools: Option<&'a [School]> },
    SelectClass { classes: Option<&'a [ClassOption]> },
    Running { message: Option<&'a str> },
    Completed,
    Idle { message: Option<&'a str> },
    /// Not running with partial progress and nothing else set.
    Unsettled { message: Option<&'a str> },
}

impl StatusSnapshot {
    pub fn phase(&self, auth_step_labels: &[String]) -> JobPhase<'_> {
        if let Some(error) = non_empty(self.error.as_deref()) {
            return JobPhase::Failed { error };
        }
        if self.running && self.is_auth_step(auth_step_labels) {
            return JobPhase::AwaitingAuth {
                server_wait: self.auth_wait_time,
            };
        }
        if self.waiting_for_school {
            return JobPhase::SelectSchool {
                schools: self.schools.as_deref(),
            };
        }
        if self.waiting_for_class {
            return JobPhase::SelectClass {
                classes: self.classes.as_deref(),
            };
        }
        let message = non_empty(self.message.as_deref());
        if self.running {
            return JobPhase::Running { message };
        }
        if self.progress == 100 {
            return JobPhase::Completed;
        }
        if self.progress == 0 {
            return JobPhase::Idle { message };
        }
        JobPhase::Unsettled { message }
    }

    fn is_auth_step(&self, labels: &[String]) -> bool {
        self.current_step
            .as_deref()
            .map(|step| labels.iter().any(|label| label == step))
            .unwrap_or(false)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => flag,
        Some(Value::Number(number)) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        _ => false,
    })
}

fn clamped_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let raw = match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(raw.clamp(0.0, 100.0).floor() as u8)
}

/// Whole non-negative seconds; anything else reads as absent.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let seconds = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(seconds
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .map(|seconds| seconds.floor() as u64))
}
