//! Denormalized task views consumed by the indexer and the context assembler.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::embeddings::RecordKind;

const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

/// Text view of a task as supplied by the host application.
///
/// Every descriptive field is optional; defaults are applied where the
/// snapshot is rendered, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identifier.
    pub id: i64,
    /// Parent task, for subtasks.
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// Short title.
    #[serde(default)]
    pub title: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Status label such as `pending` or `completed`.
    #[serde(default)]
    pub status: Option<String>,
    /// Priority label.
    #[serde(default)]
    pub priority: Option<String>,
    /// Due date as stored by the application (ISO 8601).
    #[serde(default)]
    pub due_date: Option<String>,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
    /// Completion timestamp, when finished.
    #[serde(default)]
    pub completion_date: Option<String>,
    /// Entity category; defaults to `task`.
    #[serde(default = "default_kind", rename = "type")]
    pub kind: RecordKind,
}

fn default_kind() -> RecordKind {
    RecordKind::Task
}

impl TaskSnapshot {
    /// Creates a snapshot with only an id and title set.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            title: Some(title.into()),
            description: None,
            status: None,
            priority: None,
            due_date: None,
            created_at: None,
            completion_date: None,
            kind: RecordKind::Task,
        }
    }

    /// Whether the status label denotes a finished task.
    pub fn is_completed(&self) -> bool {
        self.status
            .as_deref()
            .map(|status| {
                let status = status.trim();
                ["completed", "complete", "done", "1", "true"]
                    .iter()
                    .any(|label| status.eq_ignore_ascii_case(label))
            })
            .unwrap_or(false)
    }

    /// Whole days between creation and due date, rounded up.
    pub fn duration_days(&self) -> Option<i64> {
        let created = parse_timestamp(self.created_at.as_deref()?)?;
        let due = parse_timestamp(self.due_date.as_deref()?)?;
        let seconds = (due - created).num_seconds();
        Some(div_ceil(seconds, SECONDS_PER_DAY))
    }

    /// Text submitted to the embedding provider for this task.
    pub fn embedding_input(&self) -> String {
        let parent = self
            .parent_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "None".to_string());
        let duration = self
            .duration_days()
            .map(|days| days.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        format!(
            "Task ID: {}\nParent Task ID: {}\nTask Title: {}\nDescription: {}\nStatus: {}\nPriority: {}\nDuration (in days): {}",
            self.id,
            parent,
            non_blank(self.title.as_deref()).unwrap_or(""),
            non_blank(self.description.as_deref()).unwrap_or("No description"),
            if self.is_completed() { "completed" } else { "pending" },
            non_blank(self.priority.as_deref()).unwrap_or(""),
            duration,
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn div_ceil(value: i64, divisor: i64) -> i64 {
    let quotient = value / divisor;
    if value % divisor > 0 {
        quotient + 1
    } else {
        quotient
    }
}

/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS`, SQLite's space-separated
/// form, or a bare date (midnight).
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
