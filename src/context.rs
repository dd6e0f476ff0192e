//! Renders ranked tasks into the bounded context block handed to the model.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::{RagError, Result};
use crate::tasks::TaskSnapshot;
use crate::vector_store::VectorStore;

/// Maximum characters kept from any single text field.
pub const MAX_FIELD_CHARS: usize = 1000;
/// Default number of entries rendered into a context block.
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Truncates to [`MAX_FIELD_CHARS`] characters and strips `<` / `>`.
///
/// Applying it twice yields the same result as applying it once.
pub fn sanitize_field(raw: &str) -> String {
    raw.chars()
        .take(MAX_FIELD_CHARS)
        .filter(|ch| *ch != '<' && *ch != '>')
        .collect()
}

fn sanitize_or(raw: Option<&str>, fallback: &str) -> String {
    sanitize_opt(raw).unwrap_or_else(|| fallback.to_string())
}

fn sanitize_opt(raw: Option<&str>) -> Option<String> {
    raw.map(sanitize_field).filter(|value| !value.trim().is_empty())
}

/// Sanitized, defaulted projection of a [`TaskSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    /// Task identifier.
    pub id: i64,
    /// Upper-cased entity category.
    pub kind: String,
    /// Title or `Untitled Task`.
    pub title: String,
    /// Description or `No description provided.`.
    pub description: String,
    /// Status or `unknown`.
    pub status: String,
    /// Priority or `none`.
    pub priority: String,
    /// Due date or `not set`.
    pub due_date: String,
    /// Creation time or `unknown`.
    pub created_at: String,
    /// Completion time; its line is omitted when absent.
    pub completion_date: Option<String>,
}

impl ContextEntry {
    /// Applies field sanitization and defaults to a snapshot.
    pub fn from_snapshot(task: &TaskSnapshot) -> Self {
        Self {
            id: task.id,
            kind: sanitize_or(Some(task.kind.as_str()), "unknown").to_uppercase(),
            title: sanitize_or(task.title.as_deref(), "Untitled Task"),
            description: sanitize_or(task.description.as_deref(), "No description provided."),
            status: sanitize_or(task.status.as_deref(), "unknown"),
            priority: sanitize_or(task.priority.as_deref(), "none"),
            due_date: sanitize_or(task.due_date.as_deref(), "not set"),
            created_at: sanitize_or(task.created_at.as_deref(), "unknown"),
            completion_date: sanitize_opt(task.completion_date.as_deref()),
        }
    }

    /// Renders the entry under its 1-based rank.
    pub fn render(&self, rank: usize) -> String {
        let mut out = format!(
            "({rank}) [{}] Title: {}\nDescription: {}\nStatus: {}\nPriority: {}\nDue Date: {}\nCreated At: {}",
            self.kind,
            self.title,
            self.description,
            self.status,
            self.priority,
            self.due_date,
            self.created_at,
        );
        if let Some(done) = &self.completion_date {
            out.push_str("\nCompletion Date: ");
            out.push_str(done);
        }
        out
    }
}

/// Joins entries with a blank line, numbering them from 1.
pub fn render_context(entries: &[ContextEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| entry.render(idx + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Maps ranked ids back to live tasks and renders them.
#[derive(Clone)]
pub struct ContextAssembler {
    store: Arc<dyn VectorStore>,
}

impl ContextAssembler {
    /// Creates an assembler reading task snapshots from `store`.
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Fetches, orders, sanitizes, and caps the entries for `ranked_ids`.
    ///
    /// Ids without a live task are dropped silently; duplicates keep their
    /// first position. The cap applies after dropping.
    pub async fn entries(
        &self,
        ranked_ids: &[i64],
        max_entries: usize,
    ) -> Result<Vec<ContextEntry>> {
        if max_entries == 0 {
            return Err(RagError::InvalidInput("max entries must be positive".into()));
        }
        if ranked_ids.is_empty() {
            return Ok(Vec::new());
        }
        let tasks = self.store.get_tasks_by_ids(ranked_ids).await?;
        let by_id: HashMap<i64, TaskSnapshot> =
            tasks.into_iter().map(|task| (task.id, task)).collect();
        let mut seen = HashSet::new();
        let entries: Vec<ContextEntry> = ranked_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| by_id.get(id))
            .take(max_entries)
            .map(ContextEntry::from_snapshot)
            .collect();
        debug!(
            requested = ranked_ids.len(),
            found = by_id.len(),
            rendered = entries.len(),
            "assembled context entries"
        );
        Ok(entries)
    }

    /// Renders the context block, or `NoContext` when nothing survives.
    pub async fn assemble(&self, ranked_ids: &[i64], max_entries: usize) -> Result<String> {
        let entries = self.entries(ranked_ids, max_entries).await?;
        if entries.is_empty() {
            return Err(RagError::NoContext);
        }
        Ok(render_context(&entries))
    }
}
