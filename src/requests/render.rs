//! Table rendering, ordering and the title badge.

use std::fmt;

use super::types::{RequestList, RequestRecord};

/// How the per-row priority affordances are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Clickable increment/decrement cells; clicks are handled elsewhere.
    #[default]
    Interactive,
    /// Plain `Up` / `Down` labels.
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Emphasis,
    Neutral,
}

impl RowStyle {
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Emphasis => "info",
            Self::Neutral => "old",
        }
    }
}

/// The two trailing cells of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowActions {
    Adjust,
    Labels,
}

impl RowActions {
    #[must_use]
    pub fn labels(self) -> (&'static str, &'static str) {
        match self {
            Self::Adjust => ("+", "-"),
            Self::Labels => ("Up", "Down"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    /// Present in interactive mode so click handlers can address the row.
    pub id: Option<i64>,
    pub path: String,
    pub method: String,
    pub date: String,
    pub priority: i64,
    pub style: RowStyle,
    pub actions: RowActions,
}

/// Highest priority first; equal priorities keep server order.
pub fn sort(records: &mut [RequestRecord]) {
    records.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Sort a copy of `list` and map every record to a row.
#[must_use]
pub fn render(list: &RequestList, mode: DisplayMode) -> Vec<RenderedRow> {
    let mut records = list.records.clone();
    sort(&mut records);
    records.into_iter().map(|record| render_row(record, mode)).collect()
}

fn render_row(record: RequestRecord, mode: DisplayMode) -> RenderedRow {
    let (id, actions) = match mode {
        DisplayMode::Interactive => (Some(record.id), RowActions::Adjust),
        DisplayMode::ReadOnly => (None, RowActions::Labels),
    };
    RenderedRow {
        id,
        path: record.path,
        method: record.method,
        date: record.date,
        priority: record.priority,
        style: if record.is_new { RowStyle::Emphasis } else { RowStyle::Neutral },
        actions,
    }
}

/// Rewrite the page title with an unread-count style badge.
///
/// The base title is the text between the first and second `)` of the
/// current title; when that is empty (or there is no `)`), the whole current
/// title is used. A present context id is prefixed as `(<id>)`.
#[must_use]
pub fn update_title(context_id: Option<&str>, current_title: &str) -> String {
    let base = match current_title.split(')').nth(1) {
        Some(segment) if !segment.is_empty() => segment,
        _ => current_title,
    };
    match context_id {
        Some(id) => format!("({id}){base}"),
        None => base.to_string(),
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Everything the requests page shows after a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub title: String,
    pub rows: Vec<RenderedRow>,
}

impl TableSnapshot {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), rows: Vec::new() }
    }

    /// Replace the rows and rewrite the title for a fresh poll result.
    pub fn apply(&mut self, list: &RequestList, mode: DisplayMode) {
        self.title = update_title(list.context_id.as_deref(), &self.title);
        self.rows = render(list, mode);
    }
}

impl fmt::Display for TableSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "  {:<32} {:<8} {:<26} {:>8}", "PATH", "METHOD", "DATE", "PRIORITY")?;
        for row in &self.rows {
            let marker = match row.style {
                RowStyle::Emphasis => '*',
                RowStyle::Neutral => ' ',
            };
            let (up, down) = row.actions.labels();
            writeln!(
                f,
                "{marker} {:<32} {:<8} {:<26} {:>8}  [{up}] [{down}]",
                row.path, row.method, row.date, row.priority
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
