//! Read-only view state exposed by the list controller

use serde::Serialize;

use crate::error::{CoreError, FieldErrors};
use crate::filter::FilterState;
use crate::models::PageResult;
use crate::types::SortDirection;

/// Mutation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// Last failed create/update/delete, with server field errors kept apart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationFailure {
    pub kind: MutationKind,
    pub message: String,
    pub fields: FieldErrors,
}

impl MutationFailure {
    pub fn from_error(kind: MutationKind, error: &CoreError) -> Self {
        Self {
            kind,
            message: error.to_string(),
            fields: error.field_errors().cloned().unwrap_or_default(),
        }
    }

    /// One-line text for display
    pub fn display_message(&self) -> String {
        if self.fields.is_empty() {
            self.message.clone()
        } else {
            self.fields.flatten()
        }
    }
}

/// Snapshot of everything needed to render the transaction list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView {
    pub filter: FilterState,
    pub page: PageResult,
    pub page_size: usize,
    pub loading: bool,
    /// Banner text for the last failed fetch
    pub error: Option<String>,
    /// Non-fatal note, e.g. an unrecognised response shape
    pub warning: Option<String>,
    pub mutation_error: Option<MutationFailure>,
    pub authenticated: bool,
}

impl ListView {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: FilterState::default(),
            page: PageResult::empty(),
            page_size,
            loading: false,
            error: None,
            warning: None,
            mutation_error: None,
            authenticated: false,
        }
    }

    pub fn current_page(&self) -> u64 {
        self.filter.page()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page() > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page() < self.page.total_pages
    }

    /// "Showing 11-20 of 25 transactions"
    pub fn range_label(&self) -> String {
        if self.page.total_count == 0 || self.page.items.is_empty() {
            return "No transactions found".to_string();
        }
        let start = (self.current_page() - 1) * self.page_size as u64 + 1;
        let end = start + self.page.items.len() as u64 - 1;
        format!(
            "Showing {}-{} of {} transactions (page {} of {})",
            start,
            end,
            self.page.total_count,
            self.current_page(),
            self.page.total_pages
        )
    }

    /// Human-readable description of every active filter and the sort order
    pub fn active_filters(&self) -> Vec<String> {
        let f = &self.filter;
        let mut labels = Vec::new();

        if !f.search_committed.is_empty() {
            labels.push(format!("Search: \"{}\"", f.search_committed));
        }
        if let Some(category) = f.category {
            labels.push(format!("Category: {}", category.label()));
        }
        match (f.date_from, f.date_to) {
            (Some(from), Some(to)) => labels.push(format!("Date: {} to {}", from, to)),
            (Some(from), None) => labels.push(format!("Date: from {}", from)),
            (None, Some(to)) => labels.push(format!("Date: until {}", to)),
            (None, None) => {}
        }
        match (f.amount_min, f.amount_max) {
            (Some(min), Some(max)) => labels.push(format!("Amount: {} to {}", min, max)),
            (Some(min), None) => labels.push(format!("Amount: at least {}", min)),
            (None, Some(max)) => labels.push(format!("Amount: at most {}", max)),
            (None, None) => {}
        }

        let direction = match f.sort_direction {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        };
        labels.push(format!("Sorted by {} ({})", f.sort_field, direction));
        labels
    }
}
