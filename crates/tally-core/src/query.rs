//! Translation of a FilterState into list request parameters

use serde::Serialize;

use crate::filter::FilterState;
use crate::types::SortDirection;

/// Query parameter names understood by the transactions endpoint
pub mod keys {
    pub const PAGE: &str = "page";
    pub const PAGE_SIZE: &str = "page_size";
    pub const SEARCH: &str = "search";
    pub const CATEGORY: &str = "category";
    pub const ORDERING: &str = "ordering";
    pub const DATE_AFTER: &str = "date_after";
    pub const DATE_BEFORE: &str = "date_before";
    pub const AMOUNT_GTE: &str = "amount__gte";
    pub const AMOUNT_LTE: &str = "amount__lte";
}

/// Prefix marking a descending ordering token
pub const DESCENDING_MARKER: char = '-';

/// Ordered list of query parameters.
///
/// Unset filters are absent, never sent as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestParams(Vec<(String, String)>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl ToString) {
        self.0.push((key.to_string(), value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Encode sort field and direction as one ordering token
/// (`-date`, `amount`, ...)
pub fn ordering_token(state: &FilterState) -> String {
    match state.sort_direction {
        SortDirection::Descending => format!("{}{}", DESCENDING_MARKER, state.sort_field),
        SortDirection::Ascending => state.sort_field.to_string(),
    }
}

/// Build request parameters for the current view
pub fn map_query(state: &FilterState, page_size: usize) -> RequestParams {
    let mut params = RequestParams::new();

    params.push(keys::PAGE, state.page());
    params.push(keys::PAGE_SIZE, page_size);

    if !state.search_committed.is_empty() {
        params.push(keys::SEARCH, &state.search_committed);
    }
    if let Some(category) = state.category {
        params.push(keys::CATEGORY, category);
    }

    params.push(keys::ORDERING, ordering_token(state));

    if let Some(from) = state.date_from {
        params.push(keys::DATE_AFTER, from.format("%Y-%m-%d"));
    }
    if let Some(to) = state.date_to {
        params.push(keys::DATE_BEFORE, to.format("%Y-%m-%d"));
    }
    if let Some(min) = state.amount_min {
        params.push(keys::AMOUNT_GTE, min);
    }
    if let Some(max) = state.amount_max {
        params.push(keys::AMOUNT_LTE, max);
    }

    params
}
