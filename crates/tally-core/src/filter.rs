//! User-adjustable view parameters for the transaction list

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Category, SortDirection, SortField};

/// Search, filter, sort and page selection.
///
/// Every mutation except typing into the search box sends the view back
/// to page 1. `page` is 1-based and never below 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Search term the list is currently filtered by
    pub search_committed: String,
    /// Text in the search box that has not been submitted yet
    pub search_pending: String,
    pub category: Option<Category>,
    /// Inclusive lower date bound
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub date_to: Option<NaiveDate>,
    /// Inclusive lower amount bound
    pub amount_min: Option<Decimal>,
    /// Inclusive upper amount bound
    pub amount_max: Option<Decimal>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    #[serde(deserialize_with = "deserialize_page")]
    page: u64,
}

fn deserialize_page<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(u64::deserialize(deserializer)?.max(1))
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_committed: String::new(),
            search_pending: String::new(),
            category: None,
            date_from: None,
            date_to: None,
            amount_min: None,
            amount_max: None,
            sort_field: SortField::Date,
            sort_direction: SortDirection::Descending,
            page: 1,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current 1-based page
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Jump to a page; values below 1 are clamped to 1
    pub fn set_page(&mut self, page: u64) {
        self.page = page.max(1);
    }

    /// Update the search box text without applying it
    pub fn set_search_input(&mut self, text: &str) {
        self.search_pending = text.to_string();
    }

    /// Apply the search box text
    pub fn commit_search(&mut self) {
        self.search_committed = self.search_pending.trim().to_string();
        self.page = 1;
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
        self.page = 1;
    }

    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.date_from = from;
        self.date_to = to;
        self.page = 1;
    }

    pub fn set_amount_range(&mut self, min: Option<Decimal>, max: Option<Decimal>) {
        self.amount_min = min;
        self.amount_max = max;
        self.page = 1;
    }

    /// Same column flips the direction; a new column starts descending
    pub fn toggle_sort(&mut self, field: SortField) {
        if field == self.sort_field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Descending;
        }
        self.page = 1;
    }

    /// Back to defaults, including the pending search text
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether any search or filter narrows the result set.
    /// Sort order and page do not count.
    pub fn is_filtered(&self) -> bool {
        !self.search_committed.is_empty()
            || self.category.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.amount_min.is_some()
            || self.amount_max.is_some()
    }

    /// Sort arrow for a column header, if that column is active
    pub fn sort_indicator(&self, field: SortField) -> Option<&'static str> {
        (self.sort_field == field).then(|| self.sort_direction.arrow())
    }
}
