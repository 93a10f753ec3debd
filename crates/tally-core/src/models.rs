//! Core data models for transactions, drafts and list pages

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::Category;

/// Server-assigned transaction identifier
pub type TransactionId = u64;

/// Persisted transaction as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, never assigned by the client
    pub id: TransactionId,
    /// Calendar date
    pub date: NaiveDate,
    /// Spending/income category
    pub category: Category,
    /// Free-text description
    pub description: String,
    /// Signed amount
    pub amount: Decimal,
    /// Whether this transaction repeats
    #[serde(default)]
    pub is_recurring: bool,
}

impl Transaction {
    /// Whether this is an income entry
    pub fn is_income(&self) -> bool {
        self.category == Category::Income
    }

    /// Description with the recurring marker the list shows
    pub fn display_description(&self) -> String {
        if self.is_recurring {
            format!("{} (Recurring)", self.description)
        } else {
            self.description.clone()
        }
    }
}

/// Request body for creating a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub category: Category,
    pub description: String,
    pub amount: Decimal,
    pub is_recurring: bool,
}

/// Partial update; only the fields that are set are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
}

impl TransactionPatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.amount.is_none()
            && self.is_recurring.is_none()
    }
}

/// Unsaved transaction row, holding raw form input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftTransaction {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub is_recurring: bool,
}

impl DraftTransaction {
    /// A blank row
    pub fn blank() -> Self {
        Self::default()
    }

    /// Whether nothing has been entered yet
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

/// Editable field of a draft row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Date,
    Category,
    Description,
    Amount,
    IsRecurring,
}

impl std::str::FromStr for DraftField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(DraftField::Date),
            "category" => Ok(DraftField::Category),
            "description" => Ok(DraftField::Description),
            "amount" => Ok(DraftField::Amount),
            "is_recurring" | "recurring" => Ok(DraftField::IsRecurring),
            _ => Err(format!("Invalid field: {}", s)),
        }
    }
}

impl std::fmt::Display for DraftField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftField::Date => write!(f, "date"),
            DraftField::Category => write!(f, "category"),
            DraftField::Description => write!(f, "description"),
            DraftField::Amount => write!(f, "amount"),
            DraftField::IsRecurring => write!(f, "is_recurring"),
        }
    }
}

/// Aggregates the server computes over the whole filtered set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListTotals {
    #[serde(default)]
    pub total_income: Decimal,
    #[serde(default)]
    pub total_expenses: Decimal,
    #[serde(default)]
    pub net_amount: Decimal,
    #[serde(default)]
    pub total_transactions: u64,
}

/// One page of the remote collection.
///
/// Always replaced wholesale after a fetch, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub items: Vec<Transaction>,
    pub total_count: u64,
    /// `max(1, ceil(total_count / page_size))`
    pub total_pages: u64,
    /// Present only when the server sent an envelope with totals
    pub totals: Option<ListTotals>,
}

impl PageResult {
    /// Page with no rows; `total_pages` stays at 1
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            total_pages: 1,
            totals: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for PageResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// Number of pages needed for `total_count` rows, never less than 1
pub fn total_pages_for(total_count: u64, page_size: usize) -> u64 {
    let page_size = page_size.max(1) as u64;
    total_count.div_ceil(page_size).max(1)
}
