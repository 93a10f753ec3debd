//! Batch entry of draft transactions
//!
//! Rows are validated locally before anything is sent. A batch is only
//! submitted when every row passes, and it is submitted as one unit: a
//! failed submission leaves every row untouched for correction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};
use crate::gateway::TransactionGateway;
use crate::models::{DraftField, DraftTransaction, NewTransaction, Transaction};
use crate::types::Category;

/// Field-keyed validation messages for one row
pub type RowErrors = BTreeMap<DraftField, String>;

pub const DATE_REQUIRED: &str = "Date is required";
pub const DATE_INVALID: &str = "Enter a valid date (YYYY-MM-DD)";
pub const CATEGORY_REQUIRED: &str = "Category is required";
pub const CATEGORY_UNKNOWN: &str = "Choose one of the listed categories";
pub const DESCRIPTION_REQUIRED: &str = "Description is required";
pub const AMOUNT_INVALID: &str = "Valid amount is required";

pub const FIX_ERRORS_MESSAGE: &str = "Please fix all validation errors before saving.";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save transactions. Please try again.";

/// Parse a user-entered amount (`15.5`, ` 20 `, `1e3`)
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Validate one row; on success the row converts into a create request
pub fn validate_row(draft: &DraftTransaction) -> Result<NewTransaction, RowErrors> {
    let mut errors = RowErrors::new();

    let date = match draft.date.trim() {
        "" => {
            errors.insert(DraftField::Date, DATE_REQUIRED.to_string());
            None
        }
        raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.insert(DraftField::Date, DATE_INVALID.to_string());
                None
            }
        },
    };

    let category = match draft.category.trim() {
        "" => {
            errors.insert(DraftField::Category, CATEGORY_REQUIRED.to_string());
            None
        }
        raw => match raw.parse::<Category>() {
            Ok(category) => Some(category),
            Err(_) => {
                errors.insert(DraftField::Category, CATEGORY_UNKNOWN.to_string());
                None
            }
        },
    };

    let description = draft.description.trim();
    if description.is_empty() {
        errors.insert(DraftField::Description, DESCRIPTION_REQUIRED.to_string());
    }

    let amount = parse_amount(&draft.amount).filter(|a| *a > Decimal::ZERO);
    if amount.is_none() {
        errors.insert(DraftField::Amount, AMOUNT_INVALID.to_string());
    }

    match (date, category, amount) {
        (Some(date), Some(category), Some(amount)) if errors.is_empty() => Ok(NewTransaction {
            date,
            category,
            description: description.to_string(),
            amount,
            is_recurring: draft.is_recurring,
        }),
        _ => Err(errors),
    }
}

/// Result of validating every row
#[derive(Debug, Clone, PartialEq)]
pub struct BatchValidation {
    /// Per-row errors, same order and length as the input
    pub errors: Vec<RowErrors>,
    /// Create requests, present only when every row passed
    pub transactions: Option<Vec<NewTransaction>>,
}

impl BatchValidation {
    pub fn is_valid(&self) -> bool {
        self.transactions.is_some()
    }

    /// Number of rows with at least one error
    pub fn invalid_rows(&self) -> usize {
        self.errors.iter().filter(|e| !e.is_empty()).count()
    }
}

/// Validate all rows; the batch is valid only if no row has errors
pub fn validate_rows(rows: &[DraftTransaction]) -> BatchValidation {
    let mut errors = Vec::with_capacity(rows.len());
    let mut transactions = Vec::with_capacity(rows.len());

    for row in rows {
        match validate_row(row) {
            Ok(tx) => {
                transactions.push(tx);
                errors.push(RowErrors::new());
            }
            Err(row_errors) => errors.push(row_errors),
        }
    }

    let valid = errors.iter().all(|e| e.is_empty());
    BatchValidation {
        errors,
        transactions: valid.then_some(transactions),
    }
}

/// Working set of draft rows plus their status messages
#[derive(Debug, Clone)]
pub struct BatchEntry {
    rows: Vec<DraftTransaction>,
    errors: Vec<RowErrors>,
    general_error: Option<String>,
    success: Option<String>,
    submitting: bool,
    ack_delay: Duration,
}

impl Default for BatchEntry {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

impl BatchEntry {
    /// Start with a single blank row
    pub fn new(ack_delay: Duration) -> Self {
        Self {
            rows: vec![DraftTransaction::blank()],
            errors: vec![RowErrors::new()],
            general_error: None,
            success: None,
            submitting: false,
            ack_delay,
        }
    }

    pub fn rows(&self) -> &[DraftTransaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Errors for one row (empty if it passed or was not validated yet)
    pub fn row_errors(&self, index: usize) -> Option<&RowErrors> {
        self.errors.get(index)
    }

    pub fn general_error(&self) -> Option<&str> {
        self.general_error.as_deref()
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Append a blank row
    pub fn add_row(&mut self) {
        self.rows.push(DraftTransaction::blank());
        self.errors.push(RowErrors::new());
    }

    /// Append a pre-filled row
    pub fn push_row(&mut self, draft: DraftTransaction) {
        if self.rows.len() == 1 && self.rows[0].is_blank() {
            self.rows[0] = draft;
            self.errors[0].clear();
        } else {
            self.rows.push(draft);
            self.errors.push(RowErrors::new());
        }
    }

    /// Remove a row; the last remaining row cannot be removed
    pub fn remove_row(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.rows.len() {
            return Err(CoreError::RowOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        if self.rows.len() <= 1 {
            return Err(CoreError::LastRow);
        }

        self.rows.remove(index);
        self.errors.remove(index);
        Ok(())
    }

    /// Edit one field; clears that field's error on the row
    pub fn update_field(&mut self, index: usize, field: DraftField, value: &str) -> CoreResult<()> {
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(CoreError::RowOutOfRange { index, len })?;

        match field {
            DraftField::Date => row.date = value.to_string(),
            DraftField::Category => row.category = value.to_string(),
            DraftField::Description => row.description = value.to_string(),
            DraftField::Amount => row.amount = value.to_string(),
            DraftField::IsRecurring => {
                row.is_recurring = matches!(
                    value.trim().to_lowercase().as_str(),
                    "true" | "1" | "yes" | "on"
                )
            }
        }

        if let Some(errors) = self.errors.get_mut(index) {
            errors.remove(&field);
        }
        Ok(())
    }

    /// Validate every row and record the per-row errors
    pub fn validate(&mut self) -> BatchValidation {
        let validation = validate_rows(&self.rows);
        self.errors = validation.errors.clone();
        validation
    }

    /// Validate and, if every row passes, submit the whole batch.
    ///
    /// Rows are left unchanged on any failure. On success the success
    /// message is set; call [`BatchEntry::acknowledge`] to clear the rows.
    pub async fn submit(&mut self, gateway: &dyn TransactionGateway) -> CoreResult<Vec<Transaction>> {
        self.general_error = None;
        self.success = None;

        let validation = self.validate();
        let Some(transactions) = validation.transactions else {
            log::debug!(
                "Batch validation failed for {} of {} rows",
                validation.errors.iter().filter(|e| !e.is_empty()).count(),
                self.rows.len()
            );
            self.general_error = Some(FIX_ERRORS_MESSAGE.to_string());
            return Err(CoreError::Validation {
                message: FIX_ERRORS_MESSAGE.to_string(),
            });
        };

        self.submitting = true;
        let result = gateway.create_many(&transactions).await;
        self.submitting = false;

        match result {
            Ok(saved) => {
                log::info!("Saved batch of {} transactions", saved.len());
                self.success = Some(format!(
                    "Successfully saved {} transaction(s)!",
                    transactions.len()
                ));
                Ok(saved)
            }
            Err(e) => {
                log::warn!("Batch submission failed: {}", e);
                self.general_error = Some(SAVE_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    /// Let the success message show for the acknowledgment delay, then
    /// reset to a single blank row. Does nothing if no batch was saved.
    pub async fn acknowledge(&mut self) {
        if self.success.is_none() {
            return;
        }
        tokio::time::sleep(self.ack_delay).await;
        self.reset();
    }

    /// Discard all rows and messages
    pub fn reset(&mut self) {
        let ack_delay = self.ack_delay;
        *self = Self::new(ack_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrors;
    use crate::testing::MockGateway;
    use rust_decimal_macros::dec;

    fn draft(date: &str, category: &str, description: &str, amount: &str) -> DraftTransaction {
        DraftTransaction {
            date: date.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
            is_recurring: false,
        }
    }

    fn lunch() -> DraftTransaction {
        draft("2024-01-01", "food", "lunch", "15.5")
    }

    #[test]
    fn test_valid_row() {
        let tx = validate_row(&lunch()).unwrap();
        assert_eq!(tx.amount, dec!(15.5));
        assert_eq!(tx.category, Category::Food);
        assert_eq!(tx.description, "lunch");
    }

    #[test]
    fn test_zero_amount_invalid() {
        let errors = validate_row(&draft("2024-01-01", "food", "lunch", "0")).unwrap_err();
        assert_eq!(errors.get(&DraftField::Amount).map(String::as_str), Some(AMOUNT_INVALID));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_negative_and_garbage_amount_invalid() {
        assert!(validate_row(&draft("2024-01-01", "food", "x", "-3")).is_err());
        assert!(validate_row(&draft("2024-01-01", "food", "x", "ten")).is_err());
        assert!(validate_row(&draft("2024-01-01", "food", "x", "")).is_err());
    }

    #[test]
    fn test_every_field_reported_independently() {
        let errors = validate_row(&DraftTransaction::blank()).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[&DraftField::Date], DATE_REQUIRED);
        assert_eq!(errors[&DraftField::Category], CATEGORY_REQUIRED);
        assert_eq!(errors[&DraftField::Description], DESCRIPTION_REQUIRED);
    }

    #[test]
    fn test_whitespace_description_and_bad_inputs() {
        let errors = validate_row(&draft("01/02/2024", "snacks", "   ", "4")).unwrap_err();
        assert_eq!(errors[&DraftField::Date], DATE_INVALID);
        assert_eq!(errors[&DraftField::Category], CATEGORY_UNKNOWN);
        assert_eq!(errors[&DraftField::Description], DESCRIPTION_REQUIRED);
        assert!(!errors.contains_key(&DraftField::Amount));
    }

    #[test]
    fn test_validate_rows_all_or_nothing() {
        let validation = validate_rows(&[lunch(), draft("2024-01-02", "transport", "bus", "0")]);
        assert!(!validation.is_valid());
        assert_eq!(validation.errors.len(), 2);
        assert!(validation.errors[0].is_empty());
        assert_eq!(validation.invalid_rows(), 1);

        let validation = validate_rows(&[lunch(), lunch()]);
        assert!(validation.is_valid());
        assert_eq!(validation.transactions.unwrap().len(), 2);
    }

    #[test]
    fn test_remove_only_row_rejected() {
        let mut entry = BatchEntry::default();
        assert!(matches!(entry.remove_row(0), Err(CoreError::LastRow)));
        assert_eq!(entry.len(), 1);
    }

    #[test]
    fn test_add_and_remove_rows() {
        let mut entry = BatchEntry::default();
        entry.add_row();
        entry.add_row();
        assert_eq!(entry.len(), 3);

        entry.update_field(1, DraftField::Description, "middle").unwrap();
        entry.remove_row(0).unwrap();
        assert_eq!(entry.len(), 2);
        assert_eq!(entry.rows()[0].description, "middle");

        assert!(matches!(
            entry.remove_row(5),
            Err(CoreError::RowOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_editing_clears_only_that_field_error() {
        let mut entry = BatchEntry::default();
        entry.validate();
        assert_eq!(entry.row_errors(0).unwrap().len(), 4);

        entry.update_field(0, DraftField::Amount, "20").unwrap();
        let errors = entry.row_errors(0).unwrap();
        assert_eq!(errors.len(), 3);
        assert!(!errors.contains_key(&DraftField::Amount));
    }

    #[test]
    fn test_push_row_replaces_initial_blank() {
        let mut entry = BatchEntry::default();
        entry.push_row(lunch());
        entry.push_row(lunch());
        assert_eq!(entry.len(), 2);
        assert!(!entry.rows()[0].is_blank());
    }

    #[tokio::test]
    async fn test_invalid_batch_is_not_sent() {
        let gateway = MockGateway::new();
        let mut entry = BatchEntry::new(Duration::ZERO);
        entry.push_row(lunch());
        entry.add_row();

        let result = entry.submit(&gateway).await;
        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(entry.general_error(), Some(FIX_ERRORS_MESSAGE));
        assert_eq!(gateway.create_many_calls(), 0);
        assert_eq!(entry.len(), 2);
        assert!(entry.row_errors(0).unwrap().is_empty());
        assert_eq!(entry.row_errors(1).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_rows() {
        let gateway = MockGateway::new();
        let mut fields = FieldErrors::new();
        fields.push("amount", "too large");
        gateway.fail_next_create_many(CoreError::ServerRejected(fields));

        let mut entry = BatchEntry::new(Duration::ZERO);
        entry.push_row(lunch());
        entry.push_row(draft("2024-01-03", "health", "pharmacy", "40"));
        let before = entry.rows().to_vec();

        assert!(entry.submit(&gateway).await.is_err());
        assert_eq!(entry.general_error(), Some(SAVE_FAILED_MESSAGE));
        assert_eq!(entry.rows(), before.as_slice());
        assert!(entry.success_message().is_none());
        assert!(!entry.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_submission_resets_after_ack() {
        let gateway = MockGateway::new();
        let mut entry = BatchEntry::new(Duration::from_millis(1500));
        entry.push_row(lunch());
        entry.push_row(draft("2024-01-03", "income", "salary", "5000"));

        let saved = entry.submit(&gateway).await.unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(gateway.create_many_calls(), 1);
        assert_eq!(entry.success_message(), Some("Successfully saved 2 transaction(s)!"));
        assert_eq!(entry.len(), 2);

        let started = tokio::time::Instant::now();
        entry.acknowledge().await;
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(entry.len(), 1);
        assert!(entry.rows()[0].is_blank());
        assert!(entry.success_message().is_none());
    }
}
