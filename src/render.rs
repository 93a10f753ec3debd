//! Plain-text rendering of the list view and batch entry state

use rust_decimal::Decimal;
use tally_config::CurrencyConfig;
use tally_core::{BatchEntry, ListTotals, ListView, SortField, Transaction};
use tally_utils::{fit, format_number};

const DATE_WIDTH: usize = 12;
const CATEGORY_WIDTH: usize = 14;
const DESCRIPTION_WIDTH: usize = 36;
const AMOUNT_WIDTH: usize = 16;

/// "BDT 1,234.50"
pub fn format_amount(amount: Decimal, currency: &CurrencyConfig) -> String {
    let rounded = amount.round_dp(currency.decimal_places);
    let text = format!("{:.*}", currency.decimal_places as usize, rounded);
    format!(
        "{} {}",
        currency.code,
        format_number(text, &currency.thousands_separator)
    )
}

fn signed_amount(tx: &Transaction, currency: &CurrencyConfig) -> String {
    let sign = if tx.is_income() { "+" } else { "-" };
    format!("{}{}", sign, format_amount(tx.amount.abs(), currency))
}

fn header(view: &ListView, label: &str, field: SortField) -> String {
    match view.filter.sort_indicator(field) {
        Some(arrow) => format!("{} {}", label, arrow),
        None => label.to_string(),
    }
}

/// Table of the current page
pub fn transactions_table(view: &ListView, currency: &CurrencyConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:>6}  {}{}{}{:>width$}\n",
        "ID",
        fit(&header(view, "Date", SortField::Date), DATE_WIDTH),
        fit("Category", CATEGORY_WIDTH),
        fit("Description", DESCRIPTION_WIDTH),
        header(view, "Amount", SortField::Amount),
        width = AMOUNT_WIDTH
    ));
    out.push_str(&"-".repeat(8 + DATE_WIDTH + CATEGORY_WIDTH + DESCRIPTION_WIDTH + AMOUNT_WIDTH));
    out.push('\n');

    for tx in &view.page.items {
        out.push_str(&format!(
            "{:>6}  {}{}{}{:>width$}\n",
            tx.id,
            fit(&tx.date.to_string(), DATE_WIDTH),
            fit(tx.category.label(), CATEGORY_WIDTH),
            fit(&tx.display_description(), DESCRIPTION_WIDTH),
            signed_amount(tx, currency),
            width = AMOUNT_WIDTH
        ));
    }

    out
}

pub fn totals(totals: &ListTotals, currency: &CurrencyConfig) -> String {
    format!(
        "Income: {}  Expenses: {}  Net: {}  ({} transactions)",
        format_amount(totals.total_income, currency),
        format_amount(totals.total_expenses, currency),
        format_amount(totals.net_amount, currency),
        totals.total_transactions
    )
}

/// Full list screen: banners, filters, table, totals, pagination
pub fn list_view(view: &ListView, currency: &CurrencyConfig) -> String {
    let mut lines = Vec::new();

    if let Some(error) = &view.error {
        lines.push(format!("Error: {}", error));
    }
    if let Some(warning) = &view.warning {
        lines.push(format!("Warning: {}", warning));
    }
    lines.push(format!("Filters: {}", view.active_filters().join(" | ")));

    if view.page.items.is_empty() {
        lines.push(String::new());
        lines.push(if view.filter.is_filtered() {
            "No transactions match the current filters.".to_string()
        } else {
            "No transactions yet.".to_string()
        });
    } else {
        lines.push(String::new());
        lines.push(transactions_table(view, currency).trim_end().to_string());
    }

    if let Some(t) = &view.page.totals {
        lines.push(String::new());
        lines.push(totals(t, currency));
    }

    lines.push(String::new());
    lines.push(view.range_label());
    lines.join("\n")
}

/// Per-row validation messages and the general status line
pub fn batch_status(entry: &BatchEntry) -> String {
    let mut lines = Vec::new();

    for index in 0..entry.len() {
        if let Some(errors) = entry.row_errors(index) {
            for (field, message) in errors {
                lines.push(format!("Row {} {}: {}", index + 1, field, message));
            }
        }
    }
    if let Some(error) = entry.general_error() {
        lines.push(error.to_string());
    }
    if let Some(success) = entry.success_message() {
        lines.push(success.to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_core::{Category, PageResult};

    fn tx(id: u64, category: Category, amount: Decimal) -> Transaction {
        Transaction {
            id,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            category,
            description: "Electricity bill".to_string(),
            amount,
            is_recurring: true,
        }
    }

    #[test]
    fn test_format_amount() {
        let currency = CurrencyConfig::default();
        assert_eq!(format_amount(dec!(1234567.5), &currency), "BDT 1,234,567.50");
        assert_eq!(format_amount(dec!(0), &currency), "BDT 0.00");
    }

    #[test]
    fn test_table_marks_sort_column_and_recurring() {
        let mut view = ListView::new(10);
        view.page = PageResult {
            items: vec![tx(1, Category::Utilities, dec!(1200)), tx(2, Category::Income, dec!(50000))],
            total_count: 2,
            total_pages: 1,
            totals: None,
        };

        let table = transactions_table(&view, &CurrencyConfig::default());
        assert!(table.contains("Date ↓"));
        assert!(!table.contains("Amount ↓"));
        assert!(table.contains("Electricity bill (Recurring)"));
        assert!(table.contains("-BDT 1,200.00"));
        assert!(table.contains("+BDT 50,000.00"));
    }

    #[test]
    fn test_empty_filtered_view() {
        let mut view = ListView::new(10);
        view.filter.set_category(Some(Category::Health));

        let text = list_view(&view, &CurrencyConfig::default());
        assert!(text.contains("No transactions match the current filters."));
        assert!(text.contains("Category: Health"));
        assert!(text.ends_with("No transactions found"));
    }

    #[test]
    fn test_batch_status_lists_row_errors() {
        let mut entry = BatchEntry::default();
        entry.validate();
        let status = batch_status(&entry);
        assert!(status.contains("Row 1 date: Date is required"));
        assert!(status.contains("Row 1 amount: Valid amount is required"));
    }
}
