//! Normalization of list responses into a uniform page shape
//!
//! The list endpoint answers with either a paginated envelope
//! (`{count, results, totals?}`) or a bare JSON array. Anything else is
//! tolerated: it becomes an empty page plus a warning for the caller.

use serde_json::Value;

use crate::models::{total_pages_for, ListTotals, PageResult, Transaction};

const RESULTS_KEY: &str = "results";
const COUNT_KEY: &str = "count";
const TOTALS_KEY: &str = "totals";

/// Outcome of classifying a raw list body
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedPage {
    /// Paginated envelope with a server-side total count
    Envelope(PageResult),
    /// Bare array; the whole collection fits on one page
    List(PageResult),
    /// Shape not recognised; carries the reason for the warning
    Unrecognized { reason: String },
}

impl NormalizedPage {
    /// Warning to surface, if the shape was not recognised
    pub fn warning(&self) -> Option<&str> {
        match self {
            NormalizedPage::Unrecognized { reason } => Some(reason),
            _ => None,
        }
    }

    /// The resulting page; unrecognised shapes yield an empty page
    pub fn into_page(self) -> PageResult {
        match self {
            NormalizedPage::Envelope(page) | NormalizedPage::List(page) => page,
            NormalizedPage::Unrecognized { .. } => PageResult::empty(),
        }
    }
}

fn decode_items(values: &[Value]) -> Result<Vec<Transaction>, String> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value.clone())
                .map_err(|e| format!("item {} is not a transaction: {}", index, e))
        })
        .collect()
}

/// Classify and decode a list response body
pub fn normalize(body: &Value, page_size: usize) -> NormalizedPage {
    match body {
        Value::Object(map) => {
            let Some(results) = map.get(RESULTS_KEY).and_then(Value::as_array) else {
                return NormalizedPage::Unrecognized {
                    reason: "object response without a results list".to_string(),
                };
            };

            let items = match decode_items(results) {
                Ok(items) => items,
                Err(reason) => return NormalizedPage::Unrecognized { reason },
            };

            let total_count = map.get(COUNT_KEY).and_then(Value::as_u64).unwrap_or(0);
            let totals = map
                .get(TOTALS_KEY)
                .and_then(|t| serde_json::from_value::<ListTotals>(t.clone()).ok());

            NormalizedPage::Envelope(PageResult {
                items,
                total_count,
                total_pages: total_pages_for(total_count, page_size),
                totals,
            })
        }
        Value::Array(values) => match decode_items(values) {
            Ok(items) => NormalizedPage::List(PageResult {
                total_count: items.len() as u64,
                total_pages: 1,
                items,
                totals: None,
            }),
            Err(reason) => NormalizedPage::Unrecognized { reason },
        },
        other => NormalizedPage::Unrecognized {
            reason: format!("unexpected {} response", json_kind(other)),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn tx_json(id: u64) -> Value {
        json!({
            "id": id,
            "date": "2024-01-15",
            "category": "food",
            "description": format!("meal {}", id),
            "amount": "12.00",
            "is_recurring": false
        })
    }

    #[test]
    fn test_envelope_counts_pages() {
        let results: Vec<Value> = (1..=10).map(tx_json).collect();
        let normalized = normalize(&json!({ "count": 25, "results": results }), 10);

        assert!(matches!(normalized, NormalizedPage::Envelope(_)));
        let page = normalized.into_page();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.totals.is_none());
    }

    #[test]
    fn test_envelope_without_count() {
        let page = normalize(&json!({ "results": [tx_json(1)] }), 10).into_page();
        assert_eq!(page.total_count, 0);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_envelope_with_totals() {
        let body = json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [tx_json(1)],
            "totals": {
                "total_income": 5000.0,
                "total_expenses": 12.0,
                "net_amount": 4988.0,
                "total_transactions": 1
            }
        });

        let totals = normalize(&body, 10).into_page().totals.unwrap();
        assert_eq!(totals.total_income, dec!(5000));
        assert_eq!(totals.net_amount, dec!(4988));
        assert_eq!(totals.total_transactions, 1);
    }

    #[test]
    fn test_bare_list() {
        let normalized = normalize(&json!([tx_json(1), tx_json(2), tx_json(3)]), 10);
        assert!(normalized.warning().is_none());

        let page = normalized.into_page();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_empty_object_is_unrecognized() {
        let normalized = normalize(&json!({}), 10);
        assert!(normalized.warning().is_some());

        let page = normalized.into_page();
        assert_eq!(page.total_count, 0);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_scalar_is_unrecognized() {
        let normalized = normalize(&json!("oops"), 10);
        assert_eq!(normalized.warning(), Some("unexpected string response"));
    }

    #[test]
    fn test_malformed_item_is_unrecognized() {
        let normalized = normalize(&json!({ "count": 1, "results": [{ "id": "x" }] }), 10);
        assert!(normalized.warning().unwrap().contains("item 0"));
        assert_eq!(normalized.into_page(), PageResult::empty());
    }

    #[test]
    fn test_total_pages_minimum_one() {
        for count in [0u64, 1, 9, 10, 11, 99, 100, 101] {
            let page = normalize(&json!({ "count": count, "results": [] }), 10).into_page();
            assert_eq!(page.total_pages, std::cmp::max(1, count.div_ceil(10)));
        }
    }
}
