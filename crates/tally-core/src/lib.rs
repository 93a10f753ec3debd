//! Core transaction list logic
//!
//! Filter and sort state, the query mapping toward the transactions API,
//! response normalization, the list controller with stale-response
//! protection, and batch entry of draft transactions.

pub mod batch;
pub mod controller;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod models;
pub mod normalize;
pub mod query;
pub mod types;
pub mod view;

#[cfg(test)]
mod testing;

pub use batch::{validate_row, validate_rows, BatchEntry, BatchValidation, RowErrors};
pub use controller::TransactionListController;
pub use error::{
    CoreError, CoreResult, DefaultErrorLogger, ErrorCode, ErrorContext, ErrorLogger, ErrorSeverity,
    FieldErrors,
};
pub use filter::FilterState;
pub use gateway::{GatewayRef, TransactionGateway};
pub use models::{
    DraftField, DraftTransaction, ListTotals, NewTransaction, PageResult, Transaction,
    TransactionId, TransactionPatch,
};
pub use normalize::{normalize, NormalizedPage};
pub use query::{map_query, RequestParams};
pub use types::{Category, SortDirection, SortField};
pub use view::{ListView, MutationFailure, MutationKind};
