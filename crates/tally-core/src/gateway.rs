//! Boundary toward the remote transactions API

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::CoreResult;
use crate::models::{NewTransaction, Transaction, TransactionId, TransactionPatch};
use crate::query::RequestParams;

/// Gateway reference type
pub type GatewayRef = Arc<dyn TransactionGateway>;

/// Remote operations the list controller and batch entry depend on.
///
/// Every call may fail; callers resynchronise by refetching rather than
/// patching local state.
#[async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Fetch one page; the raw body is handed to the normalizer
    async fn list(&self, params: &RequestParams) -> CoreResult<serde_json::Value>;

    /// Create a single transaction
    async fn create(&self, transaction: &NewTransaction) -> CoreResult<Transaction>;

    /// Create a batch, accepted or rejected as a whole
    async fn create_many(&self, transactions: &[NewTransaction]) -> CoreResult<Vec<Transaction>>;

    /// Apply a partial update
    async fn update(&self, id: TransactionId, patch: &TransactionPatch) -> CoreResult<Transaction>;

    /// Remove a transaction
    async fn delete(&self, id: TransactionId) -> CoreResult<()>;
}
