//! In-memory gateway used by the unit tests

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

use crate::error::{CoreError, CoreResult};
use crate::gateway::TransactionGateway;
use crate::models::{NewTransaction, Transaction, TransactionId, TransactionPatch};
use crate::query::RequestParams;
use crate::types::Category;

enum ListResponse {
    Ready(CoreResult<Value>),
    Gated(oneshot::Receiver<CoreResult<Value>>),
}

#[derive(Default)]
struct MockState {
    list_responses: VecDeque<ListResponse>,
    list_calls: Vec<RequestParams>,
    created: Vec<NewTransaction>,
    create_many_calls: usize,
    updates: Vec<(TransactionId, TransactionPatch)>,
    deletes: Vec<TransactionId>,
    fail_create_many: Option<CoreError>,
    fail_mutation: Option<CoreError>,
    next_id: TransactionId,
}

/// Scriptable gateway recording every call
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

pub fn sample_tx(id: TransactionId) -> Value {
    json!({
        "id": id,
        "date": "2024-01-15",
        "category": "food",
        "description": format!("item {}", id),
        "amount": "10.00",
        "is_recurring": false
    })
}

/// Envelope holding the given ids with a total `count`
pub fn envelope(ids: &[TransactionId], count: u64) -> Value {
    json!({
        "count": count,
        "results": ids.iter().map(|id| sample_tx(*id)).collect::<Vec<_>>()
    })
}

fn materialize(id: TransactionId, tx: &NewTransaction) -> Transaction {
    Transaction {
        id,
        date: tx.date,
        category: tx.category,
        description: tx.description.clone(),
        amount: tx.amount,
        is_recurring: tx.is_recurring,
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an immediate list response
    pub fn push_list(&self, response: CoreResult<Value>) {
        self.state
            .lock()
            .unwrap()
            .list_responses
            .push_back(ListResponse::Ready(response));
    }

    /// Queue a list response that resolves when the returned sender fires
    pub fn push_gated_list(&self) -> oneshot::Sender<CoreResult<Value>> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .unwrap()
            .list_responses
            .push_back(ListResponse::Gated(rx));
        tx
    }

    pub fn fail_next_create_many(&self, error: CoreError) {
        self.state.lock().unwrap().fail_create_many = Some(error);
    }

    pub fn fail_next_mutation(&self, error: CoreError) {
        self.state.lock().unwrap().fail_mutation = Some(error);
    }

    pub fn list_calls(&self) -> Vec<RequestParams> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn create_many_calls(&self) -> usize {
        self.state.lock().unwrap().create_many_calls
    }

    pub fn created(&self) -> Vec<NewTransaction> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn updates(&self) -> Vec<(TransactionId, TransactionPatch)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn deletes(&self) -> Vec<TransactionId> {
        self.state.lock().unwrap().deletes.clone()
    }

    fn allocate_id(state: &mut MockState) -> TransactionId {
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl TransactionGateway for MockGateway {
    async fn list(&self, params: &RequestParams) -> CoreResult<Value> {
        let response = {
            let mut state = self.state.lock().unwrap();
            state.list_calls.push(params.clone());
            state.list_responses.pop_front()
        };

        match response {
            None => Ok(envelope(&[], 0)),
            Some(ListResponse::Ready(result)) => result,
            Some(ListResponse::Gated(rx)) => rx.await.unwrap_or_else(|_| {
                Err(CoreError::Transport {
                    message: "gate dropped".to_string(),
                })
            }),
        }
    }

    async fn create(&self, transaction: &NewTransaction) -> CoreResult<Transaction> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_mutation.take() {
            return Err(error);
        }
        state.created.push(transaction.clone());
        let id = Self::allocate_id(&mut state);
        Ok(materialize(id, transaction))
    }

    async fn create_many(&self, transactions: &[NewTransaction]) -> CoreResult<Vec<Transaction>> {
        let mut state = self.state.lock().unwrap();
        state.create_many_calls += 1;
        if let Some(error) = state.fail_create_many.take() {
            return Err(error);
        }
        let mut saved = Vec::with_capacity(transactions.len());
        for tx in transactions {
            state.created.push(tx.clone());
            let id = Self::allocate_id(&mut state);
            saved.push(materialize(id, tx));
        }
        Ok(saved)
    }

    async fn update(&self, id: TransactionId, patch: &TransactionPatch) -> CoreResult<Transaction> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_mutation.take() {
            return Err(error);
        }
        state.updates.push((id, patch.clone()));
        Ok(Transaction {
            id,
            date: patch
                .date
                .unwrap_or_else(|| NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            category: patch.category.unwrap_or(Category::Food),
            description: patch.description.clone().unwrap_or_default(),
            amount: patch.amount.unwrap_or(Decimal::ONE),
            is_recurring: patch.is_recurring.unwrap_or(false),
        })
    }

    async fn delete(&self, id: TransactionId) -> CoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_mutation.take() {
            return Err(error);
        }
        state.deletes.push(id);
        Ok(())
    }
}
