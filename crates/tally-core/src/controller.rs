//! Transaction list controller
//!
//! Owns the FilterState and the latest PageResult. Every filter, sort or
//! page change triggers a fetch; each fetch takes a fresh request token
//! and only the response carrying the latest token is applied, so a slow
//! earlier response can never overwrite a newer one.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::filter::FilterState;
use crate::gateway::GatewayRef;
use crate::models::{NewTransaction, PageResult, Transaction, TransactionId, TransactionPatch};
use crate::normalize::normalize;
use crate::query::{map_query, RequestParams};
use crate::types::{Category, SortField};
use crate::view::{ListView, MutationFailure, MutationKind};

struct ListState {
    view: ListView,
    latest_token: u64,
}

struct FetchTicket {
    token: u64,
    params: RequestParams,
}

/// Keeps the visible page in sync with the filter state
pub struct TransactionListController {
    gateway: GatewayRef,
    page_size: usize,
    state: RwLock<ListState>,
    logger: Arc<dyn ErrorLogger>,
}

impl TransactionListController {
    /// Create a logged-out controller; nothing is fetched until
    /// [`set_authenticated`](Self::set_authenticated) is called with `true`
    pub fn new(gateway: GatewayRef, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            gateway,
            page_size,
            state: RwLock::new(ListState {
                view: ListView::new(page_size),
                latest_token: 0,
            }),
            logger: Arc::new(DefaultErrorLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Current view state
    pub async fn view(&self) -> ListView {
        self.state.read().await.view.clone()
    }

    /// Current filter state
    pub async fn filter(&self) -> FilterState {
        self.state.read().await.view.filter.clone()
    }

    // ==================== Authentication ====================

    /// Follow the external session state.
    ///
    /// Logging in fetches the first page. Logging out clears all view
    /// state and invalidates any fetch still in flight.
    pub async fn set_authenticated(&self, authenticated: bool) {
        let ticket = {
            let mut state = self.state.write().await;
            if authenticated == state.view.authenticated {
                return;
            }
            if authenticated {
                state.view.authenticated = true;
                self.begin_fetch(&mut state)
            } else {
                log::info!("Session ended, clearing transaction list");
                state.latest_token += 1;
                state.view = ListView::new(self.page_size);
                None
            }
        };

        if let Some(ticket) = ticket {
            self.run_fetch(ticket).await;
        }
    }

    // ==================== Intents ====================

    /// Update the search box text; does not fetch
    pub async fn set_search_input(&self, text: &str) {
        self.state.write().await.view.filter.set_search_input(text);
    }

    /// Apply the search box text and fetch page 1
    pub async fn commit_search(&self) {
        self.mutate_and_fetch(|f| f.commit_search()).await;
    }

    pub async fn set_category(&self, category: Option<Category>) {
        self.mutate_and_fetch(|f| f.set_category(category)).await;
    }

    pub async fn set_date_range(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.mutate_and_fetch(|f| f.set_date_range(from, to)).await;
    }

    pub async fn set_amount_range(&self, min: Option<Decimal>, max: Option<Decimal>) {
        self.mutate_and_fetch(|f| f.set_amount_range(min, max)).await;
    }

    pub async fn toggle_sort(&self, field: SortField) {
        self.mutate_and_fetch(|f| f.toggle_sort(field)).await;
    }

    pub async fn clear_filters(&self) {
        self.mutate_and_fetch(|f| f.clear()).await;
    }

    /// Move to page `n`. Returns false (and does nothing) when `n` is
    /// outside `1..=total_pages`.
    pub async fn go_to_page(&self, n: u64) -> bool {
        let ticket = {
            let mut state = self.state.write().await;
            if n < 1 || n > state.view.page.total_pages {
                log::debug!(
                    "Ignoring page {} outside 1..={}",
                    n,
                    state.view.page.total_pages
                );
                return false;
            }
            state.view.filter.set_page(n);
            self.begin_fetch(&mut state)
        };

        if let Some(ticket) = ticket {
            self.run_fetch(ticket).await;
        }
        true
    }

    /// Refetch with the current filter state unchanged
    pub async fn refresh(&self) {
        self.mutate_and_fetch(|_| {}).await;
    }

    // ==================== Mutations ====================

    /// Create one transaction, then refetch so the active sort, filters
    /// and page stay correct
    pub async fn create(&self, transaction: &NewTransaction) -> CoreResult<Transaction> {
        self.begin_mutation().await?;
        let result = self.gateway.create(transaction).await;
        self.finish_mutation(MutationKind::Create, result).await
    }

    /// Apply a partial update, then refetch
    pub async fn update(&self, id: TransactionId, patch: &TransactionPatch) -> CoreResult<Transaction> {
        self.begin_mutation().await?;
        let result = self.gateway.update(id, patch).await;
        self.finish_mutation(MutationKind::Update, result).await
    }

    /// Delete a transaction, then refetch
    pub async fn delete(&self, id: TransactionId) -> CoreResult<()> {
        self.begin_mutation().await?;
        let result = self.gateway.delete(id).await;
        self.finish_mutation(MutationKind::Delete, result).await
    }

    async fn begin_mutation(&self) -> CoreResult<()> {
        let mut state = self.state.write().await;
        if !state.view.authenticated {
            return Err(CoreError::NotAuthenticated);
        }
        state.view.mutation_error = None;
        Ok(())
    }

    async fn finish_mutation<T>(&self, kind: MutationKind, result: CoreResult<T>) -> CoreResult<T> {
        match result {
            Ok(value) => {
                self.refresh().await;
                Ok(value)
            }
            Err(e) => {
                self.logger.log_error(&e, &ErrorContext::new(&kind.to_string()));
                self.state.write().await.view.mutation_error =
                    Some(MutationFailure::from_error(kind, &e));
                Err(e)
            }
        }
    }

    // ==================== Fetching ====================

    async fn mutate_and_fetch<F>(&self, mutate: F)
    where
        F: FnOnce(&mut FilterState),
    {
        let ticket = {
            let mut state = self.state.write().await;
            mutate(&mut state.view.filter);
            self.begin_fetch(&mut state)
        };

        if let Some(ticket) = ticket {
            self.run_fetch(ticket).await;
        }
    }

    /// Take a new request token and mark the view as loading
    fn begin_fetch(&self, state: &mut ListState) -> Option<FetchTicket> {
        if !state.view.authenticated {
            log::debug!("Not authenticated, skipping fetch");
            return None;
        }

        state.latest_token += 1;
        state.view.loading = true;
        state.view.error = None;
        state.view.warning = None;

        Some(FetchTicket {
            token: state.latest_token,
            params: map_query(&state.view.filter, self.page_size),
        })
    }

    async fn run_fetch(&self, ticket: FetchTicket) {
        log::debug!(
            "Fetching transactions (request {}): {:?}",
            ticket.token,
            ticket.params
        );

        let result = self.gateway.list(&ticket.params).await;

        let mut state = self.state.write().await;
        if ticket.token != state.latest_token {
            log::debug!(
                "Discarding stale response for request {} (latest is {})",
                ticket.token,
                state.latest_token
            );
            return;
        }

        let context = ErrorContext::new("fetch_transactions").with_request_token(ticket.token);
        state.view.loading = false;

        match result {
            Ok(body) => {
                let normalized = normalize(&body, self.page_size);
                if let Some(warning) = normalized.warning() {
                    self.logger.log_warning(warning, &context);
                    state.view.warning = Some(warning.to_string());
                }
                state.view.page = normalized.into_page();
            }
            Err(CoreError::UnexpectedResponse { message }) => {
                self.logger.log_warning(&message, &context);
                state.view.warning = Some(message);
                state.view.page = PageResult::empty();
            }
            Err(e) => {
                self.logger.log_error(&e, &context);
                state.view.error = Some(e.to_string());
                state.view.page = PageResult::empty();
            }
        }
    }
}
