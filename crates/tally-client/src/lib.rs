//! HTTP gateway to the transactions API
//!
//! Endpoints are joined onto the configured base URL:
//! - `transactions/` list (GET) and create (POST, single object or array)
//! - `transactions/{id}/` partial update (PATCH) and delete (DELETE)
//! - `analysis/` monthly analysis report (GET)

pub mod error;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Client, Method, Request, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tally_config::Config;
use tally_core::{
    CoreResult, NewTransaction, RequestParams, Transaction, TransactionGateway, TransactionId,
    TransactionPatch,
};

pub use error::{ApiError, ApiResult};

const TRANSACTIONS_PATH: &str = "transactions/";
const ANALYSIS_PATH: &str = "analysis/";

/// Encode parameters as an `application/x-www-form-urlencoded` query string
pub fn encode_query<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    params
        .into_iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `TransactionGateway` over plain HTTP
pub struct HttpGateway {
    client: Client<HttpConnector>,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Self {
            client: Client::new(),
            base_url,
            token,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.api.base_url,
            config.api.token.clone(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the analysis report for a month.
    ///
    /// The report body is passed through untouched; on failure
    /// [`ApiError::user_message`] gives the text to display.
    pub async fn analysis(&self, year: i32, month: u32) -> ApiResult<Value> {
        let year = year.to_string();
        let month = month.to_string();
        let uri = self.uri(
            ANALYSIS_PATH,
            &encode_query([("year", year.as_str()), ("month", month.as_str())]),
        )?;
        let body = self.send(Method::GET, uri, None).await?;
        decode(&body)
    }

    fn uri(&self, path: &str, query: &str) -> ApiResult<Uri> {
        let mut url = format!("{}{}", self.base_url, path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        url.parse::<Uri>().map_err(|_| ApiError::InvalidUri { url })
    }

    fn detail_uri(&self, id: TransactionId) -> ApiResult<Uri> {
        self.uri(&format!("{}{}/", TRANSACTIONS_PATH, id), "")
    }

    /// Send one request and return the body of a 2xx response
    async fn send(&self, method: Method, uri: Uri, payload: Option<Vec<u8>>) -> ApiResult<Bytes> {
        log::debug!("{} {}", method, uri);

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match payload {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };
        let request = builder.body(body).map_err(|e| ApiError::Encode {
            message: e.to_string(),
        })?;

        let exchange = async {
            let response = self.client.request(request).await?;
            let status = response.status();
            let bytes = hyper::body::to_bytes(response.into_body()).await?;
            Ok::<_, ApiError>((status, bytes))
        };

        let (status, bytes) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ApiError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        check_status(status, bytes)
    }

    async fn send_json<T: Serialize + ?Sized>(&self, method: Method, uri: Uri, payload: &T) -> ApiResult<Bytes> {
        let bytes = serde_json::to_vec(payload).map_err(|e| ApiError::Encode {
            message: e.to_string(),
        })?;
        self.send(method, uri, Some(bytes)).await
    }
}

fn check_status(status: StatusCode, bytes: Bytes) -> ApiResult<Bytes> {
    if status.is_success() {
        return Ok(bytes);
    }

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    log::debug!("Request failed with {}: {}", status, body);

    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

fn decode<T: DeserializeOwned>(bytes: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode {
        message: e.to_string(),
    })
}

#[async_trait]
impl TransactionGateway for HttpGateway {
    async fn list(&self, params: &RequestParams) -> CoreResult<Value> {
        let uri = self.uri(TRANSACTIONS_PATH, &encode_query(params.iter()))?;
        let body = self.send(Method::GET, uri, None).await?;
        Ok(decode(&body)?)
    }

    async fn create(&self, transaction: &NewTransaction) -> CoreResult<Transaction> {
        let uri = self.uri(TRANSACTIONS_PATH, "")?;
        let body = self.send_json(Method::POST, uri, transaction).await?;
        Ok(decode(&body)?)
    }

    async fn create_many(&self, transactions: &[NewTransaction]) -> CoreResult<Vec<Transaction>> {
        let uri = self.uri(TRANSACTIONS_PATH, "")?;
        let body = self.send_json(Method::POST, uri, transactions).await?;
        Ok(decode(&body)?)
    }

    async fn update(&self, id: TransactionId, patch: &TransactionPatch) -> CoreResult<Transaction> {
        let result: ApiResult<Transaction> = async {
            let uri = self.detail_uri(id)?;
            let body = self.send_json(Method::PATCH, uri, patch).await?;
            decode(&body)
        }
        .await;
        result.map_err(|e| e.into_core(Some(id)))
    }

    async fn delete(&self, id: TransactionId) -> CoreResult<()> {
        let result: ApiResult<()> = async {
            let uri = self.detail_uri(id)?;
            self.send(Method::DELETE, uri, None).await.map(|_| ())
        }
        .await;
        result.map_err(|e| e.into_core(Some(id)))
    }
}
