//! HTTP client for the semantic query API.
//!
//! `load` and `sql` use GET with the query URL-encoded in a `query`
//! parameter; `batch`, `dry-run` and `explain` use POST with JSON bodies.
//! Mode queries post their single mode-keyed object to the load endpoint.
//!
//! Responses to `load` come in two shapes depending on server version: a
//! flat `{data, annotation, cache?}` object or a nested
//! `{results: [{data, annotation, cache?}, ...]}`. Both are accepted; this
//! is a documented compatibility quirk, not something to optimize away.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ApiSettings, SettingsError};
use crate::metadata::{FieldMeta, MetaProvider, MetaSnapshot};
use crate::model::{CompiledQuery, ModeQuery};

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur talking to the query API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response contained no result")]
    Empty,

    #[error("invalid api configuration: {0}")]
    Config(#[from] SettingsError),
}

/// One query's result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<Value>,
}

/// A load response in either of its two wire shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LoadResponse {
    Nested { results: Vec<QueryResult> },
    Flat(QueryResult),
}

impl LoadResponse {
    fn into_first(self) -> ApiResult<QueryResult> {
        match self {
            LoadResponse::Flat(result) => Ok(result),
            LoadResponse::Nested { results } => results.into_iter().next().ok_or(ApiError::Empty),
        }
    }
}

/// Batch request body.
#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub queries: &'a [CompiledQuery],
}

/// One positional entry of a batch response.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub annotation: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Batch response: entries aligned positionally with the request array.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchEntry>,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    fields: Vec<FieldMeta>,
}

/// Client for the semantic query API.
#[derive(Debug, Clone)]
pub struct QueryApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl QueryApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Build a client from [`ApiSettings`]: the base URL with environment
    /// variables expanded and the configured request timeout applied.
    pub fn from_settings(settings: &ApiSettings) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: settings.resolved_base_url()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// GET an endpoint with the query URL-encoded in a `query` parameter.
    async fn get_with_query(&self, path: &str, query: &CompiledQuery) -> ApiResult<String> {
        let encoded = urlencoding::encode(&serde_json::to_string(query)?).into_owned();
        let url = format!("{}?query={}", self.url(path), encoded);
        let response = self.http.get(&url).send().await?;
        Self::read_body(response).await
    }

    /// POST a JSON body to an endpoint.
    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<String> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::read_body(response).await
    }

    async fn read_body(response: reqwest::Response) -> ApiResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }

    /// Execute one flat query.
    pub async fn load(&self, query: &CompiledQuery) -> ApiResult<QueryResult> {
        let body = self.get_with_query("load", query).await?;
        serde_json::from_str::<LoadResponse>(&body)?.into_first()
    }

    /// Fetch the SQL the server would generate for a query.
    pub async fn sql(&self, query: &CompiledQuery) -> ApiResult<Value> {
        let body = self.get_with_query("sql", query).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Execute a batch of queries in one round trip.
    pub async fn batch(&self, queries: &[CompiledQuery]) -> ApiResult<BatchResponse> {
        let body = self.post_json("batch", &BatchRequest { queries }).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Validate a query server-side without executing it.
    pub async fn dry_run(&self, query: &CompiledQuery) -> ApiResult<Value> {
        let body = self.post_json("dry-run", query).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the server's execution plan for a query.
    pub async fn explain(&self, query: &CompiledQuery) -> ApiResult<Value> {
        let body = self.post_json("explain", query).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Execute a funnel/flow/retention query.
    pub async fn load_mode(&self, query: &ModeQuery) -> ApiResult<QueryResult> {
        let body = self.post_json("load", query).await?;
        serde_json::from_str::<LoadResponse>(&body)?.into_first()
    }

    /// Fetch field metadata.
    pub async fn meta(&self) -> ApiResult<MetaSnapshot> {
        let response = self.http.get(self.url("meta")).send().await?;
        let body = Self::read_body(response).await?;
        let meta: MetaResponse = serde_json::from_str(&body)?;
        Ok(MetaSnapshot::from_fields(meta.fields))
    }
}

#[async_trait::async_trait]
impl MetaProvider for QueryApiClient {
    async fn meta(&self) -> ApiResult<MetaSnapshot> {
        QueryApiClient::meta(self).await
    }
}
