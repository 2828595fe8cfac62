// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Indexer client speaking GraphQL over HTTP
//!
//! Every listing goes through the `nftEntities` connection. Requests are
//! retried with exponential backoff on transport failures and on 408, 429 and
//! 5xx statuses; anything else is reported straight away.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use shared_types::{NftId, PageInfo, PageResult};
use source_client::{HealthStatus, IndexerClient, NftNode, NodeQuery, SourceError};
use thiserror::Error;
use tokio::time::timeout;
use tokio_retry::{
    RetryIf,
    strategy::{ExponentialBackoff, jitter},
};
use tracing::{Span, debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::queries::{self, GraphQlRequest, Selection};

const DEFAULT_INDEXER_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_INDEXER_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_INDEXER_MAX_RETRIES: u32 = 3;
const RETRY_BASE_MILLIS: u64 = 10;
const RETRY_MAX_DELAY_SECONDS: u64 = 2;
const RATE_LIMIT_RETRY_AFTER_SECONDS: u64 = 60;

/// Configuration for the indexer client
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// GraphQL endpoint
    pub endpoint: Url,
    /// Per-attempt request timeout in seconds
    pub timeout_seconds: u64,
    /// Health probe timeout in seconds
    pub health_check_timeout_seconds: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
}

impl IndexerConfig {
    /// Create a configuration with default timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an absolute http(s) URL
    pub fn new(endpoint: &str) -> Result<Self, GraphQlError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| GraphQlError::Config(format!("invalid indexer endpoint: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(GraphQlError::Config(format!(
                "indexer endpoint must use http or https, got {}",
                endpoint.scheme()
            )));
        }
        Ok(Self {
            endpoint,
            timeout_seconds: DEFAULT_INDEXER_TIMEOUT_SECONDS,
            health_check_timeout_seconds: DEFAULT_INDEXER_HEALTH_CHECK_TIMEOUT_SECONDS,
            max_retries: DEFAULT_INDEXER_MAX_RETRIES,
        })
    }

    /// Override the request timeout
    #[must_use]
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Override the health probe timeout
    #[must_use]
    pub fn with_health_check_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.health_check_timeout_seconds = timeout_seconds;
        self
    }

    /// Override the retry budget
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Errors specific to the GraphQL indexer client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum GraphQlError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Indexer answered with an unexpected status
    #[error("Indexer error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Timeout error
    #[error("Request timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The indexer reported GraphQL errors
    #[error("GraphQL query error: {0}")]
    Query(String),

    /// Successful response without a `data` member
    #[error("GraphQL response carried no data")]
    MissingData,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraphQlError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => should_retry_status(*status),
            Self::Json(_) | Self::Query(_) | Self::MissingData | Self::Config(_) => false,
        }
    }
}

impl From<GraphQlError> for SourceError {
    fn from(value: GraphQlError) -> Self {
        match value {
            GraphQlError::Http(error) => SourceError::Http {
                message: error.to_string(),
            },
            GraphQlError::Json(error) => SourceError::InvalidResponse {
                message: error.to_string(),
            },
            GraphQlError::Status { status: 429, .. } => SourceError::RateLimitExceeded {
                retry_after_seconds: RATE_LIMIT_RETRY_AFTER_SECONDS,
            },
            GraphQlError::Status { status, message } if status >= 500 || status == 408 => {
                SourceError::ServiceUnavailable {
                    message: format!("{status}: {message}"),
                }
            }
            GraphQlError::Status { status, message } => SourceError::Query {
                message: format!("{status}: {message}"),
            },
            GraphQlError::Timeout { seconds } => SourceError::Timeout {
                timeout_seconds: seconds,
            },
            GraphQlError::Query(message) => SourceError::Query { message },
            GraphQlError::MissingData => SourceError::InvalidResponse {
                message: GraphQlError::MissingData.to_string(),
            },
            GraphQlError::Config(message) => SourceError::Configuration { message },
        }
    }
}

/// Determine if an HTTP status code should trigger a retry
fn should_retry_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NftEntitiesData<N> {
    nft_entities: Connection<N>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<N> {
    total_count: u64,
    page_info: ConnectionPageInfo,
    nodes: Vec<N>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionPageInfo {
    has_next_page: bool,
    has_previous_page: bool,
}

#[derive(Debug, Deserialize)]
struct IdNode {
    id: NftId,
}

impl<N> From<Connection<N>> for PageResult<N> {
    fn from(connection: Connection<N>) -> Self {
        PageResult::new(
            connection.nodes,
            PageInfo {
                has_next_page: connection.page_info.has_next_page,
                has_previous_page: connection.page_info.has_previous_page,
                total_count: connection.total_count,
            },
        )
    }
}

/// Indexer client over a GraphQL HTTP endpoint
#[derive(Debug)]
pub struct GraphQlIndexerClient {
    client: Client,
    config: IndexerConfig,
}

impl GraphQlIndexerClient {
    /// Create a new indexer client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: IndexerConfig) -> Result<Self, GraphQlError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("nft-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GraphQlError::Http)?;

        Ok(Self { client, config })
    }

    /// Run a `nftEntities` query and decode its connection
    ///
    /// `operation` names the query in the span and in failure logs.
    #[instrument(skip_all, fields(operation, request_id))]
    async fn execute<N: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: &GraphQlRequest,
    ) -> Result<Connection<N>, GraphQlError> {
        let request_id = Uuid::new_v4();
        let span = Span::current();
        span.record("operation", operation);
        span.record("request_id", request_id.to_string());

        debug!(query = %request.query, variables = ?request.variables, "executing indexer query");

        let start_time = Instant::now();
        let response = self.send_with_retry(request, request_id).await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(
            status = status.as_u16(),
            duration_ms = start_time.elapsed().as_millis(),
            "indexer query completed"
        );

        if !status.is_success() {
            return Err(Self::error_from_body(status, &body));
        }

        let parsed: GraphQlResponse<NftEntitiesData<N>> = serde_json::from_str(&body)?;
        if !parsed.errors.is_empty() {
            let message = join_messages(&parsed.errors);
            warn!(operation, error = %message, "indexer rejected query");
            return Err(GraphQlError::Query(message));
        }

        parsed
            .data
            .map(|data| data.nft_entities)
            .ok_or(GraphQlError::MissingData)
    }

    /// POST the request, retrying transient failures
    async fn send_with_retry(
        &self,
        request: &GraphQlRequest,
        request_id: Uuid,
    ) -> Result<reqwest::Response, GraphQlError> {
        let retry_strategy = ExponentialBackoff::from_millis(RETRY_BASE_MILLIS)
            .max_delay(Duration::from_secs(RETRY_MAX_DELAY_SECONDS))
            .map(jitter)
            .take(self.config.max_retries as usize);

        let timeout_seconds = self.config.timeout_seconds;

        RetryIf::spawn(
            retry_strategy,
            || async move {
                debug!(request_id = %request_id, endpoint = %self.config.endpoint, "making indexer request attempt");

                let response = timeout(
                    Duration::from_secs(timeout_seconds),
                    self.client
                        .post(self.config.endpoint.clone())
                        .json(request)
                        .send(),
                )
                .await
                .map_err(|_| GraphQlError::Timeout {
                    seconds: timeout_seconds,
                })??;

                let status = response.status();
                if should_retry_status(status.as_u16()) {
                    warn!(
                        request_id = %request_id,
                        status = status.as_u16(),
                        "indexer request failed with retryable status"
                    );
                    let message = response.text().await.unwrap_or_default();
                    return Err(GraphQlError::Status {
                        status: status.as_u16(),
                        message,
                    });
                }

                Ok(response)
            },
            GraphQlError::is_retryable,
        )
        .await
    }

    /// Build an error for a non-success response, preferring GraphQL error messages
    fn error_from_body(status: StatusCode, body: &str) -> GraphQlError {
        if let Ok(parsed) = serde_json::from_str::<GraphQlResponse<serde_json::Value>>(body)
            && !parsed.errors.is_empty()
        {
            return GraphQlError::Query(join_messages(&parsed.errors));
        }
        error!(status = status.as_u16(), body, "indexer returned an error status");
        GraphQlError::Status {
            status: status.as_u16(),
            message: body.to_string(),
        }
    }
}

fn join_messages(errors: &[GraphQlErrorMessage]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl IndexerClient for GraphQlIndexerClient {
    async fn health_check(&self) -> Result<HealthStatus, SourceError> {
        let probe = queries::health_probe();
        debug!(query = %probe.query, "performing health check on indexer");

        let start_time = Instant::now();
        let response = timeout(
            Duration::from_secs(self.config.health_check_timeout_seconds),
            self.client
                .post(self.config.endpoint.clone())
                .json(&probe)
                .send(),
        )
        .await
        .map_err(|_| GraphQlError::Timeout {
            seconds: self.config.health_check_timeout_seconds,
        })?
        .map_err(GraphQlError::Http)?;

        let response_time = start_time.elapsed();
        let status = response.status();

        if status != StatusCode::OK {
            warn!("indexer health check failed with status: {}", status);
            return Ok(HealthStatus::Degraded {
                reason: format!("Indexer returned status {}", status.as_u16()),
            });
        }

        let body = response.text().await.map_err(GraphQlError::Http)?;
        match serde_json::from_str::<GraphQlResponse<serde_json::Value>>(&body) {
            Ok(parsed) if parsed.errors.is_empty() && parsed.data.is_some() => {
                info!("indexer health check passed in {:?}", response_time);
                Ok(HealthStatus::Up)
            }
            Ok(parsed) => Ok(HealthStatus::Degraded {
                reason: format!("Indexer probe failed: {}", join_messages(&parsed.errors)),
            }),
            Err(e) => Ok(HealthStatus::Degraded {
                reason: format!("Indexer probe returned malformed JSON: {e}"),
            }),
        }
    }

    async fn query_nodes(&self, query: &NodeQuery) -> Result<PageResult<NftNode>, SourceError> {
        let request = queries::build(query, Selection::Nodes);
        match self.execute::<NftNode>("query_nodes", &request).await {
            Ok(connection) => Ok(connection.into()),
            Err(e) => {
                error!(error = %e, "failed to fetch NFT nodes from indexer");
                Err(e.into())
            }
        }
    }

    async fn query_ids(&self, query: &NodeQuery) -> Result<PageResult<NftId>, SourceError> {
        let request = queries::build(query, Selection::Ids);
        match self.execute::<IdNode>("query_ids", &request).await {
            Ok(connection) => Ok(PageResult::from(connection).map(|node| node.id)),
            Err(e) => {
                error!(error = %e, "failed to fetch NFT ids from indexer");
                Err(e.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "graphql-indexer"
    }
}
