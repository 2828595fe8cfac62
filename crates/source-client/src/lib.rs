// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Collaborator traits for the NFT catalog
//!
//! The catalog composes data owned by systems it does not control. This crate
//! describes each of them as an async trait so the composition logic can be
//! exercised against real clients in production and in-memory doubles in tests.
//!
//! # Core Abstractions
//!
//! - **`IndexerClient`**: the remote blockchain indexer, queried by id sets or serie
//! - **`DocumentStore`**: the local document database holding curated NFT documents
//! - **`CategoryLookup`**: category code and id resolution
//! - **`CandidateSource`**: scoped sessions over the users taking part in a draw
//! - **`AssignmentSink`**: write-once output for distribution results
//! - **Error Handling**: a single [`SourceError`] type every collaborator reports through
//!
//! All operations return `impl Future + Send` so implementations can be plain
//! `async fn`s while the core stays generic over them.

use shared_types::{CategoryCode, CategoryId, NftId, PageResult, PaginationWindow};
use thiserror::Error;

pub mod health;
pub mod types;

pub use health::*;
pub use types::*;

/// Remote blockchain indexer
pub trait IndexerClient: Send + Sync {
    /// Check the health of the indexer
    ///
    /// # Errors
    ///
    /// Returns an error if the health probe itself could not be performed
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, SourceError>> + Send;

    /// Fetch full NFT nodes matching the query
    ///
    /// # Returns
    ///
    /// The matching nodes within the query window, plus the indexer's page flags and
    /// the total number of nodes matching the filter
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, a rejected query or an
    /// unparseable response
    fn query_nodes(
        &self,
        query: &NodeQuery,
    ) -> impl Future<Output = Result<PageResult<NftNode>, SourceError>> + Send;

    /// Fetch only the ids of the NFT nodes matching the query, in indexer order
    ///
    /// # Errors
    ///
    /// Same failure modes as [`IndexerClient::query_nodes`]
    fn query_ids(
        &self,
        query: &NodeQuery,
    ) -> impl Future<Output = Result<PageResult<NftId>, SourceError>> + Send;

    /// Get the name/identifier of this client
    fn name(&self) -> &'static str;
}

/// Local document database holding curated NFT documents
pub trait DocumentStore: Send + Sync {
    /// Find every document matching the filter
    fn find_documents(
        &self,
        filter: &DocumentFilter,
    ) -> impl Future<Output = Result<Vec<LocalNftDocument>, SourceError>> + Send;

    /// Find one page of documents matching the filter
    ///
    /// Documents are ordered by chain id so pages are stable across calls.
    fn find_documents_page(
        &self,
        filter: &DocumentFilter,
        window: PaginationWindow,
    ) -> impl Future<Output = Result<PageResult<LocalNftDocument>, SourceError>> + Send;

    /// Find the document stored for one NFT
    ///
    /// # Returns
    ///
    /// * `Ok(Some(document))` if the NFT has local data
    /// * `Ok(None)` if the store knows nothing about it
    fn find_document(
        &self,
        id: &NftId,
    ) -> impl Future<Output = Result<Option<LocalNftDocument>, SourceError>> + Send;
}

/// Category resolution
pub trait CategoryLookup: Send + Sync {
    /// Resolve a human code to its record, `Ok(None)` if no category carries it
    fn find_by_code(
        &self,
        code: &CategoryCode,
    ) -> impl Future<Output = Result<Option<CategoryRecord>, SourceError>> + Send;

    /// Resolve stored ids to records, silently skipping ids that match nothing
    fn find_by_ids(
        &self,
        ids: &[CategoryId],
    ) -> impl Future<Output = Result<Vec<CategoryRecord>, SourceError>> + Send;
}

/// Source of draw candidates, handing out scoped sessions
pub trait CandidateSource: Send + Sync {
    /// Session type returned by [`CandidateSource::open`]
    type Session: CandidateSession;

    /// Open a session; the caller owns it and must close it
    fn open(&self) -> impl Future<Output = Result<Self::Session, SourceError>> + Send;
}

/// An open connection to the candidate store
pub trait CandidateSession: Send {
    /// Every user eligible for a draw, in no particular order
    fn candidates(&self) -> impl Future<Output = Result<Vec<Candidate>, SourceError>> + Send;

    /// Release the session
    fn close(self) -> impl Future<Output = Result<(), SourceError>> + Send;
}

/// Write-once output for distribution results
pub trait AssignmentSink: Send + Sync {
    /// Persist an assignment, returning where it was written
    fn persist(
        &self,
        assignment: &DistributionAssignment,
    ) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// Common errors reported by every collaborator
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    /// Network timeout
    #[error("Request timeout after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// Service unavailable
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Invalid response format
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// The source rejected the query itself
    #[error("Query rejected: {message}")]
    Query { message: String },

    /// Local store failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// File system failure
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Client independent error
    #[error(transparent)]
    Custom { error: anyhow::Error },
}

impl SourceError {
    /// Create a storage error
    pub fn storage<T: ToString>(message: T) -> Self {
        Self::Storage {
            message: message.to_string(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response<T: ToString>(message: T) -> Self {
        Self::InvalidResponse {
            message: message.to_string(),
        }
    }

    /// Create a query error
    pub fn query<T: ToString>(message: T) -> Self {
        Self::Query {
            message: message.to_string(),
        }
    }

    /// Create an I/O error
    pub fn io<T: ToString>(message: T) -> Self {
        Self::Io {
            message: message.to_string(),
        }
    }

    /// Whether retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http { .. }
                | Self::Timeout { .. }
                | Self::RateLimitExceeded { .. }
                | Self::ServiceUnavailable { .. }
                | Self::Storage { .. }
        )
    }

    /// Whether the failure lies in what was asked rather than in reaching the source
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Query { .. } | Self::Configuration { .. })
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse {
            message: err.to_string(),
        }
    }
}
