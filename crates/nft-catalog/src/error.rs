// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for catalog and distribution operations
//!
//! Listing failures read "could not get NFTs" and distribution failures read
//! "could not get NFT distribution", but the upstream cause is always kept as
//! the error source and classified through [`CatalogError::kind`].

use shared_types::{CategoryCode, IdError, PaginationError, SerieId};
use source_client::SourceError;
use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Coarse failure classes callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Indexer or store unreachable, overloaded or timing out
    UpstreamUnavailable,
    /// The query itself was rejected
    MalformedQuery,
    /// An upstream answered with something unreadable
    InvalidResponse,
    /// A referenced entity does not exist
    MissingEntity,
    /// Not enough of a resource to complete the operation
    ResourceExhausted,
    /// Caller input was invalid
    InvalidInput,
}

/// Errors raised by catalog and distribution operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An indexer or local store call failed
    #[error("could not get NFTs: {operation} failed: {source}")]
    Upstream {
        /// Operation that issued the failing call
        operation: &'static str,
        /// Original collaborator error
        source: SourceError,
    },

    /// Caller input was rejected before any call was made
    #[error("could not get NFTs: {message}")]
    Validation {
        /// What was wrong
        message: String,
    },

    /// Category codes matched no category and the policy rejects them
    #[error("could not get NFTs: unknown category codes: {}", join_codes(.codes))]
    UnresolvedCategories {
        /// Codes that matched nothing
        codes: Vec<CategoryCode>,
    },

    /// Fewer ranked users than serie members under the failing shortfall policy
    #[error("{available} eligible users for {required} NFTs")]
    InsufficientCandidates {
        /// Serie members to assign
        required: usize,
        /// Ranked users available
        available: usize,
    },

    /// A draw failed at any stage
    #[error("could not get NFT distribution for serie {serie_id}: {source}")]
    Distribution {
        /// Serie being distributed
        serie_id: SerieId,
        /// Failure of the stage that stopped the draw
        source: Box<CatalogError>,
    },
}

fn join_codes(codes: &[CategoryCode]) -> String {
    codes
        .iter()
        .map(CategoryCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl CatalogError {
    /// Wrap a collaborator failure
    pub fn upstream(operation: &'static str, source: SourceError) -> Self {
        Self::Upstream { operation, source }
    }

    /// Create a validation error
    pub fn validation<T: ToString>(message: T) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    /// Wrap any error raised during a draw
    pub fn distribution(serie_id: SerieId, source: CatalogError) -> Self {
        Self::Distribution {
            serie_id,
            source: Box::new(source),
        }
    }

    /// Failure class of this error, looking through distribution wrapping
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Upstream { source, .. } => match source {
                SourceError::Http { .. }
                | SourceError::Timeout { .. }
                | SourceError::RateLimitExceeded { .. }
                | SourceError::ServiceUnavailable { .. }
                | SourceError::Storage { .. }
                | SourceError::Io { .. } => FailureKind::UpstreamUnavailable,
                SourceError::Query { .. } | SourceError::Configuration { .. } => {
                    FailureKind::MalformedQuery
                }
                SourceError::InvalidResponse { .. } | SourceError::Custom { .. } => {
                    FailureKind::InvalidResponse
                }
            },
            Self::Validation { .. } => FailureKind::InvalidInput,
            Self::UnresolvedCategories { .. } => FailureKind::MissingEntity,
            Self::InsufficientCandidates { .. } => FailureKind::ResourceExhausted,
            Self::Distribution { source, .. } => source.kind(),
        }
    }

    /// Whether retrying the same operation later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Upstream { source, .. } => source.is_transient(),
            Self::Distribution { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// The collaborator error at the root of this failure, if any
    pub fn upstream_cause(&self) -> Option<&SourceError> {
        match self {
            Self::Upstream { source, .. } => Some(source),
            Self::Distribution { source, .. } => source.upstream_cause(),
            _ => None,
        }
    }
}

impl From<PaginationError> for CatalogError {
    fn from(err: PaginationError) -> Self {
        Self::validation(err)
    }
}

impl From<IdError> for CatalogError {
    fn from(err: IdError) -> Self {
        Self::validation(err)
    }
}
