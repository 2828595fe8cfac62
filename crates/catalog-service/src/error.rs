// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! Errors raised while configuring, wiring and running the service.

use data_sources::GraphQlError;
use nft_catalog::CatalogError;
use source_client::SourceError;
use thiserror::Error;

/// Error types for service operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Indexer client could not be built
    #[error("Indexer client error: {source}")]
    Indexer {
        /// Underlying client error
        #[from]
        source: GraphQlError,
    },

    /// Local store could not be opened
    #[error("Local store error: {source}")]
    Store {
        /// Underlying store error
        #[from]
        source: SourceError,
    },

    /// A catalog or distribution operation failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The operation was cancelled by a shutdown signal
    #[error("Operation cancelled before completion")]
    Cancelled,
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use nft_catalog::FailureKind;

    use super::*;

    #[test]
    fn catalog_errors_pass_through() {
        let error: ServiceError = CatalogError::validation("limit must be between 1 and 100").into();
        assert_eq!(
            error.to_string(),
            "could not get NFTs: limit must be between 1 and 100"
        );
        assert!(matches!(
            error,
            ServiceError::Catalog(ref inner) if inner.kind() == FailureKind::InvalidInput
        ));
    }

    #[test]
    fn store_errors_are_wrapped() {
        let error: ServiceError = SourceError::io("could not read snapshot").into();
        assert_eq!(
            error.to_string(),
            "Local store error: I/O error: could not read snapshot"
        );
    }
}
