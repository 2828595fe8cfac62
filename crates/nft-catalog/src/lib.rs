// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! NFT listings and serie distribution over an indexer and a local store
//!
//! The indexer owns on-chain NFT data; the local store owns curated data such as
//! categories and view counts. This crate composes the two into listings and runs
//! ranked distributions of a serie's NFTs.
//!
//! # Architecture
//!
//! - [`grouping`]: collapses nodes sharing a serie into one logical NFT
//! - [`population`]: enriches grouped NFTs with local data, bounded fan-out
//! - [`id_set`]: include-only, exclude-only and serie queries on the indexer
//! - [`categories`]: turns category selections into indexer id sets
//! - [`listing`]: [`NftCatalog`], the listing operations and pagination authority
//! - [`distribution`]: [`DistributionEngine`], ranked draws
//! - [`config`]: behaviour settings
//! - [`metrics`]: Prometheus metrics
//! - [`error`]: error types and failure classification
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use data_sources::{GraphQlIndexerClient, IndexerConfig, MemoryStore};
//! use nft_catalog::{CatalogSettings, CategorySelection, NftCatalog};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let indexer = Arc::new(GraphQlIndexerClient::new(IndexerConfig::new(
//!     "https://indexer.example.com/graphql",
//! )?)?);
//! let store = Arc::new(MemoryStore::load("catalog-snapshot.json").await?);
//!
//! let catalog = NftCatalog::new(indexer, Arc::clone(&store), store, CatalogSettings::default())?;
//! let listing = catalog
//!     .get_by_categories_paginated(&CategorySelection::Uncategorized, Some(true), 1, 20)
//!     .await?;
//!
//! println!("{} of {}", listing.nfts.data.len(), listing.nfts.total_count);
//! # Ok(())
//! # }
//! ```

pub mod categories;
pub mod config;
pub mod distribution;
pub mod error;
pub mod grouping;
pub mod id_set;
pub mod listing;
pub mod metrics;
pub mod population;
pub mod types;

pub use categories::{CategoryResolver, IdSet, LocalPage, ResolvedSelection};
pub use config::{
    CatalogSettings, DistributionSettings, ShortfallPolicy, UnresolvedCategoryPolicy,
};
pub use distribution::{DistributionEngine, pair, rank_candidates};
pub use error::{CatalogError, CatalogResult, FailureKind};
pub use grouping::group_by_serie;
pub use listing::NftCatalog;
pub use population::{populate_all, populate_one};
pub use types::{
    CategoryListing, CategoryResolution, CategorySelection, DistributionOutcome,
    DistributionRequest, GroupedNft, PageAuthority, PopulatedNft, SerieMember, SerieSummary,
};
