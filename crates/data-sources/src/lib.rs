// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Concrete collaborators for the NFT catalog
//!
//! # Architecture
//!
//! - **Indexer**: [`graphql::GraphQlIndexerClient`] issues the documents built by [`queries`]
//! - **Local store**: [`memory::MemoryStore`] serves documents, categories and draw candidates
//!   from a JSON snapshot
//! - **Caching**: [`category_cache::CachedCategoryLookup`] fronts any category lookup
//! - **Output**: [`sink::JsonFileSink`] writes distribution results to dated files
//!
//! Every type here implements a trait from `source_client` and reports failures
//! through `SourceError`.

pub mod category_cache;
pub mod graphql;
pub mod memory;
pub mod queries;
pub mod sink;

pub use category_cache::{CachedCategoryLookup, CategoryCacheStats};
pub use graphql::{GraphQlError, GraphQlIndexerClient, IndexerConfig};
pub use memory::{MemorySession, MemoryStore, StoreSnapshot};
pub use sink::JsonFileSink;
