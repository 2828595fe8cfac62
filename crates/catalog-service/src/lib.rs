// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! NFT catalog service
//!
//! Loads layered configuration, wires the indexer client, the snapshot-backed
//! local store, the category cache and the distribution sink into an
//! [`nft_catalog::NftCatalog`] and an [`nft_catalog::DistributionEngine`], and
//! runs configured draws with coordinated cancellation.

pub mod config;
pub mod error;
pub mod service;

pub use config::{
    CategoryCacheSettings, DrawSettings, Environment, IndexerSettings, ServiceConfig,
    StoreSettings, TimeoutSeconds,
};
pub use error::{ServiceError, ServiceResult};
pub use service::{Catalog, CatalogService, Engine};
