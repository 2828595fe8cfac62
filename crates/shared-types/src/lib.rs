// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the NFT catalog
//!
//! This crate provides the identifier newtypes and pagination primitives that are
//! shared by the source clients, the catalog core and the service binary, avoiding
//! circular dependencies between them.

pub mod ids;
pub mod pagination;

pub use ids::{CategoryCode, CategoryId, IdError, NftId, SerieId, UserId};
pub use pagination::{
    DEFAULT_MAX_PAGE_LIMIT, IndexerWindow, PageInfo, PageResult, PaginationError, PaginationWindow,
};
