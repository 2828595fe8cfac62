// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Data exchanged with the indexer, the local store and the output sink

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{BoolFromInt, PickFirst, serde_as};
use shared_types::{CategoryCode, CategoryId, IndexerWindow, NftId, SerieId, UserId};

/// Raw NFT as returned by the indexer
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftNode {
    /// Blockchain id
    pub id: NftId,
    /// Serie the NFT was minted in (`"0"` when standalone)
    #[serde(default)]
    pub serie_id: SerieId,
    /// Current owner address
    pub owner: String,
    /// Creator address
    pub creator: String,
    /// Whether the NFT is currently offered for sale (0/1 from the indexer, a bool once re-serialized)
    #[serde_as(deserialize_as = "PickFirst<(_, BoolFromInt)>")]
    #[serde(default)]
    pub listed: bool,
    /// Sale price in the chain's smallest unit
    #[serde(default)]
    pub price: Option<String>,
    /// Marketplace the NFT is listed on
    #[serde(default)]
    pub marketplace_id: Option<String>,
    /// IPFS hash of the NFT content
    #[serde(default)]
    pub nft_ipfs: Option<String>,
    /// Mint timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Which NFTs an indexer query selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFilter {
    /// Exactly these ids
    Include(Vec<NftId>),
    /// Everything except these ids; an empty list means no restriction
    Exclude(Vec<NftId>),
    /// Every member of a serie
    Serie(SerieId),
}

/// A parameterized indexer query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeQuery {
    /// Id-space filter
    pub filter: IdFilter,
    /// Restrict to listed (`Some(true)`) or unlisted (`Some(false)`) NFTs
    pub listed: Option<bool>,
    /// Indexer-side window, `None` for the whole result
    pub window: Option<IndexerWindow>,
}

impl NodeQuery {
    /// Query exactly the given ids
    pub fn include(ids: Vec<NftId>) -> Self {
        Self::from_filter(IdFilter::Include(ids))
    }

    /// Query everything except the given ids
    pub fn exclude(ids: Vec<NftId>) -> Self {
        Self::from_filter(IdFilter::Exclude(ids))
    }

    /// Query every member of a serie
    pub fn serie(serie_id: SerieId) -> Self {
        Self::from_filter(IdFilter::Serie(serie_id))
    }

    fn from_filter(filter: IdFilter) -> Self {
        Self {
            filter,
            listed: None,
            window: None,
        }
    }

    /// Add a listed status filter
    #[must_use]
    pub fn with_listed(mut self, listed: Option<bool>) -> Self {
        self.listed = listed;
        self
    }

    /// Add an indexer-side window
    #[must_use]
    pub fn with_window(mut self, window: Option<IndexerWindow>) -> Self {
        self.window = window;
        self
    }
}

/// Category as curated in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    /// Stored identifier
    pub id: CategoryId,
    /// Human code
    pub code: CategoryCode,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Locally stored document for one NFT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalNftDocument {
    /// Blockchain id of the NFT this document describes
    pub chain_id: NftId,
    /// Categories the NFT has been curated into
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    /// Number of times the NFT has been viewed
    #[serde(default)]
    pub views_count: u64,
    /// Free-form curated attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl LocalNftDocument {
    /// Whether at least one category is assigned
    pub fn is_categorized(&self) -> bool {
        !self.categories.is_empty()
    }
}

/// Filter over local NFT documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Documents with a non-empty category list
    Categorized,
    /// Documents assigned to any of the given categories
    InCategories(Vec<CategoryId>),
}

impl DocumentFilter {
    /// Evaluate the filter against one document
    pub fn matches(&self, document: &LocalNftDocument) -> bool {
        match self {
            Self::Categorized => document.is_categorized(),
            Self::InCategories(ids) => document.categories.iter().any(|c| ids.contains(c)),
        }
    }
}

/// A user eligible for a draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// User identifier
    pub user_id: UserId,
    /// Ranking score, higher ranks first
    pub score: u64,
    /// When the user became available, earlier ranks first among equal scores
    pub available_at: DateTime<Utc>,
}

/// One prize of a draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentEntry {
    /// NFT won
    pub nft_id: NftId,
    /// Winning user
    pub user_id: UserId,
}

/// Result of a draw over one serie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionAssignment {
    /// Serie whose members were distributed
    pub serie_id: SerieId,
    /// When the draw happened
    pub drawn_at: DateTime<Utc>,
    /// Prizes in serie-member order
    pub entries: Vec<AssignmentEntry>,
    /// Serie members left without a winner
    #[serde(default)]
    pub unassigned: Vec<NftId>,
}

impl DistributionAssignment {
    /// Winner of a given NFT, if any
    pub fn winner_of(&self, nft_id: &NftId) -> Option<&UserId> {
        self.entries
            .iter()
            .find(|entry| &entry.nft_id == nft_id)
            .map(|entry| &entry.user_id)
    }

    /// Number of NFTs that found a winner
    pub fn assigned_count(&self) -> usize {
        self.entries.len()
    }
}
