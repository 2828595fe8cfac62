// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Catalog data types
//!
//! Shapes built on top of the raw indexer nodes: grouped NFTs, populated NFTs,
//! category selections and their resolution, and distribution requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::{CategoryCode, NftId, PageInfo, SerieId, UserId};
use source_client::{CategoryRecord, DistributionAssignment, NftNode};

/// One member of a serie, as seen from the grouped NFT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerieMember {
    /// Blockchain id
    pub id: NftId,
    /// Current owner
    pub owner: String,
    /// Whether the member is for sale
    pub listed: bool,
    /// Sale price, if listed
    pub price: Option<String>,
}

impl From<&NftNode> for SerieMember {
    fn from(node: &NftNode) -> Self {
        Self {
            id: node.id.clone(),
            owner: node.owner.clone(),
            listed: node.listed,
            price: node.price.clone(),
        }
    }
}

/// Serie-level fields aggregated over a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerieSummary {
    /// Number of members in the batch
    pub total_nft: usize,
    /// Number of listed members in the batch
    pub total_listed_nft: usize,
    /// Members in batch order
    pub serie_members: Vec<SerieMember>,
}

/// A logical NFT: the first node of a serie plus the serie's aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedNft {
    /// Representative node, per-instance fields untouched
    #[serde(flatten)]
    pub nft: NftNode,
    /// Aggregates over every node sharing the serie id
    #[serde(flatten)]
    pub serie: SerieSummary,
}

impl GroupedNft {
    /// Start a group from its first node
    pub fn seed(node: NftNode) -> Self {
        let serie = SerieSummary {
            total_nft: 1,
            total_listed_nft: usize::from(node.listed),
            serie_members: vec![SerieMember::from(&node)],
        };
        Self { nft: node, serie }
    }

    /// Add another node of the same serie
    pub fn absorb(&mut self, node: &NftNode) {
        self.serie.total_nft += 1;
        self.serie.total_listed_nft += usize::from(node.listed);
        self.serie.serie_members.push(SerieMember::from(node));
    }

    /// Id of the representative node
    pub fn id(&self) -> &NftId {
        &self.nft.id
    }

    /// Serie the group stands for
    pub fn serie_id(&self) -> &SerieId {
        &self.nft.serie_id
    }
}

/// A grouped NFT enriched with local fields
///
/// Local fields are only ever added next to the indexer fields, never over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedNft {
    /// Indexer-sourced part
    #[serde(flatten)]
    pub grouped: GroupedNft,
    /// Resolved categories, empty when the NFT has no local document
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    /// View count from the local document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views_count: Option<u64>,
    /// Curated attributes from the local document
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl PopulatedNft {
    /// A populated NFT with no local data
    pub fn bare(grouped: GroupedNft) -> Self {
        Self {
            grouped,
            categories: Vec::new(),
            views_count: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Id of the representative node
    pub fn id(&self) -> &NftId {
        self.grouped.id()
    }
}

/// Which NFTs a category listing selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelection {
    /// NFTs whose local document carries no category
    Uncategorized,
    /// NFTs in any of these categories
    Codes(Vec<CategoryCode>),
}

impl CategorySelection {
    /// Build a selection from optional codes, `None` meaning uncategorized
    pub fn from_codes(codes: Option<Vec<CategoryCode>>) -> Self {
        codes.map_or(Self::Uncategorized, Self::Codes)
    }
}

/// Outcome of resolving category codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResolution {
    /// Records found, in first-requested order
    pub resolved: Vec<CategoryRecord>,
    /// Codes that matched no record
    pub unresolved: Vec<CategoryCode>,
}

/// Listing result alongside the category codes that could not be resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListing<T> {
    /// Listed NFTs
    pub nfts: T,
    /// Requested codes that matched no category
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_categories: Vec<CategoryCode>,
}

/// Backend whose windowing produced a page
///
/// Page metadata of a listing is read from here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAuthority {
    /// The indexer applied limit and offset
    Indexer(PageInfo),
    /// The local store paginated documents before the indexer fetch
    LocalStore(PageInfo),
}

impl PageAuthority {
    /// Page metadata owned by this authority
    pub fn page_info(&self) -> PageInfo {
        match self {
            Self::Indexer(info) | Self::LocalStore(info) => *info,
        }
    }

    /// Label used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Indexer(_) => "indexer",
            Self::LocalStore(_) => "local_store",
        }
    }
}

/// Parameters of a draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRequest {
    /// Serie whose members are distributed
    pub serie_id: SerieId,
    /// How many ranked users take part
    pub users_number: usize,
    /// Users that may not win
    #[serde(default)]
    pub excluded_users: Vec<UserId>,
}

/// A persisted draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionOutcome {
    /// The assignment as written
    pub assignment: DistributionAssignment,
    /// Where the sink stored it
    pub location: String,
}
