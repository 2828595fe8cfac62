// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! NFT listings composed from the indexer and the local store
//!
//! # Pagination authority
//!
//! Two backends can window a page:
//!
//! | Listing | Windowed by | Metadata from |
//! |---|---|---|
//! | not-in-ids, paginated | indexer (`first`/`offset`) | indexer |
//! | uncategorized, paginated | indexer (`first`/`offset`) | indexer |
//! | category codes, paginated | local store (`page`/`limit`) | local store |
//!
//! Each paginated listing tags its metadata with a [`PageAuthority`] and the
//! final page is assembled from that tag alone. Grouping may shrink a page below
//! its limit; the metadata still describes the ungrouped universe.

use std::sync::Arc;

use shared_types::{NftId, PageResult, SerieId};
use source_client::{CategoryLookup, DocumentStore, IndexerClient, NftNode};
use tracing::{debug, info, instrument};

use crate::{
    categories::{CategoryResolver, IdSet},
    config::CatalogSettings,
    error::CatalogResult,
    grouping::group_by_serie,
    id_set,
    population::populate_all,
    types::{CategoryListing, CategorySelection, PageAuthority, PopulatedNft},
};

/// Listing operations over an indexer, a document store and a category lookup
#[derive(Debug)]
pub struct NftCatalog<I, S, C> {
    indexer: Arc<I>,
    store: Arc<S>,
    categories: Arc<C>,
    settings: CatalogSettings,
}

impl<I, S, C> Clone for NftCatalog<I, S, C> {
    fn clone(&self) -> Self {
        Self {
            indexer: Arc::clone(&self.indexer),
            store: Arc::clone(&self.store),
            categories: Arc::clone(&self.categories),
            settings: self.settings.clone(),
        }
    }
}

impl<I, S, C> NftCatalog<I, S, C>
where
    I: IndexerClient,
    S: DocumentStore,
    C: CategoryLookup,
{
    /// Create a catalog
    ///
    /// # Errors
    ///
    /// Returns a validation error if the settings are out of range
    pub fn new(
        indexer: Arc<I>,
        store: Arc<S>,
        categories: Arc<C>,
        settings: CatalogSettings,
    ) -> CatalogResult<Self> {
        settings.validate()?;
        Ok(Self {
            indexer,
            store,
            categories,
            settings,
        })
    }

    /// Settings in effect
    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Indexer used by this catalog
    pub fn indexer(&self) -> &Arc<I> {
        &self.indexer
    }

    fn resolver(&self) -> CategoryResolver<'_, S, C> {
        CategoryResolver::new(
            self.store.as_ref(),
            self.categories.as_ref(),
            self.settings.unresolved_categories,
        )
    }

    /// Group then populate a batch of nodes
    async fn compose(&self, nodes: Vec<NftNode>) -> CatalogResult<Vec<PopulatedNft>> {
        let fetched = nodes.len();
        let grouped = group_by_serie(nodes);
        debug!(fetched, grouped = grouped.len(), "nodes grouped");
        populate_all(
            self.store.as_ref(),
            self.categories.as_ref(),
            grouped,
            self.settings.population_concurrency,
        )
        .await
    }

    /// Compose a page whose metadata is owned by `authority`
    async fn compose_page(
        &self,
        nodes: Vec<NftNode>,
        authority: PageAuthority,
    ) -> CatalogResult<PageResult<PopulatedNft>> {
        let data = self.compose(nodes).await?;
        let info = authority.page_info();
        debug!(
            authority = authority.name(),
            on_page = data.len(),
            total = info.total_count,
            has_next = info.has_next_page,
            "page assembled"
        );
        Ok(PageResult::new(data, info))
    }

    async fn fetch_id_set(
        &self,
        ids: IdSet,
        listed: Option<bool>,
    ) -> CatalogResult<Vec<NftNode>> {
        let page = match ids {
            IdSet::Include(ids) => {
                id_set::fetch_included(self.indexer.as_ref(), &ids, listed, None).await?
            }
            IdSet::Exclude(ids) => {
                id_set::fetch_excluded(self.indexer.as_ref(), &ids, listed, None).await?
            }
        };
        Ok(page.data)
    }

    /// NFTs with the given ids, grouped and populated
    ///
    /// An empty id list returns nothing without calling the indexer.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the indexer or the store fails
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn get_by_ids(
        &self,
        ids: &[NftId],
        listed: Option<bool>,
    ) -> CatalogResult<Vec<PopulatedNft>> {
        let page = id_set::fetch_included(self.indexer.as_ref(), ids, listed, None).await?;
        let nfts = self.compose(page.data).await?;
        info!(returned = nfts.len(), "listed NFTs by ids");
        Ok(nfts)
    }

    /// Every NFT except the given ids, grouped and populated
    ///
    /// An empty id list means the whole universe.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the indexer or the store fails
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn get_not_in_ids(
        &self,
        ids: &[NftId],
        listed: Option<bool>,
    ) -> CatalogResult<Vec<PopulatedNft>> {
        let page = id_set::fetch_excluded(self.indexer.as_ref(), ids, listed, None).await?;
        let nfts = self.compose(page.data).await?;
        info!(returned = nfts.len(), "listed NFTs not in ids");
        Ok(nfts)
    }

    /// One page of every NFT except the given ids
    ///
    /// The indexer windows the page and owns its metadata.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid window, or an upstream error if
    /// the indexer or the store fails
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn get_not_in_ids_paginated(
        &self,
        ids: &[NftId],
        listed: Option<bool>,
        page: u32,
        limit: u32,
    ) -> CatalogResult<PageResult<PopulatedNft>> {
        let window = self.settings.window(page, limit)?;
        let (nodes, info) = id_set::fetch_excluded(
            self.indexer.as_ref(),
            ids,
            listed,
            Some(window.to_indexer()),
        )
        .await?
        .into_parts();
        self.compose_page(nodes, PageAuthority::Indexer(info)).await
    }

    /// Every NFT matching a category selection
    ///
    /// # Errors
    ///
    /// Returns an upstream error if a backend fails, or an unresolved-categories
    /// error under the rejecting policy
    #[instrument(skip(self))]
    pub async fn get_by_categories(
        &self,
        selection: &CategorySelection,
        listed: Option<bool>,
    ) -> CatalogResult<CategoryListing<Vec<PopulatedNft>>> {
        let resolved = self.resolver().resolve(selection).await?;
        let nodes = self.fetch_id_set(resolved.ids, listed).await?;
        let nfts = self.compose(nodes).await?;
        info!(returned = nfts.len(), "listed NFTs by categories");
        Ok(CategoryListing {
            nfts,
            unresolved_categories: resolved.unresolved,
        })
    }

    /// One page of the NFTs matching a category selection
    ///
    /// `Uncategorized` is windowed by the indexer; category codes are windowed by
    /// the local store and the page's ids are then fetched in full.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid window, an upstream error if a
    /// backend fails, or an unresolved-categories error under the rejecting policy
    #[instrument(skip(self))]
    pub async fn get_by_categories_paginated(
        &self,
        selection: &CategorySelection,
        listed: Option<bool>,
        page: u32,
        limit: u32,
    ) -> CatalogResult<CategoryListing<PageResult<PopulatedNft>>> {
        let window = self.settings.window(page, limit)?;

        let (nodes, authority, unresolved) = match selection {
            CategorySelection::Uncategorized => {
                let excluded = self.resolver().categorized_ids().await?;
                let (nodes, info) = id_set::fetch_excluded(
                    self.indexer.as_ref(),
                    &excluded,
                    listed,
                    Some(window.to_indexer()),
                )
                .await?
                .into_parts();
                (nodes, PageAuthority::Indexer(info), Vec::new())
            }
            CategorySelection::Codes(codes) => {
                let local = self.resolver().resolve_page(codes, window).await?;
                let fetched =
                    id_set::fetch_included(self.indexer.as_ref(), &local.ids, listed, None).await?;
                if fetched.data.len() < local.ids.len() {
                    debug!(
                        requested = local.ids.len(),
                        returned = fetched.data.len(),
                        "indexer returned fewer nodes than the local page"
                    );
                }
                (
                    fetched.data,
                    PageAuthority::LocalStore(local.info),
                    local.unresolved,
                )
            }
        };

        let nfts = self.compose_page(nodes, authority).await?;
        Ok(CategoryListing {
            nfts,
            unresolved_categories: unresolved,
        })
    }

    /// Every node of a serie, ungrouped and unpopulated
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the indexer fails
    #[instrument(skip(self))]
    pub async fn get_series(&self, serie_id: &SerieId) -> CatalogResult<PageResult<NftNode>> {
        id_set::fetch_serie(self.indexer.as_ref(), serie_id).await
    }

    /// Ids of every node of a serie, in indexer order
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the indexer fails
    #[instrument(skip(self))]
    pub async fn get_serie_ids(&self, serie_id: &SerieId) -> CatalogResult<PageResult<NftId>> {
        id_set::fetch_serie_ids(self.indexer.as_ref(), serie_id).await
    }
}
