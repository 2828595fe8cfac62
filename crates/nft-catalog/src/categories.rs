// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Category selections turned into indexer id sets
//!
//! The indexer knows nothing about categories, so a selection is first resolved
//! against the local store into a set of chain ids:
//!
//! - `Uncategorized` collects every categorized document and *excludes* those ids
//! - `Codes` resolves the codes, collects documents in any of the resolved
//!   categories and *includes* those ids
//!
//! The two branches never mix.

use std::collections::HashSet;

use shared_types::{CategoryCode, CategoryId, NftId, PageInfo, PaginationWindow};
use source_client::{CategoryLookup, DocumentFilter, DocumentStore, LocalNftDocument};
use tracing::{debug, info, warn};

use crate::{
    config::UnresolvedCategoryPolicy,
    error::{CatalogError, CatalogResult},
    types::{CategoryResolution, CategorySelection},
};

/// Id-space filter handed to the indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSet {
    /// Only these ids; empty means nothing matches
    Include(Vec<NftId>),
    /// Everything but these ids; empty means everything matches
    Exclude(Vec<NftId>),
}

/// A selection resolved into an id set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    /// Filter for the indexer
    pub ids: IdSet,
    /// Requested codes that matched no category
    pub unresolved: Vec<CategoryCode>,
}

/// One page of category members, windowed by the local store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPage {
    /// Chain ids of the documents on this page, in store order
    pub ids: Vec<NftId>,
    /// Page metadata computed by the store
    pub info: PageInfo,
    /// Requested codes that matched no category
    pub unresolved: Vec<CategoryCode>,
}

/// Resolves category selections against the local store
#[derive(Debug)]
pub struct CategoryResolver<'a, S, C> {
    store: &'a S,
    categories: &'a C,
    policy: UnresolvedCategoryPolicy,
}

impl<'a, S, C> CategoryResolver<'a, S, C>
where
    S: DocumentStore,
    C: CategoryLookup,
{
    /// Create a resolver
    pub fn new(store: &'a S, categories: &'a C, policy: UnresolvedCategoryPolicy) -> Self {
        Self {
            store,
            categories,
            policy,
        }
    }

    /// Resolve each distinct code once, in first-requested order
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the category lookup fails
    pub async fn resolve_codes(&self, codes: &[CategoryCode]) -> CatalogResult<CategoryResolution> {
        let mut seen = HashSet::new();
        let mut resolution = CategoryResolution::default();

        for code in codes.iter().filter(|code| seen.insert(*code)) {
            match self
                .categories
                .find_by_code(code)
                .await
                .map_err(|e| CatalogError::upstream("find_category_by_code", e))?
            {
                Some(record) => resolution.resolved.push(record),
                None => resolution.unresolved.push(code.clone()),
            }
        }

        debug!(
            requested = codes.len(),
            resolved = resolution.resolved.len(),
            unresolved = resolution.unresolved.len(),
            "category codes resolved"
        );
        Ok(resolution)
    }

    fn check_unresolved(&self, unresolved: &[CategoryCode]) -> CatalogResult<()> {
        if unresolved.is_empty() {
            return Ok(());
        }
        match self.policy {
            UnresolvedCategoryPolicy::Reject => Err(CatalogError::UnresolvedCategories {
                codes: unresolved.to_vec(),
            }),
            UnresolvedCategoryPolicy::Ignore => {
                warn!(codes = ?unresolved, "skipping unknown category codes");
                Ok(())
            }
        }
    }

    /// Resolve codes into the category ids that select documents
    async fn category_ids(
        &self,
        codes: &[CategoryCode],
    ) -> CatalogResult<(Vec<CategoryId>, Vec<CategoryCode>)> {
        let resolution = self.resolve_codes(codes).await?;
        self.check_unresolved(&resolution.unresolved)?;
        let ids = resolution.resolved.into_iter().map(|r| r.id).collect();
        Ok((ids, resolution.unresolved))
    }

    /// Chain ids of every document carrying at least one category
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the store query fails
    pub async fn categorized_ids(&self) -> CatalogResult<Vec<NftId>> {
        let documents = self
            .store
            .find_documents(&DocumentFilter::Categorized)
            .await
            .map_err(|e| CatalogError::upstream("find_categorized_documents", e))?;
        Ok(chain_ids(documents))
    }

    /// Resolve a selection into the full id set it stands for
    ///
    /// # Errors
    ///
    /// Returns an upstream error if a store or lookup call fails, or an
    /// unresolved-categories error under the rejecting policy
    pub async fn resolve(&self, selection: &CategorySelection) -> CatalogResult<ResolvedSelection> {
        match selection {
            CategorySelection::Uncategorized => {
                let ids = self.categorized_ids().await?;
                info!(excluded = ids.len(), "resolved uncategorized selection");
                Ok(ResolvedSelection {
                    ids: IdSet::Exclude(ids),
                    unresolved: Vec::new(),
                })
            }
            CategorySelection::Codes(codes) => {
                let (category_ids, unresolved) = self.category_ids(codes).await?;
                if category_ids.is_empty() {
                    debug!("no category resolved, selection is empty");
                    return Ok(ResolvedSelection {
                        ids: IdSet::Include(Vec::new()),
                        unresolved,
                    });
                }

                let documents = self
                    .store
                    .find_documents(&DocumentFilter::InCategories(category_ids))
                    .await
                    .map_err(|e| CatalogError::upstream("find_documents_in_categories", e))?;
                let ids = chain_ids(documents);
                info!(included = ids.len(), "resolved category selection");
                Ok(ResolvedSelection {
                    ids: IdSet::Include(ids),
                    unresolved,
                })
            }
        }
    }

    /// Resolve codes and let the local store window the matching documents
    ///
    /// # Errors
    ///
    /// Returns an upstream error if a store or lookup call fails, or an
    /// unresolved-categories error under the rejecting policy
    pub async fn resolve_page(
        &self,
        codes: &[CategoryCode],
        window: PaginationWindow,
    ) -> CatalogResult<LocalPage> {
        let (category_ids, unresolved) = self.category_ids(codes).await?;
        if category_ids.is_empty() {
            return Ok(LocalPage {
                ids: Vec::new(),
                info: window.page_info(0),
                unresolved,
            });
        }

        let page = self
            .store
            .find_documents_page(&DocumentFilter::InCategories(category_ids), window)
            .await
            .map_err(|e| CatalogError::upstream("find_documents_page", e))?;
        let (documents, info) = page.into_parts();
        debug!(
            page = window.page(),
            on_page = documents.len(),
            total = info.total_count,
            "local store page"
        );

        Ok(LocalPage {
            ids: chain_ids(documents),
            info,
            unresolved,
        })
    }
}

fn chain_ids(documents: Vec<LocalNftDocument>) -> Vec<NftId> {
    documents.into_iter().map(|d| d.chain_id).collect()
}
