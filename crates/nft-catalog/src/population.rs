// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Enrich grouped NFTs with locally stored data
//!
//! The lookup is keyed by NFT id: the local document is found by chain id and its
//! category ids are resolved to records. Missing data leaves fields absent; only
//! store failures are errors.

use futures::{StreamExt, TryStreamExt, stream};
use source_client::{CategoryLookup, DocumentStore};
use tracing::{debug, instrument};

use crate::{
    error::{CatalogError, CatalogResult},
    metrics,
    types::{GroupedNft, PopulatedNft},
};

/// Populate one grouped NFT
///
/// # Errors
///
/// Returns an upstream error if the document store or the category lookup fails
pub async fn populate_one<S, C>(
    store: &S,
    categories: &C,
    grouped: GroupedNft,
) -> CatalogResult<PopulatedNft>
where
    S: DocumentStore,
    C: CategoryLookup,
{
    let document = store
        .find_document(grouped.id())
        .await
        .map_err(|e| CatalogError::upstream("find_document", e))?;

    let Some(document) = document else {
        debug!(nft_id = %grouped.id(), "no local document");
        return Ok(PopulatedNft::bare(grouped));
    };

    let records = if document.categories.is_empty() {
        Vec::new()
    } else {
        categories
            .find_by_ids(&document.categories)
            .await
            .map_err(|e| CatalogError::upstream("find_categories_by_ids", e))?
    };

    if records.len() < document.categories.len() {
        debug!(
            nft_id = %grouped.id(),
            stored = document.categories.len(),
            resolved = records.len(),
            "some stored categories no longer exist"
        );
    }

    Ok(PopulatedNft {
        grouped,
        categories: records,
        views_count: Some(document.views_count),
        attributes: document.attributes,
    })
}

/// Populate a batch, at most `concurrency` lookups in flight, keeping input order
///
/// Fails as a whole on the first store error.
///
/// # Errors
///
/// Returns the first upstream error raised by any lookup
#[instrument(skip(store, categories, batch), fields(batch_size = batch.len()))]
pub async fn populate_all<S, C>(
    store: &S,
    categories: &C,
    batch: Vec<GroupedNft>,
    concurrency: usize,
) -> CatalogResult<Vec<PopulatedNft>>
where
    S: DocumentStore,
    C: CategoryLookup,
{
    let populated: Vec<PopulatedNft> = stream::iter(batch)
        .map(|grouped| populate_one(store, categories, grouped))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    metrics::inc_populated(populated.len());
    debug!(populated = populated.len(), "batch populated");
    Ok(populated)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{BTreeMap, HashMap},
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use shared_types::{CategoryCode, CategoryId, NftId, PageResult, PaginationWindow, SerieId};
    use source_client::{CategoryRecord, DocumentFilter, LocalNftDocument, NftNode, SourceError};

    use super::*;

    #[derive(Default)]
    struct FakeStore {
        documents: HashMap<NftId, LocalNftDocument>,
        fail_on: Option<NftId>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl DocumentStore for FakeStore {
        async fn find_documents(
            &self,
            _filter: &DocumentFilter,
        ) -> Result<Vec<LocalNftDocument>, SourceError> {
            Ok(Vec::new())
        }

        async fn find_documents_page(
            &self,
            _filter: &DocumentFilter,
            _window: PaginationWindow,
        ) -> Result<PageResult<LocalNftDocument>, SourceError> {
            Ok(PageResult::empty())
        }

        async fn find_document(&self, id: &NftId) -> Result<Option<LocalNftDocument>, SourceError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            // Later ids answer first so ordering comes from the stream, not timing
            let delay = 20u64.saturating_sub(id.as_str().parse::<u64>().unwrap_or(0));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on.as_ref() == Some(id) {
                return Err(SourceError::storage("connection reset"));
            }
            Ok(self.documents.get(id).cloned())
        }
    }

    struct FakeCategories(Vec<CategoryRecord>);

    impl CategoryLookup for FakeCategories {
        async fn find_by_code(
            &self,
            code: &CategoryCode,
        ) -> Result<Option<CategoryRecord>, SourceError> {
            Ok(self.0.iter().find(|c| &c.code == code).cloned())
        }

        async fn find_by_ids(&self, ids: &[CategoryId]) -> Result<Vec<CategoryRecord>, SourceError> {
            Ok(self
                .0
                .iter()
                .filter(|c| ids.contains(&c.id))
                .cloned()
                .collect())
        }
    }

    fn grouped(id: &str) -> GroupedNft {
        GroupedNft::seed(NftNode {
            id: NftId::new(id).unwrap(),
            serie_id: SerieId::standalone(),
            owner: "owner".to_string(),
            creator: "creator".to_string(),
            listed: false,
            price: None,
            marketplace_id: None,
            nft_ipfs: None,
            created_at: None,
        })
    }

    fn art() -> CategoryRecord {
        CategoryRecord {
            id: CategoryId::new("cat-art").unwrap(),
            code: CategoryCode::new("art").unwrap(),
            name: "Art".to_string(),
            description: None,
        }
    }

    fn document(id: &str, categories: &[&str], views: u64) -> LocalNftDocument {
        LocalNftDocument {
            chain_id: NftId::new(id).unwrap(),
            categories: categories
                .iter()
                .map(|c| CategoryId::new(*c).unwrap())
                .collect(),
            views_count: views,
            attributes: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn missing_document_leaves_fields_absent() {
        let store = FakeStore::default();
        let populated = populate_one(&store, &FakeCategories(vec![art()]), grouped("1"))
            .await
            .unwrap();

        assert!(populated.categories.is_empty());
        assert_eq!(populated.views_count, None);
    }

    #[tokio::test]
    async fn stale_category_ids_are_skipped() {
        let mut store = FakeStore::default();
        store.documents.insert(
            NftId::new("1").unwrap(),
            document("1", &["cat-art", "cat-gone"], 12),
        );

        let populated = populate_one(&store, &FakeCategories(vec![art()]), grouped("1"))
            .await
            .unwrap();

        assert_eq!(populated.categories, vec![art()]);
        assert_eq!(populated.views_count, Some(12));
    }

    #[tokio::test]
    async fn batch_keeps_order_and_bounds_concurrency() {
        let mut store = FakeStore::default();
        for id in 1..=12 {
            let id = id.to_string();
            store
                .documents
                .insert(NftId::new(id.as_str()).unwrap(), document(&id, &[], 1));
        }
        let batch: Vec<GroupedNft> = (1..=12).map(|id| grouped(&id.to_string())).collect();

        let populated = populate_all(&store, &FakeCategories(Vec::new()), batch, 3)
            .await
            .unwrap();

        let ids: Vec<String> = populated.iter().map(|p| p.id().to_string()).collect();
        let expected: Vec<String> = (1..=12).map(|id| id.to_string()).collect();
        assert_eq!(ids, expected);
        assert!(store.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn store_failure_fails_the_batch() {
        let store = FakeStore {
            fail_on: Some(NftId::new("2").unwrap()),
            ..FakeStore::default()
        };
        let batch = vec![grouped("1"), grouped("2"), grouped("3")];

        let error = populate_all(&store, &FakeCategories(Vec::new()), batch, 2)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            CatalogError::Upstream {
                operation: "find_document",
                ..
            }
        ));
    }
}
