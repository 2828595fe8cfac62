// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Indexer queries over id sets and series
//!
//! Every call is timed into [`metrics::INDEXER_QUERY_DURATION`] under its operation
//! name, and every failure is wrapped with that name while keeping the original
//! source error.

use std::time::Instant;

use shared_types::{IndexerWindow, NftId, PageResult, SerieId};
use source_client::{IndexerClient, NftNode, NodeQuery, SourceError};
use tracing::{debug, error};

use crate::{
    error::{CatalogError, CatalogResult},
    metrics,
};

/// Operation name of include-only fetches
pub const FETCH_INCLUDED: &str = "fetch_included";
/// Operation name of exclude-only fetches
pub const FETCH_EXCLUDED: &str = "fetch_excluded";
/// Operation name of serie fetches
pub const FETCH_SERIE: &str = "fetch_serie";
/// Operation name of serie id fetches
pub const FETCH_SERIE_IDS: &str = "fetch_serie_ids";

async fn timed<T>(
    operation: &'static str,
    call: impl Future<Output = Result<T, SourceError>>,
) -> CatalogResult<T> {
    let start = Instant::now();
    let result = call.await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(value) => {
            metrics::observe_indexer_query(operation, "success", elapsed);
            Ok(value)
        }
        Err(e) => {
            metrics::observe_indexer_query(operation, "error", elapsed);
            error!(operation, error = %e, "indexer query failed");
            Err(CatalogError::upstream(operation, e))
        }
    }
}

/// Fetch exactly the given ids
///
/// An empty id set yields an empty page without calling the indexer.
///
/// # Errors
///
/// Returns an upstream error if the indexer call fails
pub async fn fetch_included<I: IndexerClient>(
    indexer: &I,
    ids: &[NftId],
    listed: Option<bool>,
    window: Option<IndexerWindow>,
) -> CatalogResult<PageResult<NftNode>> {
    if ids.is_empty() {
        debug!("empty inclusion set, skipping indexer");
        return Ok(PageResult::empty());
    }

    let query = NodeQuery::include(ids.to_vec())
        .with_listed(listed)
        .with_window(window);
    debug!(ids = ids.len(), ?listed, ?window, "fetching included ids");
    timed(FETCH_INCLUDED, indexer.query_nodes(&query)).await
}

/// Fetch everything except the given ids
///
/// An empty id set means no restriction.
///
/// # Errors
///
/// Returns an upstream error if the indexer call fails
pub async fn fetch_excluded<I: IndexerClient>(
    indexer: &I,
    ids: &[NftId],
    listed: Option<bool>,
    window: Option<IndexerWindow>,
) -> CatalogResult<PageResult<NftNode>> {
    let query = NodeQuery::exclude(ids.to_vec())
        .with_listed(listed)
        .with_window(window);
    debug!(ids = ids.len(), ?listed, ?window, "fetching excluded ids");
    timed(FETCH_EXCLUDED, indexer.query_nodes(&query)).await
}

/// Fetch every member node of a serie
///
/// # Errors
///
/// Returns an upstream error if the indexer call fails
pub async fn fetch_serie<I: IndexerClient>(
    indexer: &I,
    serie_id: &SerieId,
) -> CatalogResult<PageResult<NftNode>> {
    debug!(%serie_id, "fetching serie");
    timed(FETCH_SERIE, indexer.query_nodes(&NodeQuery::serie(serie_id.clone()))).await
}

/// Fetch the ids of every member of a serie, in indexer order
///
/// # Errors
///
/// Returns an upstream error if the indexer call fails
pub async fn fetch_serie_ids<I: IndexerClient>(
    indexer: &I,
    serie_id: &SerieId,
) -> CatalogResult<PageResult<NftId>> {
    debug!(%serie_id, "fetching serie ids");
    timed(FETCH_SERIE_IDS, indexer.query_ids(&NodeQuery::serie(serie_id.clone()))).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use shared_types::PageInfo;
    use source_client::{HealthStatus, IdFilter};

    use super::*;

    #[derive(Default)]
    struct RecordingIndexer {
        queries: Mutex<Vec<NodeQuery>>,
        fail: bool,
    }

    impl IndexerClient for RecordingIndexer {
        async fn health_check(&self) -> Result<HealthStatus, SourceError> {
            Ok(HealthStatus::Up)
        }

        async fn query_nodes(&self, query: &NodeQuery) -> Result<PageResult<NftNode>, SourceError> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(SourceError::query("Cannot query field \"nftEntities\""));
            }
            Ok(PageResult::empty())
        }

        async fn query_ids(&self, query: &NodeQuery) -> Result<PageResult<NftId>, SourceError> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(PageResult::new(
                vec![NftId::new("10").unwrap()],
                PageInfo::complete(1),
            ))
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn empty_inclusion_skips_the_indexer() {
        let indexer = RecordingIndexer::default();
        let page = fetch_included(&indexer, &[], Some(true), None).await.unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.total_count, 0);
        assert!(indexer.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_exclusion_still_queries() {
        let indexer = RecordingIndexer::default();
        let window = Some(IndexerWindow {
            limit: 10,
            offset: 0,
        });
        fetch_excluded(&indexer, &[], None, window).await.unwrap();

        let queries = indexer.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].filter, IdFilter::Exclude(Vec::new()));
        assert_eq!(queries[0].window, window);
    }

    #[tokio::test]
    async fn failures_carry_operation_and_cause() {
        let indexer = RecordingIndexer {
            fail: true,
            ..RecordingIndexer::default()
        };
        let error = fetch_included(&indexer, &[NftId::new("1").unwrap()], None, None)
            .await
            .unwrap_err();

        match error {
            CatalogError::Upstream { operation, source } => {
                assert_eq!(operation, FETCH_INCLUDED);
                assert!(source.is_query_error());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn serie_ids_use_serie_filter() {
        let indexer = RecordingIndexer::default();
        let serie_id = SerieId::new("S1").unwrap();
        let ids = fetch_serie_ids(&indexer, &serie_id).await.unwrap();

        assert_eq!(ids.data.len(), 1);
        assert_eq!(
            indexer.queries.lock().unwrap()[0].filter,
            IdFilter::Serie(serie_id)
        );
    }
}
