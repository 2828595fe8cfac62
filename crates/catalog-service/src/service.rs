// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Service wiring
//!
//! Builds the concrete collaborators from configuration and exposes the catalog,
//! the distribution engine, health reporting and a cancellable draw.

use std::{sync::Arc, time::Instant};

use data_sources::{
    CachedCategoryLookup, CategoryCacheStats, GraphQlIndexerClient, IndexerConfig, JsonFileSink,
    MemoryStore,
};
use nft_catalog::{DistributionEngine, DistributionOutcome, NftCatalog, metrics};
use source_client::{HealthCheckResult, HealthReport, HealthStatus, IndexerClient};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    config::{DrawSettings, ServiceConfig},
    error::{ServiceError, ServiceResult},
};

/// Catalog over the production collaborators
pub type Catalog = NftCatalog<GraphQlIndexerClient, MemoryStore, CachedCategoryLookup<MemoryStore>>;

/// Distribution engine over the production collaborators
pub type Engine = DistributionEngine<GraphQlIndexerClient, MemoryStore, JsonFileSink>;

/// The wired service
#[derive(Debug)]
pub struct CatalogService {
    config: ServiceConfig,
    indexer: Arc<GraphQlIndexerClient>,
    store: Arc<MemoryStore>,
    categories: Arc<CachedCategoryLookup<MemoryStore>>,
    catalog: Catalog,
    engine: Engine,
}

impl CatalogService {
    /// Build every collaborator described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the indexer endpoint is invalid, the snapshot cannot
    /// be loaded or the catalog settings are out of range
    pub async fn from_config(config: ServiceConfig) -> ServiceResult<Self> {
        let indexer_config = IndexerConfig::new(config.indexer.endpoint.as_str())?
            .with_timeout_seconds(config.indexer.timeout_seconds.as_secs())
            .with_health_check_timeout_seconds(
                config.indexer.health_check_timeout_seconds.as_secs(),
            )
            .with_max_retries(config.indexer.max_retries);
        let indexer = Arc::new(GraphQlIndexerClient::new(indexer_config)?);

        let store = Arc::new(MemoryStore::load(&config.store.snapshot_path).await?);
        let categories = Arc::new(CachedCategoryLookup::with_settings(
            store.as_ref().clone(),
            config.category_cache.ttl(),
            config.category_cache.max_entries,
        ));
        let sink = Arc::new(JsonFileSink::new(
            config.catalog.distribution.output_dir.clone(),
        ));

        let catalog = NftCatalog::new(
            Arc::clone(&indexer),
            Arc::clone(&store),
            Arc::clone(&categories),
            config.catalog.clone(),
        )?;
        let engine = DistributionEngine::new(
            Arc::clone(&indexer),
            Arc::clone(&store),
            sink,
            config.catalog.distribution.clone(),
        );

        info!(
            environment = %config.environment,
            indexer = %config.indexer.endpoint,
            documents = store.document_count(),
            output_dir = %config.catalog.distribution.output_dir.display(),
            "catalog service ready"
        );

        Ok(Self {
            config,
            indexer,
            store,
            categories,
            catalog,
            engine,
        })
    }

    /// Configuration the service was built from
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Listing operations
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Distribution engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Probe the indexer and report on the local store
    pub async fn health(&self) -> HealthReport {
        let mut report = HealthReport::default();

        let start = Instant::now();
        let indexer = match self.indexer.health_check().await {
            Ok(status) => HealthCheckResult::new(self.indexer.name(), status, start.elapsed()),
            Err(e) => HealthCheckResult::failed(self.indexer.name(), start.elapsed(), e.to_string()),
        };
        report.push(indexer);

        let start = Instant::now();
        let status = if self.store.document_count() == 0 {
            HealthStatus::Degraded {
                reason: "local store holds no documents".to_string(),
            }
        } else {
            HealthStatus::Up
        };
        report.push(HealthCheckResult::new("local-store", status, start.elapsed()));

        report
    }

    /// Run a draw unless `cancel` fires first
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Cancelled` if cancelled, or the draw failure
    pub async fn run_draw(
        &self,
        draw: &DrawSettings,
        cancel: &CancellationToken,
    ) -> ServiceResult<DistributionOutcome> {
        let request = draw.to_request();
        info!(serie_id = %request.serie_id, users_number = request.users_number, "running draw");

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(serie_id = %request.serie_id, "draw cancelled");
                Err(ServiceError::Cancelled)
            }
            result = self.engine.draw(&request) => Ok(result?),
        }
    }

    /// Category cache statistics
    pub fn category_cache_stats(&self) -> CategoryCacheStats {
        self.categories.stats()
    }

    /// Drop expired category cache entries and publish cache gauges
    pub fn publish_metrics(&self) {
        let expired = self.categories.cleanup_expired();
        let stats = self.categories.stats();
        metrics::record_category_cache_stats(
            stats.hits,
            stats.misses,
            stats.entry_count,
            stats.hit_rate,
        );
        info!(
            expired,
            entries = stats.entry_count,
            hit_rate = stats.hit_rate,
            "category cache metrics published"
        );
    }
}
