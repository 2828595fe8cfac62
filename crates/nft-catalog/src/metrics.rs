// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Global metrics registered on the default Prometheus registry. [`render`]
//! produces the text exposition of everything registered so far.

use std::sync::LazyLock;

use prometheus::{
    Encoder, Gauge, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, TextEncoder,
    register_gauge, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, register_int_gauge_vec,
};

/// Histogram for indexer query durations in seconds.
pub static INDEXER_QUERY_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "nft_catalog_indexer_query_duration",
        "Indexer query durations in seconds",
        &["operation", "result"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create indexer query duration histogram")
});

/// Total number of NFTs enriched with local data.
pub static POPULATED_NFTS: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "nft_catalog_populated_nfts_total",
        "Total number of grouped NFTs populated with local data"
    )
    .expect("Failed to create populated NFTs counter")
});

/// Distribution draws, labeled by result.
pub static DRAWS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "nft_catalog_draws_total",
        "Total number of distribution draws",
        &["result"]
    )
    .expect("Failed to create draws counter vec")
});

/// Category cache lookups, labeled by outcome (hit or miss).
pub static CATEGORY_CACHE_LOOKUPS: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    register_int_gauge_vec!(
        "nft_catalog_category_cache_lookups",
        "Category cache lookups since start, labeled by outcome",
        &["outcome"]
    )
    .expect("Failed to create category cache lookups gauge vec")
});

/// Category cache size gauge
pub static CATEGORY_CACHE_ENTRIES: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge!(
        "nft_catalog_category_cache_entries_count",
        "Current number of entries in the category cache"
    )
    .expect("Failed to create category cache entries gauge")
});

/// Category cache hit rate gauge
pub static CATEGORY_CACHE_HIT_RATE: LazyLock<Gauge> = LazyLock::new(|| {
    register_gauge!(
        "nft_catalog_category_cache_hit_rate",
        "Category cache hit rate as a ratio (0.0 to 1.0)"
    )
    .expect("Failed to create category cache hit rate gauge")
});

/// Observe the duration of an indexer query
///
/// # Arguments
/// * `operation` - The catalog operation that issued the query
/// * `result` - `success` or `error`
/// * `duration_secs` - The duration of the query in seconds
pub fn observe_indexer_query(operation: &str, result: &str, duration_secs: f64) {
    INDEXER_QUERY_DURATION
        .with_label_values(&[operation, result])
        .observe(duration_secs);
}

/// Count populated NFTs
pub fn inc_populated(count: usize) {
    POPULATED_NFTS.inc_by(u64::try_from(count).unwrap_or(u64::MAX));
}

/// Count a draw by result
pub fn record_draw(result: &str) {
    DRAWS.with_label_values(&[result]).inc();
}

/// Publish a snapshot of the category cache statistics
///
/// # Arguments
/// * `hits` - Lookups answered from the cache
/// * `misses` - Lookups forwarded to the store
/// * `entry_count` - Current number of entries in cache
/// * `hit_rate` - Cache hit rate as ratio (0.0 to 1.0)
pub fn record_category_cache_stats(hits: u64, misses: u64, entry_count: usize, hit_rate: f64) {
    CATEGORY_CACHE_LOOKUPS
        .with_label_values(&["hit"])
        .set(i64::try_from(hits).unwrap_or(i64::MAX));
    CATEGORY_CACHE_LOOKUPS
        .with_label_values(&["miss"])
        .set(i64::try_from(misses).unwrap_or(i64::MAX));
    CATEGORY_CACHE_ENTRIES.set(i64::try_from(entry_count).unwrap_or(i64::MAX));
    CATEGORY_CACHE_HIT_RATE.set(hit_rate);
}

/// Render every registered metric in Prometheus text format
///
/// # Errors
///
/// Returns an error if the encoder fails
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
