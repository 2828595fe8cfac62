// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for catalog integration tests
#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use chrono::{DateTime, TimeZone, Utc};
use data_sources::{MemoryStore, StoreSnapshot};
use nft_catalog::{CatalogSettings, NftCatalog};
use serde_json::json;
use shared_types::{NftId, PageInfo, PageResult, SerieId};
use source_client::{
    AssignmentSink, Candidate, CandidateSession, CandidateSource, DistributionAssignment,
    HealthStatus, IdFilter, IndexerClient, NftNode, NodeQuery, SourceError,
};

/// Indexer double answering from a fixed universe of nodes
#[derive(Debug, Default)]
pub struct FakeIndexer {
    universe: Vec<NftNode>,
    queries: Mutex<Vec<NodeQuery>>,
    failure: Mutex<Option<fn() -> SourceError>>,
}

impl FakeIndexer {
    pub fn new(universe: Vec<NftNode>) -> Self {
        Self {
            universe,
            ..Self::default()
        }
    }

    pub fn fail_with(&self, failure: fn() -> SourceError) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<NodeQuery> {
        self.queries.lock().unwrap().last().cloned()
    }

    fn answer(&self, query: &NodeQuery) -> Result<PageResult<NftNode>, SourceError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(failure) = *self.failure.lock().unwrap() {
            return Err(failure());
        }

        let matching: Vec<NftNode> = self
            .universe
            .iter()
            .filter(|node| match &query.filter {
                IdFilter::Include(ids) => ids.contains(&node.id),
                IdFilter::Exclude(ids) => !ids.contains(&node.id),
                IdFilter::Serie(serie_id) => &node.serie_id == serie_id,
            })
            .filter(|node| query.listed.is_none_or(|listed| node.listed == listed))
            .cloned()
            .collect();
        let total_count = matching.len() as u64;

        let Some(window) = query.window else {
            return Ok(PageResult::new(matching, PageInfo::complete(total_count)));
        };
        let data = matching
            .into_iter()
            .skip(usize::try_from(window.offset).unwrap())
            .take(window.limit as usize)
            .collect();
        let info = PageInfo {
            has_next_page: window.offset + u64::from(window.limit) < total_count,
            has_previous_page: window.offset > 0,
            total_count,
        };
        Ok(PageResult::new(data, info))
    }
}

impl IndexerClient for FakeIndexer {
    async fn health_check(&self) -> Result<HealthStatus, SourceError> {
        Ok(HealthStatus::Up)
    }

    async fn query_nodes(&self, query: &NodeQuery) -> Result<PageResult<NftNode>, SourceError> {
        self.answer(query)
    }

    async fn query_ids(&self, query: &NodeQuery) -> Result<PageResult<NftId>, SourceError> {
        Ok(self.answer(query)?.map(|node| node.id))
    }

    fn name(&self) -> &'static str {
        "fake-indexer"
    }
}

pub fn node(id: &str, serie: &str, listed: bool) -> NftNode {
    NftNode {
        id: NftId::new(id).unwrap(),
        serie_id: SerieId::new(serie).unwrap(),
        owner: format!("owner-{id}"),
        creator: "creator".to_string(),
        listed,
        price: listed.then(|| "1000".to_string()),
        marketplace_id: None,
        nft_ipfs: None,
        created_at: None,
    }
}

/// Indexer universe: serie S1 (10-12), serie S2 (20-21), standalone 30-34, serie S4 (40)
pub fn universe() -> Vec<NftNode> {
    vec![
        node("10", "S1", true),
        node("11", "S1", false),
        node("12", "S1", true),
        node("20", "S2", false),
        node("21", "S2", true),
        node("30", "0", true),
        node("31", "0", false),
        node("32", "0", true),
        node("33", "0", false),
        node("34", "0", true),
        node("40", "S4", false),
    ]
}

pub fn time(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

/// Local store: art and photo categories, documents 10/20/30-33 plus 99 unknown to the indexer
pub fn snapshot() -> StoreSnapshot {
    serde_json::from_value(json!({
        "categories": [
            { "id": "cat-art", "code": "art", "name": "Art" },
            { "id": "cat-photo", "code": "photo", "name": "Photography" }
        ],
        "documents": [
            { "chainId": "10", "categories": ["cat-art"], "viewsCount": 12 },
            { "chainId": "20", "categories": ["cat-photo"] },
            { "chainId": "30", "categories": ["cat-art"], "attributes": { "featured": true } },
            { "chainId": "31", "categories": [] },
            { "chainId": "32", "categories": ["cat-art", "cat-photo"] },
            { "chainId": "33", "categories": ["cat-art"] },
            { "chainId": "99", "categories": ["cat-art"] }
        ],
        "candidates": [
            { "userId": "A", "score": 100, "availableAt": "2024-01-05T00:00:00Z" },
            { "userId": "B", "score": 80, "availableAt": "2024-01-02T00:00:00Z" },
            { "userId": "C", "score": 80, "availableAt": "2024-01-01T00:00:00Z" },
            { "userId": "D", "score": 80, "availableAt": "2024-01-03T00:00:00Z" },
            { "userId": "X", "score": 500, "availableAt": "2024-01-01T00:00:00Z" }
        ]
    }))
    .unwrap()
}

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_snapshot(snapshot()).unwrap())
}

pub type TestCatalog = NftCatalog<FakeIndexer, MemoryStore, MemoryStore>;

pub fn catalog_with(settings: CatalogSettings) -> (Arc<FakeIndexer>, TestCatalog) {
    let indexer = Arc::new(FakeIndexer::new(universe()));
    let store = store();
    let catalog = NftCatalog::new(Arc::clone(&indexer), Arc::clone(&store), store, settings).unwrap();
    (indexer, catalog)
}

pub fn catalog() -> (Arc<FakeIndexer>, TestCatalog) {
    catalog_with(CatalogSettings::default())
}

pub fn ids(values: &[&str]) -> Vec<NftId> {
    values.iter().map(|v| NftId::new(*v).unwrap()).collect()
}

/// Candidate source whose sessions can be told to fail, counting opens and closes
#[derive(Debug, Default)]
pub struct ScriptedCandidates {
    pub candidates: Vec<Candidate>,
    pub fail_read: bool,
    pub fail_close: bool,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl ScriptedCandidates {
    pub fn open_sessions(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ScriptedSession {
    candidates: Vec<Candidate>,
    fail_read: bool,
    fail_close: bool,
    closed: Arc<AtomicUsize>,
}

impl CandidateSource for ScriptedCandidates {
    type Session = ScriptedSession;

    async fn open(&self) -> Result<ScriptedSession, SourceError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            candidates: self.candidates.clone(),
            fail_read: self.fail_read,
            fail_close: self.fail_close,
            closed: Arc::clone(&self.closed),
        })
    }
}

impl CandidateSession for ScriptedSession {
    async fn candidates(&self) -> Result<Vec<Candidate>, SourceError> {
        if self.fail_read {
            return Err(SourceError::storage("cursor invalidated"));
        }
        Ok(self.candidates.clone())
    }

    async fn close(self) -> Result<(), SourceError> {
        // Counted even when failing: the release was attempted
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(SourceError::storage("connection reset while closing"));
        }
        Ok(())
    }
}

/// Sink keeping assignments in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub persisted: Mutex<Vec<DistributionAssignment>>,
}

impl AssignmentSink for RecordingSink {
    async fn persist(&self, assignment: &DistributionAssignment) -> Result<String, SourceError> {
        let mut persisted = self.persisted.lock().unwrap();
        persisted.push(assignment.clone());
        Ok(format!("memory://{}", persisted.len()))
    }
}
