// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Local store held in memory, loaded from a JSON snapshot
//!
//! The snapshot carries the three collections the catalog reads locally:
//!
//! ```json
//! {
//!   "categories": [{ "id": "cat-1", "code": "art", "name": "Art" }],
//!   "documents": [{ "chainId": "10", "categories": ["cat-1"], "viewsCount": 3 }],
//!   "candidates": [{ "userId": "alice", "score": 100, "availableAt": "2024-01-01T00:00:00Z" }]
//! }
//! ```
//!
//! Documents are kept ordered by chain id so paginated reads are stable.

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use shared_types::{CategoryCode, CategoryId, NftId, PageResult, PaginationWindow};
use source_client::{
    Candidate, CandidateSession, CandidateSource, CategoryLookup, CategoryRecord, DocumentFilter,
    DocumentStore, LocalNftDocument, SourceError,
};
use tracing::{debug, info, warn};

/// Serialized form of the local store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Curated categories
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    /// Per-NFT documents
    #[serde(default)]
    pub documents: Vec<LocalNftDocument>,
    /// Users eligible for draws
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// In-memory implementation of every local-store trait
#[derive(Debug, Clone)]
pub struct MemoryStore {
    documents: Arc<BTreeMap<NftId, LocalNftDocument>>,
    categories_by_code: Arc<HashMap<CategoryCode, CategoryRecord>>,
    categories_by_id: Arc<HashMap<CategoryId, CategoryRecord>>,
    candidates: Arc<Vec<Candidate>>,
    open_sessions: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Build a store from an in-memory snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if two documents share a chain id or two categories
    /// share an id or a code
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, SourceError> {
        let mut documents = BTreeMap::new();
        for document in snapshot.documents {
            let chain_id = document.chain_id.clone();
            if documents.insert(chain_id.clone(), document).is_some() {
                return Err(SourceError::storage(format!(
                    "duplicate document for NFT {chain_id}"
                )));
            }
        }

        let mut categories_by_code = HashMap::new();
        let mut categories_by_id = HashMap::new();
        for category in snapshot.categories {
            if categories_by_id
                .insert(category.id.clone(), category.clone())
                .is_some()
            {
                return Err(SourceError::storage(format!(
                    "duplicate category id {}",
                    category.id
                )));
            }
            let code = category.code.clone();
            if categories_by_code.insert(code.clone(), category).is_some() {
                return Err(SourceError::storage(format!(
                    "duplicate category code {code}"
                )));
            }
        }

        info!(
            documents = documents.len(),
            categories = categories_by_id.len(),
            candidates = snapshot.candidates.len(),
            "local store loaded"
        );

        Ok(Self {
            documents: Arc::new(documents),
            categories_by_code: Arc::new(categories_by_code),
            categories_by_id: Arc::new(categories_by_id),
            candidates: Arc::new(snapshot.candidates),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Load a store from a snapshot file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold a valid snapshot
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading local store snapshot");

        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            SourceError::io(format!("could not read snapshot {}: {e}", path.display()))
        })?;
        let snapshot: StoreSnapshot = serde_json::from_str(&contents).map_err(|e| {
            SourceError::storage(format!("invalid snapshot {}: {e}", path.display()))
        })?;

        Self::from_snapshot(snapshot)
    }

    /// Number of candidate sessions currently open
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Number of stored documents
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn matching<'a>(
        &'a self,
        filter: &'a DocumentFilter,
    ) -> impl Iterator<Item = &'a LocalNftDocument> + 'a {
        self.documents.values().filter(|doc| filter.matches(doc))
    }
}

impl DocumentStore for MemoryStore {
    async fn find_documents(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<LocalNftDocument>, SourceError> {
        let documents: Vec<_> = self.matching(filter).cloned().collect();
        debug!(?filter, matched = documents.len(), "local document query");
        Ok(documents)
    }

    async fn find_documents_page(
        &self,
        filter: &DocumentFilter,
        window: PaginationWindow,
    ) -> Result<PageResult<LocalNftDocument>, SourceError> {
        let total_count = self.matching(filter).count() as u64;
        let offset = usize::try_from(window.offset())
            .map_err(|_| SourceError::storage("page offset out of range"))?;
        let data: Vec<_> = self
            .matching(filter)
            .skip(offset)
            .take(window.limit() as usize)
            .cloned()
            .collect();

        debug!(
            ?filter,
            page = window.page(),
            limit = window.limit(),
            returned = data.len(),
            total_count,
            "paginated local document query"
        );

        Ok(PageResult::new(data, window.page_info(total_count)))
    }

    async fn find_document(&self, id: &NftId) -> Result<Option<LocalNftDocument>, SourceError> {
        Ok(self.documents.get(id).cloned())
    }
}

impl CategoryLookup for MemoryStore {
    async fn find_by_code(
        &self,
        code: &CategoryCode,
    ) -> Result<Option<CategoryRecord>, SourceError> {
        Ok(self.categories_by_code.get(code).cloned())
    }

    async fn find_by_ids(&self, ids: &[CategoryId]) -> Result<Vec<CategoryRecord>, SourceError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.categories_by_id.get(id).cloned())
            .collect())
    }
}

impl CandidateSource for MemoryStore {
    type Session = MemorySession;

    async fn open(&self) -> Result<MemorySession, SourceError> {
        let open = self.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(open_sessions = open, "candidate session opened");
        Ok(MemorySession {
            candidates: Arc::clone(&self.candidates),
            open_sessions: Arc::clone(&self.open_sessions),
            closed: false,
        })
    }
}

/// Candidate session over the in-memory store
#[derive(Debug)]
pub struct MemorySession {
    candidates: Arc<Vec<Candidate>>,
    open_sessions: Arc<AtomicUsize>,
    closed: bool,
}

impl CandidateSession for MemorySession {
    async fn candidates(&self) -> Result<Vec<Candidate>, SourceError> {
        Ok(self.candidates.as_ref().clone())
    }

    async fn close(mut self) -> Result<(), SourceError> {
        self.closed = true;
        let open = self.open_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(open_sessions = open, "candidate session closed");
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        if !self.closed {
            self.open_sessions.fetch_sub(1, Ordering::SeqCst);
            warn!("candidate session dropped without being closed");
        }
    }
}
