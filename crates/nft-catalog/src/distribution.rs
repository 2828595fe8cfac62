// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Ranked distribution of a serie's NFTs
//!
//! A draw runs in four stages:
//!
//! 1. **Rank**: read candidates in a scoped session, drop excluded users, order
//!    by score (desc), availability (asc) and user id (asc), keep the top N
//! 2. **Fetch**: read the serie's member ids from the indexer, in indexer order
//! 3. **Pair**: the i-th ranked user wins the i-th member
//! 4. **Persist**: hand the assignment to the sink
//!
//! The same candidates and serie always produce the same assignment.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use shared_types::{NftId, SerieId, UserId};
use source_client::{
    AssignmentEntry, AssignmentSink, Candidate, CandidateSession, CandidateSource,
    DistributionAssignment, IndexerClient,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::{DistributionSettings, ShortfallPolicy},
    error::{CatalogError, CatalogResult},
    id_set, metrics,
    types::{DistributionOutcome, DistributionRequest},
};

/// Order candidates and keep the `users_number` best, skipping excluded users
///
/// A user listed more than once keeps their best rank only.
pub fn rank_candidates(
    mut candidates: Vec<Candidate>,
    excluded: &[UserId],
    users_number: usize,
) -> Vec<UserId> {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.available_at.cmp(&b.available_at))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    let excluded: HashSet<&UserId> = excluded.iter().collect();
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|candidate| candidate.user_id)
        .filter(|user_id| !excluded.contains(user_id))
        .filter(|user_id| seen.insert(user_id.clone()))
        .take(users_number)
        .collect()
}

/// Pair serie members with ranked users position by position
///
/// # Errors
///
/// Returns [`CatalogError::InsufficientCandidates`] when there are fewer users
/// than members and the shortfall policy is [`ShortfallPolicy::Fail`]
pub fn pair(
    serie_id: SerieId,
    drawn_at: DateTime<Utc>,
    nft_ids: Vec<NftId>,
    winners: Vec<UserId>,
    shortfall: ShortfallPolicy,
) -> CatalogResult<DistributionAssignment> {
    if winners.len() < nft_ids.len() {
        match shortfall {
            ShortfallPolicy::Fail => {
                return Err(CatalogError::InsufficientCandidates {
                    required: nft_ids.len(),
                    available: winners.len(),
                });
            }
            ShortfallPolicy::LeaveUnassigned => warn!(
                %serie_id,
                nfts = nft_ids.len(),
                users = winners.len(),
                "not enough ranked users, leaving NFTs unassigned"
            ),
        }
    }

    let mut winners = winners.into_iter();
    let mut entries = Vec::with_capacity(nft_ids.len());
    let mut unassigned = Vec::new();
    for nft_id in nft_ids {
        match winners.next() {
            Some(user_id) => entries.push(AssignmentEntry { nft_id, user_id }),
            None => unassigned.push(nft_id),
        }
    }

    Ok(DistributionAssignment {
        serie_id,
        drawn_at,
        entries,
        unassigned,
    })
}

/// Runs draws against an indexer, a candidate source and an output sink
#[derive(Debug)]
pub struct DistributionEngine<I, P, K> {
    indexer: Arc<I>,
    candidates: Arc<P>,
    sink: Arc<K>,
    settings: DistributionSettings,
}

impl<I, P, K> DistributionEngine<I, P, K>
where
    I: IndexerClient,
    P: CandidateSource,
    K: AssignmentSink,
{
    /// Create an engine
    pub fn new(
        indexer: Arc<I>,
        candidates: Arc<P>,
        sink: Arc<K>,
        settings: DistributionSettings,
    ) -> Self {
        Self {
            indexer,
            candidates,
            sink,
            settings,
        }
    }

    /// Run a draw stamped with the current time
    ///
    /// # Errors
    ///
    /// Any failure is returned as [`CatalogError::Distribution`] wrapping the
    /// stage error
    pub async fn draw(&self, request: &DistributionRequest) -> CatalogResult<DistributionOutcome> {
        self.draw_at(request, Utc::now()).await
    }

    /// Run a draw stamped with `drawn_at`
    ///
    /// # Errors
    ///
    /// Any failure is returned as [`CatalogError::Distribution`] wrapping the
    /// stage error
    #[instrument(skip(self, request), fields(serie_id = %request.serie_id, users_number = request.users_number))]
    pub async fn draw_at(
        &self,
        request: &DistributionRequest,
        drawn_at: DateTime<Utc>,
    ) -> CatalogResult<DistributionOutcome> {
        match self.run(request, drawn_at).await {
            Ok(outcome) => {
                metrics::record_draw("success");
                info!(
                    location = %outcome.location,
                    assigned = outcome.assignment.assigned_count(),
                    unassigned = outcome.assignment.unassigned.len(),
                    "draw completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                metrics::record_draw("failure");
                error!(error = %e, "draw failed");
                Err(CatalogError::distribution(request.serie_id.clone(), e))
            }
        }
    }

    async fn run(
        &self,
        request: &DistributionRequest,
        drawn_at: DateTime<Utc>,
    ) -> CatalogResult<DistributionOutcome> {
        if request.users_number == 0 {
            return Err(CatalogError::validation("users_number must be at least 1"));
        }

        let winners = self.ranked_users(request).await?;
        info!(ranked = winners.len(), "candidates ranked");

        let nft_ids = id_set::fetch_serie_ids(self.indexer.as_ref(), &request.serie_id)
            .await?
            .data;
        if nft_ids.is_empty() {
            warn!("serie has no members, persisting an empty distribution");
        } else {
            info!(members = nft_ids.len(), "serie members fetched");
        }

        let assignment = pair(
            request.serie_id.clone(),
            drawn_at,
            nft_ids,
            winners,
            self.settings.shortfall,
        )?;
        debug!(entries = assignment.entries.len(), "members paired");

        let location = self
            .sink
            .persist(&assignment)
            .await
            .map_err(|e| CatalogError::upstream("persist_distribution", e))?;

        Ok(DistributionOutcome {
            assignment,
            location,
        })
    }

    /// Read and rank candidates, closing the session whatever happens
    async fn ranked_users(&self, request: &DistributionRequest) -> CatalogResult<Vec<UserId>> {
        let session = self
            .candidates
            .open()
            .await
            .map_err(|e| CatalogError::upstream("open_candidate_session", e))?;

        let fetched = session.candidates().await;
        let closed = session.close().await;

        match (fetched, closed) {
            (Ok(candidates), Ok(())) => {
                debug!(candidates = candidates.len(), "candidates read");
                Ok(rank_candidates(
                    candidates,
                    &request.excluded_users,
                    request.users_number,
                ))
            }
            (Err(e), closed) => {
                if let Err(close_error) = closed {
                    warn!(error = %close_error, "closing candidate session failed after read failure");
                }
                Err(CatalogError::upstream("read_candidates", e))
            }
            (Ok(_), Err(e)) => Err(CatalogError::upstream("close_candidate_session", e)),
        }
    }
}
