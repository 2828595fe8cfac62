// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Collapse indexer nodes sharing a serie into one logical NFT

use std::collections::HashMap;

use shared_types::SerieId;
use source_client::NftNode;

use crate::types::GroupedNft;

/// Group nodes by serie id
///
/// Groups come out in the order their serie first appears, and the first node of
/// each serie is its representative. Standalone nodes (serie `"0"`) are never
/// merged with one another.
pub fn group_by_serie(nodes: Vec<NftNode>) -> Vec<GroupedNft> {
    let mut groups: Vec<GroupedNft> = Vec::with_capacity(nodes.len());
    let mut positions: HashMap<SerieId, usize> = HashMap::new();

    for node in nodes {
        if node.serie_id.is_standalone() {
            groups.push(GroupedNft::seed(node));
            continue;
        }

        if let Some(&position) = positions.get(&node.serie_id) {
            groups[position].absorb(&node);
        } else {
            positions.insert(node.serie_id.clone(), groups.len());
            groups.push(GroupedNft::seed(node));
        }
    }

    groups
}
