// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for listings over a fake indexer and the snapshot store

use std::collections::BTreeSet;

use nft_catalog::{
    CatalogError, CatalogSettings, CategorySelection, FailureKind, PopulatedNft,
    UnresolvedCategoryPolicy,
};
use shared_types::{CategoryCode, NftId, SerieId};
use source_client::{IdFilter, SourceError};

mod fixtures;
use fixtures::*;

fn member_ids(nfts: &[PopulatedNft]) -> BTreeSet<NftId> {
    nfts.iter()
        .flat_map(|nft| nft.grouped.serie.serie_members.iter().map(|m| m.id.clone()))
        .collect()
}

fn representative_ids(nfts: &[PopulatedNft]) -> Vec<&str> {
    nfts.iter().map(|nft| nft.id().as_str()).collect()
}

fn codes(values: &[&str]) -> CategorySelection {
    CategorySelection::Codes(
        values
            .iter()
            .map(|v| CategoryCode::new(*v).unwrap())
            .collect(),
    )
}

#[tokio::test]
async fn empty_ids_list_nothing_without_indexer_call() {
    let (indexer, catalog) = catalog();

    let nfts = catalog.get_by_ids(&[], None).await.unwrap();
    assert!(nfts.is_empty());
    assert_eq!(indexer.calls(), 0);
}

#[tokio::test]
async fn by_ids_groups_and_populates() {
    let (_indexer, catalog) = catalog();

    let nfts = catalog
        .get_by_ids(&ids(&["10", "11", "30"]), None)
        .await
        .unwrap();

    assert_eq!(representative_ids(&nfts), vec!["10", "30"]);
    let first = &nfts[0];
    assert_eq!(first.grouped.serie.total_nft, 2);
    assert_eq!(first.grouped.serie.total_listed_nft, 1);
    assert_eq!(first.categories[0].code.as_str(), "art");
    assert_eq!(first.views_count, Some(12));
    assert_eq!(nfts[1].attributes["featured"], serde_json::json!(true));
}

#[tokio::test]
async fn empty_exclusion_is_the_whole_universe() {
    let (indexer, catalog) = catalog();

    let nfts = catalog.get_not_in_ids(&[], None).await.unwrap();

    assert_eq!(member_ids(&nfts).len(), universe().len());
    assert_eq!(
        representative_ids(&nfts),
        vec!["10", "20", "30", "31", "32", "33", "34", "40"]
    );
    assert_eq!(
        indexer.last_query().unwrap().filter,
        IdFilter::Exclude(Vec::new())
    );
}

#[tokio::test]
async fn include_and_exclude_partition_the_universe() {
    let (_indexer, catalog) = catalog();
    let selected = ids(&["10", "21", "31", "40"]);

    for listed in [None, Some(true), Some(false)] {
        let included = member_ids(&catalog.get_by_ids(&selected, listed).await.unwrap());
        let excluded = member_ids(&catalog.get_not_in_ids(&selected, listed).await.unwrap());

        assert!(included.is_disjoint(&excluded));
        let expected: BTreeSet<NftId> = universe()
            .into_iter()
            .filter(|node| listed.is_none_or(|l| node.listed == l))
            .map(|node| node.id)
            .collect();
        assert_eq!(&included | &excluded, expected);
    }
}

#[tokio::test]
async fn listed_filter_reaches_the_indexer() {
    let (indexer, catalog) = catalog();

    let nfts = catalog.get_not_in_ids(&[], Some(true)).await.unwrap();

    assert!(nfts.iter().all(|nft| nft.grouped.nft.listed));
    assert_eq!(indexer.last_query().unwrap().listed, Some(true));
}

#[tokio::test]
async fn paginated_total_count_is_stable_across_pages() {
    let (_indexer, catalog) = catalog();
    let excluded = ids(&["33"]);

    let mut seen = BTreeSet::new();
    for page in 1..=4 {
        let result = catalog
            .get_not_in_ids_paginated(&excluded, None, page, 3)
            .await
            .unwrap();

        assert_eq!(result.total_count, 10);
        assert_eq!(result.has_previous_page, page > 1);
        assert_eq!(result.has_next_page, page < 4);
        seen.extend(member_ids(&result.data));
    }
    assert_eq!(seen.len(), 10);
}

#[tokio::test]
async fn paginated_window_is_validated() {
    let settings = CatalogSettings {
        max_page_limit: 5,
        ..CatalogSettings::default()
    };
    let (indexer, catalog) = catalog_with(settings);

    let error = catalog
        .get_not_in_ids_paginated(&[], None, 1, 6)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), FailureKind::InvalidInput);

    let error = catalog
        .get_not_in_ids_paginated(&[], None, 0, 5)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), FailureKind::InvalidInput);
    assert_eq!(indexer.calls(), 0);
}

#[tokio::test]
async fn category_branches_are_exclusive() {
    let (_indexer, catalog) = catalog();

    let uncategorized = catalog
        .get_by_categories(&CategorySelection::Uncategorized, None)
        .await
        .unwrap();
    let categorized = catalog
        .get_by_categories(&codes(&["art", "photo"]), None)
        .await
        .unwrap();

    let uncategorized = member_ids(&uncategorized.nfts);
    let categorized = member_ids(&categorized.nfts);
    assert!(uncategorized.is_disjoint(&categorized));
    assert_eq!(
        categorized,
        ids(&["10", "20", "30", "32", "33"]).into_iter().collect()
    );
    assert_eq!(
        uncategorized,
        ids(&["11", "12", "21", "31", "34", "40"])
            .into_iter()
            .collect()
    );
}

#[tokio::test]
async fn unknown_codes_are_reported_next_to_results() {
    let (_indexer, catalog) = catalog();

    let listing = catalog
        .get_by_categories(&codes(&["photo", "music"]), None)
        .await
        .unwrap();

    assert_eq!(representative_ids(&listing.nfts), vec!["20", "32"]);
    assert_eq!(listing.unresolved_categories.len(), 1);
    assert_eq!(listing.unresolved_categories[0].as_str(), "music");
}

#[tokio::test]
async fn only_unknown_codes_yield_nothing_without_indexer_call() {
    let (indexer, catalog) = catalog();

    let listing = catalog
        .get_by_categories(&codes(&["music"]), None)
        .await
        .unwrap();

    assert!(listing.nfts.is_empty());
    assert_eq!(indexer.calls(), 0);
}

#[tokio::test]
async fn rejecting_policy_fails_listing() {
    let settings = CatalogSettings {
        unresolved_categories: UnresolvedCategoryPolicy::Reject,
        ..CatalogSettings::default()
    };
    let (indexer, catalog) = catalog_with(settings);

    let error = catalog
        .get_by_categories_paginated(&codes(&["art", "music"]), None, 1, 10)
        .await
        .unwrap_err();

    assert!(matches!(error, CatalogError::UnresolvedCategories { .. }));
    assert_eq!(error.kind(), FailureKind::MissingEntity);
    assert_eq!(indexer.calls(), 0);
}

#[tokio::test]
async fn code_pages_take_metadata_from_local_store() {
    let (indexer, catalog) = catalog();

    // Art documents in store order: 10, 30, 32, 33, 99
    let second = catalog
        .get_by_categories_paginated(&codes(&["art"]), None, 2, 2)
        .await
        .unwrap();
    assert_eq!(representative_ids(&second.nfts.data), vec!["32", "33"]);
    assert_eq!(second.nfts.total_count, 5);
    assert!(second.nfts.has_next_page);
    assert!(second.nfts.has_previous_page);
    let query = indexer.last_query().unwrap();
    assert_eq!(query.filter, IdFilter::Include(ids(&["32", "33"])));
    assert_eq!(query.window, None);

    // Document 99 is unknown to the indexer
    let third = catalog
        .get_by_categories_paginated(&codes(&["art"]), None, 3, 2)
        .await
        .unwrap();
    assert!(third.nfts.data.is_empty());
    assert_eq!(third.nfts.total_count, 5);
    assert!(!third.nfts.has_next_page);
    assert!(third.nfts.has_previous_page);
}

#[tokio::test]
async fn uncategorized_pages_take_metadata_from_indexer() {
    let (indexer, catalog) = catalog();

    let first = catalog
        .get_by_categories_paginated(&CategorySelection::Uncategorized, None, 1, 4)
        .await
        .unwrap();

    assert_eq!(first.nfts.total_count, 6);
    assert!(first.nfts.has_next_page);
    let query = indexer.last_query().unwrap();
    assert!(matches!(query.filter, IdFilter::Exclude(ref excluded) if excluded.len() == 6));
    assert_eq!(query.window.map(|w| (w.limit, w.offset)), Some((4, 0)));
}

#[tokio::test]
async fn series_lookups_pass_through() {
    let (_indexer, catalog) = catalog();
    let serie_id = SerieId::new("S1").unwrap();

    let nodes = catalog.get_series(&serie_id).await.unwrap();
    assert_eq!(nodes.data.len(), 3);
    assert_eq!(nodes.total_count, 3);

    let serie_ids = catalog.get_serie_ids(&serie_id).await.unwrap();
    assert_eq!(serie_ids.data, ids(&["10", "11", "12"]));
}

#[tokio::test]
async fn upstream_failures_keep_their_cause() {
    let (indexer, catalog) = catalog();
    indexer.fail_with(|| SourceError::ServiceUnavailable {
        message: "indexer restarting".to_string(),
    });

    let error = catalog.get_not_in_ids(&[], None).await.unwrap_err();

    assert_eq!(error.kind(), FailureKind::UpstreamUnavailable);
    assert!(error.is_transient());
    assert!(error.to_string().starts_with("could not get NFTs"));
    assert!(matches!(
        error.upstream_cause(),
        Some(SourceError::ServiceUnavailable { .. })
    ));
}
