// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! GraphQL documents for the indexer's `nftEntities` connection
//!
//! A document only declares the variables it uses, so an unrestricted exclusion
//! query carries neither `$excludeIds` nor an `id` filter.

use serde::Serialize;
use serde_json::{Map, Value, json};
use source_client::{IdFilter, NodeQuery};

/// Fields fetched for a full node
const NODE_FIELDS: &str = "id serieId owner creator listed price marketplaceId nftIpfs createdAt";

/// Fields fetched for an id-only listing
const ID_FIELDS: &str = "id";

/// Ordering applied to every listing so windows are stable across calls
const ORDER_BY: &str = "[CREATED_AT_ASC, ID_ASC]";

/// How much of each node a query selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Every consumed node field
    Nodes,
    /// Only the node id
    Ids,
}

impl Selection {
    fn fields(self) -> &'static str {
        match self {
            Self::Nodes => NODE_FIELDS,
            Self::Ids => ID_FIELDS,
        }
    }
}

/// Body of a GraphQL POST request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    /// Query document
    pub query: String,
    /// Values for the variables the document declares
    pub variables: Map<String, Value>,
}

/// Build the request for a node query
pub fn build(query: &NodeQuery, selection: Selection) -> GraphQlRequest {
    let mut declarations = Vec::new();
    let mut filters = Vec::new();
    let mut arguments: Vec<String> = Vec::new();
    let mut variables = Map::new();

    match &query.filter {
        IdFilter::Include(ids) => {
            declarations.push("$ids: [String!]!");
            filters.push("id: { in: $ids }");
            variables.insert("ids".to_string(), json!(ids));
        }
        IdFilter::Exclude(ids) if ids.is_empty() => {}
        IdFilter::Exclude(ids) => {
            declarations.push("$excludeIds: [String!]!");
            filters.push("id: { notIn: $excludeIds }");
            variables.insert("excludeIds".to_string(), json!(ids));
        }
        IdFilter::Serie(serie_id) => {
            declarations.push("$serieId: String!");
            filters.push("serieId: { equalTo: $serieId }");
            variables.insert("serieId".to_string(), json!(serie_id));
        }
    }

    if let Some(listed) = query.listed {
        declarations.push("$listed: Int!");
        filters.push("listed: { equalTo: $listed }");
        variables.insert("listed".to_string(), json!(i32::from(listed)));
    }

    if let Some(window) = query.window {
        declarations.push("$first: Int!");
        declarations.push("$offset: Int!");
        arguments.push("first: $first".to_string());
        arguments.push("offset: $offset".to_string());
        variables.insert("first".to_string(), json!(window.limit));
        variables.insert("offset".to_string(), json!(window.offset));
    }

    if !filters.is_empty() {
        arguments.push(format!("filter: {{ {} }}", filters.join(", ")));
    }
    arguments.push(format!("orderBy: {ORDER_BY}"));

    let declarations = if declarations.is_empty() {
        String::new()
    } else {
        format!("({})", declarations.join(", "))
    };
    let arguments = arguments.join(", ");

    let query = format!(
        "query NftEntities{declarations} {{ nftEntities({arguments}) {{ totalCount pageInfo {{ hasNextPage hasPreviousPage }} nodes {{ {} }} }} }}",
        selection.fields()
    );

    GraphQlRequest { query, variables }
}

/// Minimal query used to probe indexer health
pub fn health_probe() -> GraphQlRequest {
    GraphQlRequest {
        query: "query HealthProbe { nftEntities(first: 1) { totalCount } }".to_string(),
        variables: Map::new(),
    }
}
