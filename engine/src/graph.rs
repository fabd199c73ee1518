//! Relationship graph inference.
//!
//! Four catalog queries each discover one relationship kind. Their edges are
//! merged, grouped by source table and fused onto the enumerated storage
//! units of the schema.

use std::collections::{HashMap, HashSet};

use common::errors::AppResult;
use common::models::{GraphUnit, GraphUnitRelationship, RelationEdge, RelationshipKind, StorageUnit};

use crate::catalog::list_storage_units;
use crate::session::{collect_rows, text_at, CatalogSession, ParamValue, Statement};

/// One catalog query and the kind every row it returns is tagged with.
///
/// Each query selects `(from_table, to_table)` and binds the schema as `$1`.
pub struct RelationQuery {
    pub name: &'static str,
    pub sql: &'static str,
    pub kind: RelationshipKind,
}

pub const FOREIGN_KEYS: RelationQuery = RelationQuery {
    name: "foreign_keys",
    kind: RelationshipKind::OneToMany,
    sql: "
SELECT DISTINCT
    tc.table_name::text AS from_table,
    ccu.table_name::text AS to_table
FROM information_schema.table_constraints AS tc
JOIN information_schema.key_column_usage AS kcu
    ON tc.constraint_name = kcu.constraint_name
    AND tc.constraint_schema = kcu.constraint_schema
JOIN information_schema.constraint_column_usage AS ccu
    ON ccu.constraint_name = tc.constraint_name
    AND ccu.constraint_schema = tc.constraint_schema
WHERE tc.constraint_type = 'FOREIGN KEY'
    AND tc.table_schema = $1
    AND ccu.table_schema = $1",
};

pub const PRIMARY_KEY_CHAINS: RelationQuery = RelationQuery {
    name: "primary_key_chains",
    kind: RelationshipKind::OneToOne,
    sql: "
SELECT DISTINCT
    tc.table_name::text AS from_table,
    ccu.table_name::text AS to_table
FROM information_schema.table_constraints AS tc
JOIN information_schema.key_column_usage AS kcu
    ON tc.constraint_name = kcu.constraint_name
    AND tc.constraint_schema = kcu.constraint_schema
JOIN information_schema.constraint_column_usage AS ccu
    ON ccu.constraint_name = tc.constraint_name
    AND ccu.constraint_schema = tc.constraint_schema
WHERE tc.constraint_type = 'PRIMARY KEY'
    AND tc.table_schema = $1
    AND ccu.table_schema = $1
    AND tc.table_name != ccu.table_name",
};

pub const UNIQUE_CONSTRAINTS: RelationQuery = RelationQuery {
    name: "unique_constraints",
    kind: RelationshipKind::ManyToOne,
    sql: "
SELECT DISTINCT
    tc.table_name::text AS from_table,
    ccu.table_name::text AS to_table
FROM information_schema.table_constraints AS tc
JOIN information_schema.key_column_usage AS kcu
    ON tc.constraint_name = kcu.constraint_name
    AND tc.constraint_schema = kcu.constraint_schema
JOIN information_schema.constraint_column_usage AS ccu
    ON ccu.constraint_name = tc.constraint_name
    AND ccu.constraint_schema = tc.constraint_schema
WHERE tc.constraint_type = 'UNIQUE'
    AND tc.table_schema = $1
    AND ccu.table_schema = $1
    AND tc.table_name != ccu.table_name",
};

pub const JUNCTIONS: RelationQuery = RelationQuery {
    name: "junctions",
    kind: RelationshipKind::ManyToMany,
    sql: "
SELECT DISTINCT
    kcu1.table_name::text AS from_table,
    kcu2.table_name::text AS to_table
FROM information_schema.key_column_usage AS kcu1
JOIN information_schema.referential_constraints AS rc
    ON kcu1.constraint_name = rc.constraint_name
    AND kcu1.constraint_schema = rc.constraint_schema
JOIN information_schema.key_column_usage AS kcu2
    ON kcu2.constraint_name = rc.unique_constraint_name
    AND kcu2.constraint_schema = rc.unique_constraint_schema
WHERE kcu1.ordinal_position = 1
    AND kcu2.ordinal_position = 2
    AND kcu1.table_schema = $1
    AND kcu2.table_schema = $1",
};

async fn run_relation_query(
    session: &mut dyn CatalogSession,
    query: &RelationQuery,
    schema: &str,
) -> AppResult<Vec<RelationEdge>> {
    let statement = Statement::new(query.sql).bind("schema", ParamValue::Text(schema.to_string()));
    let rows = collect_rows(session, &statement).await?;

    let edges = rows
        .iter()
        .map(|row| Ok(RelationEdge::new(text_at(row, 0)?, text_at(row, 1)?, query.kind)))
        .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(schema, query = query.name, edges = edges.len(), "relation query finished");
    Ok(edges)
}

/// Referencing table to referenced table, `OneToMany`.
pub async fn foreign_key_edges(
    session: &mut dyn CatalogSession,
    schema: &str,
) -> AppResult<Vec<RelationEdge>> {
    run_relation_query(session, &FOREIGN_KEYS, schema).await
}

/// Primary keys shared across two tables, `OneToOne`.
pub async fn primary_key_edges(
    session: &mut dyn CatalogSession,
    schema: &str,
) -> AppResult<Vec<RelationEdge>> {
    run_relation_query(session, &PRIMARY_KEY_CHAINS, schema).await
}

/// Unique constraints referencing another table, `ManyToOne`.
pub async fn unique_edges(
    session: &mut dyn CatalogSession,
    schema: &str,
) -> AppResult<Vec<RelationEdge>> {
    run_relation_query(session, &UNIQUE_CONSTRAINTS, schema).await
}

/// Tables linked through a two-column referential constraint, `ManyToMany`.
pub async fn junction_edges(
    session: &mut dyn CatalogSession,
    schema: &str,
) -> AppResult<Vec<RelationEdge>> {
    run_relation_query(session, &JUNCTIONS, schema).await
}

/// Runs the four relation queries one after another on `session`.
pub async fn discover_edges(
    session: &mut dyn CatalogSession,
    schema: &str,
) -> AppResult<Vec<Vec<RelationEdge>>> {
    Ok(vec![
        foreign_key_edges(session, schema).await?,
        primary_key_edges(session, schema).await?,
        unique_edges(session, schema).await?,
        junction_edges(session, schema).await?,
    ])
}

/// Set union of edge lists in first-seen order.
pub fn merge_edges(lists: Vec<Vec<RelationEdge>>) -> Vec<RelationEdge> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|edge| seen.insert(edge.clone()))
        .collect()
}

/// Outgoing relations per source table, each list in edge order.
pub fn group_by_source(edges: &[RelationEdge]) -> HashMap<String, Vec<GraphUnitRelationship>> {
    let mut grouped: HashMap<String, Vec<GraphUnitRelationship>> = HashMap::new();
    for edge in edges {
        grouped
            .entry(edge.from_table.clone())
            .or_default()
            .push(GraphUnitRelationship {
                name: edge.to_table.clone(),
                relationship_type: edge.kind,
            });
    }
    grouped
}

/// One node per unit in enumeration order.
///
/// Edges touching a table outside `units` on either end are dropped.
pub fn fuse(units: Vec<StorageUnit>, edges: &[RelationEdge]) -> Vec<GraphUnit> {
    let known: HashSet<&str> = units.iter().map(|u| u.name.as_str()).collect();
    let in_scope: Vec<RelationEdge> = edges
        .iter()
        .filter(|e| known.contains(e.from_table.as_str()) && known.contains(e.to_table.as_str()))
        .cloned()
        .collect();

    let mut grouped = group_by_source(&in_scope);
    units
        .into_iter()
        .map(|unit| {
            let relations = grouped.remove(&unit.name).unwrap_or_default();
            GraphUnit { unit, relations }
        })
        .collect()
}

/// Builds the relationship graph of `schema`, enumerating its units first.
pub async fn get_graph(session: &mut dyn CatalogSession, schema: &str) -> AppResult<Vec<GraphUnit>> {
    let units = list_storage_units(session, schema).await?;
    build_graph(session, schema, units).await
}

/// Builds the graph over an already enumerated unit list.
pub async fn build_graph(
    session: &mut dyn CatalogSession,
    schema: &str,
    units: Vec<StorageUnit>,
) -> AppResult<Vec<GraphUnit>> {
    let edges = merge_edges(discover_edges(session, schema).await?);
    let graph = fuse(units, &edges);

    tracing::info!(
        schema,
        nodes = graph.len(),
        edges = edges.len(),
        "relationship graph built"
    );
    Ok(graph)
}
