//! PostGIS catalog extraction.
//!
//! One query enumerates the registered spatial layers; for each layer three
//! further queries fetch the non-geometry columns, the primary-key columns
//! and (optionally) a row-count estimate. Queries run sequentially per layer;
//! catalogs are small and this is a one-shot reporting operation, not a hot
//! path.

use may_postgres::Client;

use crate::config::DbConfig;
use crate::error::Result;
use crate::schema::{Column, Geometry, Layer, Schema};

/// Row-count value recorded when the estimate query fails
pub const UNKNOWN_ROW_COUNT: i64 = -1;

// geometry_columns covers tables registered via AddGeometryColumn or views
// created with ST_SetSRID.
const SPATIAL_LAYERS_SQL: &str = "\
SELECT
    gc.f_table_schema    AS schema_name,
    gc.f_table_name      AS table_name,
    gc.f_geometry_column AS geom_column,
    gc.type              AS geom_type,
    gc.srid              AS srid,
    obj_description(
        (quote_ident(gc.f_table_schema) || '.' || quote_ident(gc.f_table_name))::regclass,
        'pg_class'
    ) AS table_comment
FROM geometry_columns gc
ORDER BY gc.f_table_schema, gc.f_table_name";

const NON_GEOM_COLUMNS_SQL: &str = "\
SELECT
    c.column_name,
    c.data_type,
    c.character_maximum_length,
    c.is_nullable,
    c.column_default
FROM information_schema.columns c
WHERE c.table_schema = $1
  AND c.table_name   = $2
  AND c.column_name NOT IN (
      SELECT f_geometry_column
      FROM geometry_columns
      WHERE f_table_schema = $1
        AND f_table_name   = $2
  )
ORDER BY c.ordinal_position";

const PRIMARY_KEY_SQL: &str = "\
SELECT kcu.column_name
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON tc.constraint_name = kcu.constraint_name
 AND tc.table_schema    = kcu.table_schema
 AND tc.table_name      = kcu.table_name
WHERE tc.constraint_type = 'PRIMARY KEY'
  AND tc.table_schema    = $1
  AND tc.table_name      = $2
ORDER BY kcu.ordinal_position";

const ROW_COUNT_SQL: &str = "\
SELECT reltuples::bigint AS estimate
FROM pg_class
WHERE oid = (quote_ident($1) || '.' || quote_ident($2))::regclass";

/// Extract the full spatial schema description.
///
/// # Arguments
///
/// * `client` - open connection from [`crate::connection::connect`]
/// * `config` - resolved connection settings (supplies database/host labels)
/// * `include_row_counts` - skip the per-layer estimate query when false
///
/// # Errors
///
/// Returns `GisError::Postgres` when a catalog query fails. A failing
/// row-count estimate is not an error: it logs a warning and records
/// [`UNKNOWN_ROW_COUNT`] for that layer.
pub fn extract_schema(
    client: &Client,
    config: &DbConfig,
    include_row_counts: bool,
) -> Result<Schema> {
    let spatial_rows = client.query(SPATIAL_LAYERS_SQL, &[])?;

    if spatial_rows.is_empty() {
        log::warn!("No spatial layers found in geometry_columns");
    }

    let mut layers = Vec::with_capacity(spatial_rows.len());
    for row in &spatial_rows {
        let schema_name: String = row.get("schema_name");
        let table: String = row.get("table_name");
        let geometry = Geometry {
            column: row.get("geom_column"),
            geom_type: row.get("geom_type"),
            srid: row.get("srid"),
        };
        let comment: Option<String> = row.get("table_comment");

        let columns = fetch_columns(client, &schema_name, &table)?;
        let primary_keys = fetch_primary_keys(client, &schema_name, &table)?;
        let row_count_estimate = if include_row_counts {
            Some(fetch_row_count_estimate(client, &schema_name, &table))
        } else {
            None
        };

        layers.push(Layer {
            qualified_name: Layer::qualified(&schema_name, &table),
            schema: schema_name,
            table,
            geometry,
            columns,
            primary_keys,
            row_count_estimate,
            comment,
        });
    }

    Ok(Schema {
        database: config.dbname.clone(),
        host: config.host.clone(),
        layer_count: layers.len(),
        layers,
    })
}

fn fetch_columns(client: &Client, schema: &str, table: &str) -> Result<Vec<Column>> {
    let rows = client.query(NON_GEOM_COLUMNS_SQL, &[&schema, &table])?;
    let columns = rows
        .iter()
        .map(|row| {
            let is_nullable: String = row.get("is_nullable");
            Column {
                name: row.get("column_name"),
                data_type: row.get("data_type"),
                nullable: is_nullable == "YES",
                max_length: row.get("character_maximum_length"),
                default: row.get("column_default"),
            }
        })
        .collect();
    Ok(columns)
}

fn fetch_primary_keys(client: &Client, schema: &str, table: &str) -> Result<Vec<String>> {
    let rows = client.query(PRIMARY_KEY_SQL, &[&schema, &table])?;
    Ok(rows.iter().map(|row| row.get("column_name")).collect())
}

/// Uses `pg_class` statistics: fast, approximate by design.
fn fetch_row_count_estimate(client: &Client, schema: &str, table: &str) -> i64 {
    match client.query(ROW_COUNT_SQL, &[&schema, &table]) {
        Ok(rows) => rows
            .first()
            .map(|row| row.get::<_, i64>("estimate"))
            .unwrap_or(UNKNOWN_ROW_COUNT),
        Err(e) => {
            log::warn!("Row count estimate failed for {schema}.{table}: {e}");
            UNKNOWN_ROW_COUNT
        }
    }
}
