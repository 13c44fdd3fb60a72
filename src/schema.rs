//! Spatial schema records produced by the extractor.
//!
//! A [`Schema`] is built once per extraction and treated as immutable
//! afterwards; the filter helpers return new copies rather than mutating in
//! place, so a schema loaded back from a JSON snapshot behaves exactly like a
//! freshly extracted one.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GisError, Result};

/// Root record describing one database's spatial layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub database: String,
    pub host: String,
    pub layer_count: usize,
    pub layers: Vec<Layer>,
}

/// One spatial table or view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub schema: String,
    pub table: String,
    pub qualified_name: String,
    pub geometry: Geometry,
    pub columns: Vec<Column>,
    pub primary_keys: Vec<String>,
    /// Estimate from `pg_class.reltuples`; `-1` when the estimate failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count_estimate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Geometry descriptor from `geometry_columns`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub column: String,
    #[serde(rename = "type")]
    pub geom_type: String,
    pub srid: i32,
}

/// Non-geometry attribute column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Layer {
    /// Qualified name is always recomputed from schema + table
    pub fn qualified(schema: &str, table: &str) -> String {
        format!("{schema}.{table}")
    }

    /// Display label for a row-count estimate (`-1` and absent mean unknown)
    pub fn row_count_label(&self) -> String {
        match self.row_count_estimate {
            Some(n) if n >= 0 => format!("~{n}"),
            _ => "unknown".to_string(),
        }
    }
}

impl Schema {
    /// Keep only layers in the given PostgreSQL schema
    pub fn retain_schema(&self, name: &str) -> Schema {
        let layers: Vec<Layer> = self
            .layers
            .iter()
            .filter(|l| l.schema == name)
            .cloned()
            .collect();
        Schema {
            database: self.database.clone(),
            host: self.host.clone(),
            layer_count: layers.len(),
            layers,
        }
    }

    /// Keep only layers whose qualified name appears in `wanted`
    pub fn retain_layers(&self, wanted: &[String]) -> Schema {
        let layers: Vec<Layer> = self
            .layers
            .iter()
            .filter(|l| wanted.iter().any(|w| w == &l.qualified_name))
            .cloned()
            .collect();
        Schema {
            database: self.database.clone(),
            host: self.host.clone(),
            layer_count: layers.len(),
            layers,
        }
    }

    /// Serialize to pretty JSON (the `--save-schema` format)
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GisError::Generation(format!("Failed to serialize schema: {e}")))
    }

    /// Load a schema snapshot written by `--save-schema`
    pub fn from_json_file(path: &Path) -> Result<Schema> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GisError::Config(format!("Cannot read schema file {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            GisError::Config(format!("Invalid schema JSON in {}: {e}", path.display()))
        })
    }
}

/// Convert a table name to a safe generated-variable name
pub fn safe_var(name: &str) -> String {
    name.replace(['-', ' ', '.'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcels_layer() -> Layer {
        Layer {
            schema: "public".to_string(),
            table: "parcels".to_string(),
            qualified_name: Layer::qualified("public", "parcels"),
            geometry: Geometry {
                column: "geom".to_string(),
                geom_type: "MULTIPOLYGON".to_string(),
                srid: 4326,
            },
            columns: vec![Column {
                name: "parcel_id".to_string(),
                data_type: "integer".to_string(),
                nullable: false,
                max_length: None,
                default: None,
            }],
            primary_keys: vec!["parcel_id".to_string()],
            row_count_estimate: Some(1000),
            comment: None,
        }
    }

    #[test]
    fn test_safe_var_hyphen() {
        assert_eq!(safe_var("road-segments"), "road_segments");
    }

    #[test]
    fn test_safe_var_space_and_dot() {
        assert_eq!(safe_var("my table.v1"), "my_table_v1");
    }

    #[test]
    fn test_safe_var_already_safe() {
        assert_eq!(safe_var("parcels"), "parcels");
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(Layer::qualified("public", "parcels"), "public.parcels");
    }

    #[test]
    fn test_row_count_label_unknown_for_sentinel() {
        let mut layer = parcels_layer();
        layer.row_count_estimate = Some(-1);
        assert_eq!(layer.row_count_label(), "unknown");
        layer.row_count_estimate = None;
        assert_eq!(layer.row_count_label(), "unknown");
    }

    #[test]
    fn test_json_round_trip_preserves_layers() {
        let schema = Schema {
            database: "test_db".to_string(),
            host: "localhost".to_string(),
            layer_count: 1,
            layers: vec![parcels_layer()],
        };
        let json = schema.to_json().unwrap();
        // geometry type is serialized under the "type" key
        assert!(json.contains("\"type\": \"MULTIPOLYGON\""));
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back.layer_count, 1);
        assert_eq!(back.layers[0].qualified_name, "public.parcels");
        assert_eq!(back.layers[0].geometry.srid, 4326);
    }

    #[test]
    fn test_optional_fields_skipped_when_absent() {
        let mut layer = parcels_layer();
        layer.row_count_estimate = None;
        let json = serde_json::to_string(&layer).unwrap();
        assert!(!json.contains("row_count_estimate"));
        assert!(!json.contains("max_length"));
    }

    #[test]
    fn test_retain_schema_recomputes_count() {
        let schema = Schema {
            database: "test_db".to_string(),
            host: "localhost".to_string(),
            layer_count: 1,
            layers: vec![parcels_layer()],
        };
        let filtered = schema.retain_schema("staging");
        assert_eq!(filtered.layer_count, 0);
        assert!(filtered.layers.is_empty());
        // original untouched
        assert_eq!(schema.layer_count, 1);
    }
}
