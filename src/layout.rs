//! Template and composition layout files (TOML).
//!
//! Two override mechanisms for the script generators:
//!
//! * [`TemplateConfig`] injects custom text fragments (preamble, extra
//!   imports, per-layer prefix/suffix, teardown) and toggles the diagnostic
//!   sections of each per-layer block.
//! * [`CompositionLayout`] restricts and reorders the layer list and assigns
//!   per-layer operation sets; it can also supply the platform and output
//!   path when the CLI left them unset.
//!
//! Both are loaded once and applied once.

use serde::Deserialize;
use std::path::Path;

use crate::error::{GisError, Result};
use crate::generator::{Operation, PerLayerOps, Platform};
use crate::schema::Schema;

/// Reusable script template configuration
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    pub name: String,
    pub preamble: Option<String>,
    pub extra_imports: Option<String>,
    pub per_layer_prefix: Option<String>,
    pub per_layer_suffix: Option<String>,
    pub teardown: Option<String>,
    pub include_sample_rows: bool,
    pub include_crs_info: bool,
    pub include_field_list: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            name: String::new(),
            preamble: None,
            extra_imports: None,
            per_layer_prefix: None,
            per_layer_suffix: None,
            teardown: None,
            include_sample_rows: true,
            include_crs_info: true,
            include_field_list: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    custom: CustomSection,
    #[serde(default)]
    sections: SectionToggles,
}

#[derive(Debug, Default, Deserialize)]
struct CustomSection {
    preamble: Option<String>,
    extra_imports: Option<String>,
    per_layer_prefix: Option<String>,
    per_layer_suffix: Option<String>,
    teardown: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SectionToggles {
    include_sample_rows: Option<bool>,
    include_crs_info: Option<bool>,
    include_field_list: Option<bool>,
}

impl TemplateConfig {
    /// Load a template from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `GisError::Template` when the file is missing or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<TemplateConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GisError::Template(format!("Template file not found: {} ({e})", path.display()))
        })?;
        let raw: TemplateFile = toml::from_str(&content)
            .map_err(|e| GisError::Template(format!("Invalid TOML in {}: {e}", path.display())))?;

        Ok(TemplateConfig {
            name: raw.name,
            preamble: raw.custom.preamble,
            extra_imports: raw.custom.extra_imports,
            per_layer_prefix: raw.custom.per_layer_prefix,
            per_layer_suffix: raw.custom.per_layer_suffix,
            teardown: raw.custom.teardown,
            include_sample_rows: raw.sections.include_sample_rows.unwrap_or(true),
            include_crs_info: raw.sections.include_crs_info.unwrap_or(true),
            include_field_list: raw.sections.include_field_list.unwrap_or(true),
        })
    }

    /// Substitute `{table}`, `{schema}` and `{qualified_name}` in a fragment
    pub fn substitute_placeholders(
        &self,
        text: &str,
        table: &str,
        schema: &str,
        qualified_name: &str,
    ) -> String {
        text.replace("{table}", table)
            .replace("{schema}", schema)
            .replace("{qualified_name}", qualified_name)
    }
}

/// Layer composition and per-layer operation config
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompositionLayout {
    #[serde(default)]
    pub name: String,
    pub platform: Option<Platform>,
    pub output: Option<String>,
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerSpec {
    pub table: String,
    pub operations: Option<Vec<Operation>>,
}

impl CompositionLayout {
    /// Load a composition layout from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `GisError::Template` when the file is missing or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<CompositionLayout> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GisError::Template(format!("Layout file not found: {} ({e})", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| GisError::Template(format!("Invalid TOML in {}: {e}", path.display())))
    }

    /// Return a new schema containing only the layout's layers, in layout
    /// order. Tables the schema does not know are warned about and skipped.
    pub fn filter_schema(&self, schema: &Schema) -> Schema {
        let mut layers = Vec::with_capacity(self.layers.len());
        for spec in &self.layers {
            match schema.layers.iter().find(|l| l.table == spec.table) {
                Some(layer) => layers.push(layer.clone()),
                None => {
                    log::warn!(
                        "Layout specifies layer {} but it is not in the schema",
                        spec.table
                    );
                }
            }
        }
        Schema {
            database: schema.database.clone(),
            host: schema.host.clone(),
            layer_count: layers.len(),
            layers,
        }
    }

    /// Map qualified layer names to their layout-assigned operations.
    /// A bare table name is assumed to live in the `public` schema.
    pub fn per_layer_ops(&self) -> PerLayerOps {
        let mut ops_map = PerLayerOps::new();
        for spec in &self.layers {
            if let Some(ops) = &spec.operations {
                if ops.is_empty() {
                    continue;
                }
                let qualified_name = if spec.table.contains('.') {
                    spec.table.clone()
                } else {
                    format!("public.{}", spec.table)
                };
                ops_map.insert(qualified_name, ops.clone());
            }
        }
        ops_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Geometry, Layer};

    fn two_layer_schema() -> Schema {
        let make = |table: &str| Layer {
            schema: "public".to_string(),
            table: table.to_string(),
            qualified_name: Layer::qualified("public", table),
            geometry: Geometry {
                column: "geom".to_string(),
                geom_type: "MULTIPOLYGON".to_string(),
                srid: 4326,
            },
            columns: Vec::<Column>::new(),
            primary_keys: vec![],
            row_count_estimate: None,
            comment: None,
        };
        Schema {
            database: "test_db".to_string(),
            host: "localhost".to_string(),
            layer_count: 2,
            layers: vec![make("parcels"), make("roads")],
        }
    }

    #[test]
    fn test_template_loads_all_fields() {
        let toml_src = r#"
name = "verbose"

[custom]
preamble = "# project header"
extra_imports = "import json"
per_layer_prefix = "# before {table}"
per_layer_suffix = "# after {qualified_name}"
teardown = "# bye"

[sections]
include_sample_rows = false
include_crs_info = true
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.toml");
        std::fs::write(&path, toml_src).unwrap();

        let template = TemplateConfig::from_toml_file(&path).unwrap();
        assert_eq!(template.name, "verbose");
        assert_eq!(template.preamble.as_deref(), Some("# project header"));
        assert!(!template.include_sample_rows);
        assert!(template.include_crs_info);
        // unspecified toggles default to true
        assert!(template.include_field_list);
    }

    #[test]
    fn test_template_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.toml");
        std::fs::write(&path, "[custom]\npreamble = \"# p\"\n").unwrap();

        let template = TemplateConfig::from_toml_file(&path).unwrap();
        assert!(template.name.is_empty());
        assert!(template.extra_imports.is_none());
        assert!(template.include_sample_rows);
    }

    #[test]
    fn test_template_missing_file_errors() {
        let err = TemplateConfig::from_toml_file(Path::new("/nonexistent/t.toml")).unwrap_err();
        assert!(matches!(err, GisError::Template(_)));
    }

    #[test]
    fn test_template_invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[custom\npreamble=").unwrap();
        let err = TemplateConfig::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, GisError::Template(_)));
    }

    #[test]
    fn test_substitute_placeholders() {
        let template = TemplateConfig::default();
        let out = template.substitute_placeholders(
            "load {table} from {schema} as {qualified_name}",
            "parcels",
            "public",
            "public.parcels",
        );
        assert_eq!(out, "load parcels from public as public.parcels");
    }

    #[test]
    fn test_substitute_placeholders_no_matches() {
        let template = TemplateConfig::default();
        assert_eq!(
            template.substitute_placeholders("plain text", "t", "s", "q"),
            "plain text"
        );
    }

    #[test]
    fn test_layout_filters_and_reorders() {
        let layout = CompositionLayout {
            name: "roads first".to_string(),
            platform: None,
            output: None,
            layers: vec![
                LayerSpec {
                    table: "roads".to_string(),
                    operations: None,
                },
                LayerSpec {
                    table: "parcels".to_string(),
                    operations: None,
                },
            ],
        };
        let filtered = layout.filter_schema(&two_layer_schema());
        assert_eq!(filtered.layer_count, 2);
        assert_eq!(filtered.layers[0].table, "roads");
        assert_eq!(filtered.layers[1].table, "parcels");
    }

    #[test]
    fn test_layout_skips_unknown_tables() {
        let layout = CompositionLayout {
            layers: vec![LayerSpec {
                table: "ghosts".to_string(),
                operations: None,
            }],
            ..CompositionLayout::default()
        };
        let filtered = layout.filter_schema(&two_layer_schema());
        assert_eq!(filtered.layer_count, 0);
    }

    #[test]
    fn test_empty_layout_yields_empty_schema() {
        let layout = CompositionLayout::default();
        let filtered = layout.filter_schema(&two_layer_schema());
        assert_eq!(filtered.layer_count, 0);
        assert!(filtered.layers.is_empty());
    }

    #[test]
    fn test_per_layer_ops_qualifies_bare_tables() {
        let layout = CompositionLayout {
            layers: vec![
                LayerSpec {
                    table: "parcels".to_string(),
                    operations: Some(vec![Operation::Buffer, Operation::Extrude]),
                },
                LayerSpec {
                    table: "staging.roads".to_string(),
                    operations: Some(vec![Operation::Centroid]),
                },
                LayerSpec {
                    table: "plain".to_string(),
                    operations: None,
                },
            ],
            ..CompositionLayout::default()
        };
        let ops = layout.per_layer_ops();
        assert_eq!(
            ops.get("public.parcels"),
            Some(&vec![Operation::Buffer, Operation::Extrude])
        );
        assert_eq!(ops.get("staging.roads"), Some(&vec![Operation::Centroid]));
        assert!(!ops.contains_key("public.plain"));
    }

    #[test]
    fn test_layout_toml_parses_operations() {
        let toml_src = r#"
name = "massing"
platform = "pyqgis"
output = "massing.py"

[[layers]]
table = "buildings"
operations = ["extrude", "z_stats"]

[[layers]]
table = "roads"
"#;
        let layout: CompositionLayout = toml::from_str(toml_src).unwrap();
        assert_eq!(layout.platform, Some(Platform::Pyqgis));
        assert_eq!(layout.output.as_deref(), Some("massing.py"));
        assert_eq!(layout.layers.len(), 2);
        assert_eq!(
            layout.layers[0].operations,
            Some(vec![Operation::Extrude, Operation::ZStats])
        );
        assert!(layout.layers[1].operations.is_none());
    }
}
