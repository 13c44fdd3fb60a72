//! Template and composition-layout integration with the script generators.

use std::collections::HashMap;

use gis_codegen::config::DbConfig;
use gis_codegen::generator::{arcpy, pyqgis};
use gis_codegen::layout::{CompositionLayout, TemplateConfig};
use gis_codegen::schema::{Column, Geometry, Layer, Schema};
use gis_codegen::Operation;

fn db_config() -> DbConfig {
    DbConfig {
        host: "localhost".to_string(),
        port: 5432,
        dbname: "test_db".to_string(),
        user: "testuser".to_string(),
        password: "testpass".to_string(),
    }
}

fn sample_schema() -> Schema {
    let make = |table: &str, geom_type: &str| Layer {
        schema: "public".to_string(),
        table: table.to_string(),
        qualified_name: Layer::qualified("public", table),
        geometry: Geometry {
            column: "geom".to_string(),
            geom_type: geom_type.to_string(),
            srid: 4326,
        },
        columns: vec![Column {
            name: "fid".to_string(),
            data_type: "integer".to_string(),
            nullable: false,
            max_length: None,
            default: None,
        }],
        primary_keys: vec!["fid".to_string()],
        row_count_estimate: Some(10),
        comment: None,
    };
    Schema {
        database: "test_db".to_string(),
        host: "localhost".to_string(),
        layer_count: 2,
        layers: vec![make("parcels", "MULTIPOLYGON"), make("roads", "MULTILINESTRING")],
    }
}

fn template_from(toml_src: &str) -> TemplateConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.toml");
    std::fs::write(&path, toml_src).unwrap();
    TemplateConfig::from_toml_file(&path).unwrap()
}

#[test]
fn test_pyqgis_injects_preamble_and_imports() {
    let template = template_from(
        "[custom]\npreamble = \"# === project header ===\"\nextra_imports = \"import json\"\n",
    );
    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], Some(&template), None);
    assert!(code.contains("# === project header ==="));
    assert!(code.contains("import json"));
    // preamble comes after the DB constants, before the first layer block
    let preamble_at = code.find("# === project header ===").unwrap();
    let first_layer_at = code.find("uri_parcels").unwrap();
    assert!(preamble_at < first_layer_at);
}

#[test]
fn test_pyqgis_per_layer_prefix_substitutes_placeholders() {
    let template = template_from(
        "[custom]\nper_layer_prefix = \"# next: {qualified_name} ({table})\"\n",
    );
    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], Some(&template), None);
    assert!(code.contains("# next: public.parcels (parcels)"));
    assert!(code.contains("# next: public.roads (roads)"));
}

#[test]
fn test_pyqgis_toggles_sample_rows() {
    let on = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], None, None);
    assert!(on.contains("# --- Sample: iterate first 5 features ---"));

    let template = template_from("[sections]\ninclude_sample_rows = false\n");
    let off = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], Some(&template), None);
    assert!(!off.contains("# --- Sample: iterate first 5 features ---"));
}

#[test]
fn test_pyqgis_toggles_crs_info_and_field_list() {
    let template = template_from(
        "[sections]\ninclude_crs_info = false\ninclude_field_list = false\n",
    );
    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], Some(&template), None);
    assert!(!code.contains("crs = lyr_parcels.crs()"));
    assert!(!code.contains("fields = [f.name() for f in lyr_parcels.fields()]"));
    // the load itself still happens
    assert!(code.contains("lyr_parcels = QgsVectorLayer"));
}

#[test]
fn test_arcpy_injects_preamble_and_toggles_sample_rows() {
    let template = template_from(
        "[custom]\npreamble = \"# arc header\"\n\n[sections]\ninclude_sample_rows = false\n",
    );
    let code = arcpy::generate_arcpy(&sample_schema(), &db_config(), &[], Some(&template), None);
    assert!(code.contains("# arc header"));
    assert!(!code.contains("# --- Sample: iterate first 5 rows ---"));
}

#[test]
fn test_teardown_injected_before_cleanup() {
    let template = template_from("[custom]\nteardown = \"# custom teardown\"\n");
    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], Some(&template), None);
    let teardown_at = code.find("# custom teardown").unwrap();
    let exit_at = code.find("qgs.exitQgis()").unwrap();
    assert!(teardown_at < exit_at);
}

#[test]
fn test_per_layer_ops_override_global_set() {
    let mut per_layer = HashMap::new();
    per_layer.insert("public.parcels".to_string(), vec![Operation::Extrude]);

    let code = pyqgis::generate_pyqgis(
        &sample_schema(),
        &db_config(),
        &[Operation::Buffer],
        None,
        Some(&per_layer),
    );
    // parcels gets its own set, roads falls back to the global one
    assert!(code.contains("_sym3d_parcels"));
    assert!(!code.contains("_buf_parcels"));
    assert!(code.contains("_buf_roads"));
    assert!(!code.contains("_sym3d_roads"));
}

#[test]
fn test_per_layer_ops_trigger_processing_import() {
    // global set has no processing op, but the per-layer one does
    let mut per_layer = HashMap::new();
    per_layer.insert("public.roads".to_string(), vec![Operation::Dissolve]);

    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], None, Some(&per_layer));
    assert!(code.contains("from qgis import processing"));
    assert!(code.contains("_diss_roads"));
}

#[test]
fn test_layout_filters_schema_before_generation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.toml");
    std::fs::write(
        &path,
        "name = \"roads only\"\nplatform = \"pyqgis\"\n\n[[layers]]\ntable = \"roads\"\noperations = [\"centroid\"]\n",
    )
    .unwrap();

    let layout = CompositionLayout::from_toml_file(&path).unwrap();
    let filtered = layout.filter_schema(&sample_schema());
    assert_eq!(filtered.layer_count, 1);

    let per_layer = layout.per_layer_ops();
    let code = pyqgis::generate_pyqgis(&filtered, &db_config(), &[], None, Some(&per_layer));
    assert!(code.contains("lyr_roads"));
    assert!(!code.contains("lyr_parcels"));
    assert!(code.contains("_cent_roads"));
}
