//! Catalogue loading, filtering and per-map generation tests.
//!
//! The fixture mirrors the five canonical filter cases: Vector/have (kept),
//! Vector/partial (kept), Raster-only (dropped), Vector/todo (dropped),
//! Raster+Vector/have (kept, with a raster TODO note).

use std::path::PathBuf;

use gis_codegen::catalogue::{
    best_field, generate_map_arcpy, generate_map_pyqgis, generate_map_pyt, generate_map_qgs,
    load_catalogue, load_schema_lookup, MapEntry,
};
use gis_codegen::config::DbConfig;
use gis_codegen::error::GisError;
use gis_codegen::schema::{Column, Geometry, Layer, Schema};
use gis_codegen::Operation;

const HEADERS: &str = "map_id,theme,subtheme,title,short_name,objective,key_questions,\
key_indicators,study_scale,unit_of_analysis,classification,data_sources,data_vintage,\
spatial_layer_type,processing_steps,symbology_type,status,owner,priority,effort,\
dependencies,deliverable_format,validation_checks,risks_limitations";

fn write_fixture_catalogue(dir: &tempfile::TempDir) -> PathBuf {
    let rows = [
        // kept: Vector + have
        "M07,Forme urbaine,Gabarits,Hauteurs,hauteurs_test,Obj,Q,I,Quartier,bâtiment,classes,\
         OSM,2024,Vector,processing,choroplèthe (dégradé),have,Liam,High,S,,Layout PDF,\
         \"val1, val2\",risk",
        // kept: Vector + partial
        "M03,Forme urbaine,Occupation,Occupation,occupation_test,Obj,Q,I,Quartier,parcelle,\
         usage,Toronto,2026,Vector,harmoniser,choroplèthe catégoriel,partial,TBD,High,L,,\
         Layout PDF + CSV,check,risk",
        // dropped: Raster only
        "M17,Patrimoine,Histoire,Cartes,cartes_test,Obj,Q,I,Quartier,raster,N/A,Archives,2020,\
         Raster,scanning,série carto,todo,TBD,Low,L,,Layout PDF,check,risk",
        // dropped: Vector but todo
        "M10,Forme urbaine,Bâti,Age,age_test,Obj,Q,I,Quartier,bâtiment,age,Archives,2024,\
         Vector,classify,choroplèthe catégoriel,todo,TBD,Med,L,,Layout PDF,check,risk",
        // kept: Raster/Vector + have
        "M44,Environnement,Végétation,Canopée,canopee_test,Obj,Q,I,Quartier,raster + points,\
         N/A,Ville,2024,Raster/Vector,overlay,choroplèthe + points,have,Liam,High,M,,\
         Layout PDF,check,risk",
    ];
    let content = format!("{HEADERS}\n{}\n", rows.join("\n"));
    let path = dir.path().join("catalogue.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn db_config() -> DbConfig {
    DbConfig {
        host: "localhost".to_string(),
        port: 5432,
        dbname: "test_db".to_string(),
        user: "testuser".to_string(),
        password: String::new(),
    }
}

fn saved_schema() -> Schema {
    Schema {
        database: "test_db".to_string(),
        host: "localhost".to_string(),
        layer_count: 1,
        layers: vec![Layer {
            schema: "public".to_string(),
            table: "hauteurs_test".to_string(),
            qualified_name: "public.hauteurs_test".to_string(),
            geometry: Geometry {
                column: "geom".to_string(),
                geom_type: "MULTIPOLYGON".to_string(),
                srid: 2952,
            },
            columns: vec![
                Column {
                    name: "fid".to_string(),
                    data_type: "integer".to_string(),
                    nullable: false,
                    max_length: None,
                    default: None,
                },
                Column {
                    name: "levels".to_string(),
                    data_type: "integer".to_string(),
                    nullable: true,
                    max_length: None,
                    default: None,
                },
            ],
            primary_keys: vec!["fid".to_string()],
            row_count_estimate: Some(120),
            comment: None,
        }],
    }
}

#[test]
fn test_filter_keeps_exactly_three_of_five() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture_catalogue(&dir);
    let maps = load_catalogue(&path).unwrap();
    assert_eq!(maps.len(), 3);

    let ids: Vec<&str> = maps.iter().map(|m| m.map_id.as_str()).collect();
    assert_eq!(ids, vec!["M07", "M03", "M44"]);
}

#[test]
fn test_filter_cases() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture_catalogue(&dir);
    let maps = load_catalogue(&path).unwrap();

    let m44 = maps.iter().find(|m| m.map_id == "M44").unwrap();
    assert_eq!(m44.spatial_layer_type, "Raster/Vector");
    assert!(m44.has_raster());

    assert!(!maps.iter().any(|m| m.map_id == "M17"), "Raster-only kept");
    assert!(!maps.iter().any(|m| m.map_id == "M10"), "todo status kept");
}

#[test]
fn test_loaded_entries_carry_all_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture_catalogue(&dir);
    let maps = load_catalogue(&path).unwrap();

    let m07 = &maps[0];
    assert_eq!(m07.short_name, "hauteurs_test");
    assert_eq!(m07.theme, "Forme urbaine");
    assert_eq!(m07.symbology_type, "choroplèthe (dégradé)");
    assert_eq!(m07.owner, "Liam");
    assert_eq!(m07.validation_checks, "val1, val2");
}

#[test]
fn test_unsupported_extension_is_catalogue_error() {
    let err = load_catalogue(std::path::Path::new("maps.ods")).unwrap_err();
    assert!(matches!(err, GisError::Catalogue(_)));
}

#[test]
fn test_missing_xlsx_is_catalogue_error() {
    let err = load_catalogue(std::path::Path::new("/nonexistent/cat.xlsx")).unwrap_err();
    assert!(matches!(err, GisError::Catalogue(_)));
}

#[test]
fn test_schema_lookup_keyed_by_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    std::fs::write(&path, saved_schema().to_json().unwrap()).unwrap();

    let lookup = load_schema_lookup(&path).unwrap();
    assert!(lookup.contains_key("hauteurs_test"));
    assert_eq!(lookup["hauteurs_test"].geometry.srid, 2952);
}

#[test]
fn test_best_field_prefers_requested_type_class() {
    let schema = saved_schema();
    let layer = &schema.layers[0];
    // fid is the primary key, levels is the first eligible numeric column
    assert_eq!(best_field(Some(layer), true), "levels");
    // no text column available
    assert_eq!(best_field(Some(layer), false), "value");
}

#[test]
fn test_map_pyqgis_enriched_with_schema_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture_catalogue(&dir);
    let maps = load_catalogue(&path).unwrap();
    let mut m07 = maps[0].clone();
    m07.classification = String::new();

    let schema = saved_schema();
    let layer = &schema.layers[0];
    let code = generate_map_pyqgis(&m07, &db_config(), &[], Some(layer));
    // graduated renderer picks the schema's numeric column over "value"
    assert!(code.contains(r#"GRAD_FIELD_hauteurs_test = "levels""#));
}

#[test]
fn test_map_pyqgis_without_schema_uses_placeholder() {
    let entry = MapEntry {
        map_id: "M07".to_string(),
        short_name: "hauteurs_test".to_string(),
        symbology_type: "choroplèthe (dégradé)".to_string(),
        status: "have".to_string(),
        spatial_layer_type: "Vector".to_string(),
        ..MapEntry::default()
    };
    let code = generate_map_pyqgis(&entry, &db_config(), &[], None);
    assert!(code.contains(r#"GRAD_FIELD_hauteurs_test = "value""#));
}

#[test]
fn test_map_pyqgis_op_blocks_use_schema_columns() {
    let entry = MapEntry {
        short_name: "hauteurs_test".to_string(),
        status: "have".to_string(),
        spatial_layer_type: "Vector".to_string(),
        ..MapEntry::default()
    };
    let schema = saved_schema();
    let code = generate_map_pyqgis(
        &entry,
        &db_config(),
        &[Operation::Select],
        Some(&schema.layers[0]),
    );
    assert!(code.contains(r#"selectByExpression('"fid" IS NOT NULL')"#));
}

#[test]
fn test_map_arcpy_header_and_sde() {
    let entry = MapEntry {
        map_id: "M03".to_string(),
        title: "Occupation".to_string(),
        short_name: "occupation_test".to_string(),
        symbology_type: "choroplèthe catégoriel".to_string(),
        status: "partial".to_string(),
        spatial_layer_type: "Vector".to_string(),
        ..MapEntry::default()
    };
    let code = generate_map_arcpy(&entry, &db_config(), &[], None);
    assert!(code.contains("Map ID    : M03"));
    assert!(code.contains(r#"fc_occupation_test = os.path.join(SDE_FILE, "public.occupation_test")"#));
    assert!(code.contains("UniqueValueRenderer"));
    assert!(code.contains("aprx.save()"));
    assert!(code.contains(r#"os.environ["PGPASSWORD"]"#));
}

#[test]
fn test_map_qgs_and_pyt_ignore_ops_and_need_no_password() {
    let entry = MapEntry {
        map_id: "M44".to_string(),
        short_name: "canopee_test".to_string(),
        status: "have".to_string(),
        spatial_layer_type: "Raster/Vector".to_string(),
        ..MapEntry::default()
    };
    let db = db_config();

    let xml = generate_map_qgs(&entry, &db, &[Operation::Buffer], None);
    assert!(xml.contains("<layername>canopee_test</layername>"));
    assert!(!xml.contains("native:buffer"));

    let toolbox = generate_map_pyt(&entry, &db, &[Operation::Buffer], None);
    assert!(toolbox.contains(r#"("public", "canopee_test"),"#));
    assert!(!toolbox.contains("native:buffer"));
    assert!(toolbox.contains(r#"datatype="GPStringHidden""#));
}

#[test]
fn test_generated_filenames_would_be_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture_catalogue(&dir);
    let maps = load_catalogue(&path).unwrap();
    let names: Vec<String> = maps
        .iter()
        .map(|m| format!("{}_{}.py", m.map_id, m.short_name))
        .collect();
    assert_eq!(
        names,
        vec![
            "M07_hauteurs_test.py",
            "M03_occupation_test.py",
            "M44_canopee_test.py"
        ]
    );
}
