//! Generator output tests against a fixed two-layer schema fixture
//! (polygon parcels + line roads).

use gis_codegen::config::DbConfig;
use gis_codegen::generator::qgs::layer_id;
use gis_codegen::generator::{arcpy, export, pyqgis, pyt, qgs, webmap};
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

fn column(name: &str, data_type: &str, nullable: bool) -> Column {
    Column {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable,
        max_length: None,
        default: None,
    }
}

fn sample_schema() -> Schema {
    Schema {
        database: "test_db".to_string(),
        host: "localhost".to_string(),
        layer_count: 2,
        layers: vec![
            Layer {
                schema: "public".to_string(),
                table: "parcels".to_string(),
                qualified_name: "public.parcels".to_string(),
                geometry: Geometry {
                    column: "geom".to_string(),
                    geom_type: "MULTIPOLYGON".to_string(),
                    srid: 4326,
                },
                columns: vec![
                    column("parcel_id", "integer", false),
                    column("address", "character varying", true),
                    column("height", "double precision", true),
                ],
                primary_keys: vec!["parcel_id".to_string()],
                row_count_estimate: Some(1000),
                comment: None,
            },
            Layer {
                schema: "public".to_string(),
                table: "roads".to_string(),
                qualified_name: "public.roads".to_string(),
                geometry: Geometry {
                    column: "geom".to_string(),
                    geom_type: "MULTILINESTRING".to_string(),
                    srid: 4326,
                },
                columns: vec![column("road_id", "integer", false), column("name", "text", true)],
                primary_keys: vec!["road_id".to_string()],
                row_count_estimate: Some(500),
                comment: None,
            },
        ],
    }
}

fn empty_schema() -> Schema {
    Schema {
        database: "test_db".to_string(),
        host: "localhost".to_string(),
        layer_count: 0,
        layers: vec![],
    }
}

// --- PyQGIS ----------------------------------------------------------------

#[test]
fn test_pyqgis_db_constants_and_layers() {
    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], None, None);
    assert!(code.contains(r#"DB_HOST     = "localhost""#));
    assert!(code.contains(r#"DB_NAME     = "test_db""#));
    assert!(code.contains(r#"DB_USER     = "testuser""#));
    assert!(code.contains("lyr_parcels"));
    assert!(code.contains("lyr_roads"));
    assert!(code.contains("QgsDataSourceUri()"));
}

#[test]
fn test_pyqgis_init_and_exit_blocks() {
    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], None, None);
    assert!(code.contains("qgs = QgsApplication([], False)"));
    assert!(code.contains("qgs.initQgis()"));
    assert!(code.contains("qgs.exitQgis()"));
}

#[test]
fn test_pyqgis_field_names_in_output() {
    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], None, None);
    assert!(code.contains("parcel_id"));
    assert!(code.contains("address"));
    // type hints rendered in the field comment
    assert!(code.contains("parcel_id (int)"));
    assert!(code.contains("address (str)"));
}

#[test]
fn test_pyqgis_processing_import_injection() {
    let with_buffer =
        pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[Operation::Buffer], None, None);
    assert!(with_buffer.contains("from qgis import processing"));

    let with_reproject = pyqgis::generate_pyqgis(
        &sample_schema(),
        &db_config(),
        &[Operation::Reproject],
        None,
        None,
    );
    assert!(with_reproject.contains("from qgis import processing"));

    let without_ops = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], None, None);
    assert!(!without_ops.contains("from qgis import processing"));

    // export writes through QgsVectorFileWriter, not the processing framework
    let export_only =
        pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[Operation::Export], None, None);
    assert!(!export_only.contains("from qgis import processing"));
}

#[test]
fn test_pyqgis_operation_blocks_included() {
    let code = pyqgis::generate_pyqgis(
        &sample_schema(),
        &db_config(),
        &[Operation::Buffer, Operation::Extrude],
        None,
        None,
    );
    assert!(code.contains(r#"processing.run("native:buffer""#));
    assert!(code.contains("QgsPolygon3DSymbol"));
    // one block per layer
    assert!(code.contains("_buf_parcels"));
    assert!(code.contains("_buf_roads"));
}

#[test]
fn test_pyqgis_no_ops_no_operation_blocks() {
    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], None, None);
    assert!(!code.contains("--- buffer ---"));
    assert!(!code.contains("--- reproject ---"));
}

#[test]
fn test_pyqgis_geometry_comments() {
    let code = pyqgis::generate_pyqgis(&sample_schema(), &db_config(), &[], None, None);
    assert!(code.contains("MULTIPOLYGON"));
    assert!(code.contains("MULTILINESTRING"));
    assert!(code.contains("SRID: 4326"));
}

// --- ArcPy -----------------------------------------------------------------

#[test]
fn test_arcpy_sde_connection_block() {
    let code = arcpy::generate_arcpy(&sample_schema(), &db_config(), &[], None, None);
    assert!(code.contains("arcpy.management.CreateDatabaseConnection"));
    assert!(code.contains(r#"DB_INSTANCE = "localhost,5432""#));
    assert!(code.contains(r#"database_platform="POSTGRESQL""#));
}

#[test]
fn test_arcpy_layers_and_describe() {
    let code = arcpy::generate_arcpy(&sample_schema(), &db_config(), &[], None, None);
    assert!(code.contains("fc_parcels"));
    assert!(code.contains("fc_roads"));
    assert!(code.contains("if arcpy.Exists(fc_parcels):"));
    assert!(code.contains("arcpy.Describe(fc_parcels)"));
}

#[test]
fn test_arcpy_operation_blocks_included() {
    let code = arcpy::generate_arcpy(
        &sample_schema(),
        &db_config(),
        &[Operation::Buffer, Operation::SceneLayer],
        None,
        None,
    );
    assert!(code.contains("arcpy.analysis.Buffer"));
    assert!(code.contains("CreateSceneLayerPackage"));
}

// --- Web maps --------------------------------------------------------------

#[test]
fn test_folium_structure() {
    let code = webmap::generate_folium(&sample_schema(), &db_config());
    assert!(code.contains("import folium"));
    assert!(code.contains("import geopandas as gpd"));
    assert!(code.contains("gdf_parcels"));
    assert!(code.contains("gdf_roads"));
    assert!(code.contains("folium.GeoJson("));
    assert!(code.contains("folium.LayerControl(collapsed=False).add_to(m)"));
    assert!(code.contains("m.save(OUTPUT_HTML)"));
    assert!(code.contains("to_crs(epsg=4326)"));
}

#[test]
fn test_kepler_structure() {
    let code = webmap::generate_kepler(&sample_schema(), &db_config());
    assert!(code.contains("from keplergl import KeplerGl"));
    // parcels has a "height" column, so the 3D tip must appear
    assert!(code.contains(r#"# 3D height field detected: "height""#));
    assert!(code.contains("map_k.add_data(data=gdf_parcels"));
    assert!(code.contains("map_k.save_to_html(file_name=OUTPUT_HTML)"));
}

#[test]
fn test_deck_structure() {
    let code = webmap::generate_deck(&sample_schema(), &db_config());
    assert!(code.contains("import pydeck as pdk"));
    assert!(code.contains("_deck_layers.append(_lyr_parcels)"));
    assert!(code.contains("r = pdk.Deck("));
    assert!(code.contains("r.to_html(OUTPUT_HTML)"));
    // polygons use GeoJsonLayer; extrusion stays commented out
    assert!(code.contains(r#""GeoJsonLayer""#));
    assert!(code.contains("# extruded=True,"));
    assert!(code.contains(r#"# get_elevation="properties.height""#));
}

// --- GeoPackage export -----------------------------------------------------

#[test]
fn test_export_write_then_append() {
    let code = export::generate_export(&sample_schema(), &db_config());
    assert!(code.contains(r#"gdf_parcels.to_file(OUTPUT_GPKG, layer="parcels", driver="GPKG", mode="w")"#));
    assert!(code.contains(r#"gdf_roads.to_file(OUTPUT_GPKG, layer="roads", driver="GPKG", mode="a")"#));
}

#[test]
fn test_export_per_layer_recovery_and_exit() {
    let code = export::generate_export(&sample_schema(), &db_config());
    // each layer loads in its own try/except and failures only skip that layer
    assert_eq!(code.matches("try:").count(), 2);
    assert_eq!(code.matches("except Exception as _e:").count(), 2);
    assert!(code.contains("engine.dispose()"));
    assert!(code.contains("if _ok < 2:"));
    assert!(code.contains("sys.exit(1)"));
}

#[test]
fn test_export_headers_and_srid_comment() {
    let code = export::generate_export(&sample_schema(), &db_config());
    assert!(code.contains("OUTPUT_GPKG"));
    assert!(code.contains("# CRS is preserved from PostGIS (SRID 4326)."));
    assert!(code.contains("~1000 rows"));
}

// --- QGIS project file -----------------------------------------------------

#[test]
fn test_qgs_xml_structure() {
    let xml = qgs::generate_qgs(&sample_schema(), &db_config());
    assert!(xml.starts_with("<!DOCTYPE qgis"));
    assert!(xml.contains(r#"<qgis projectname="test_db""#));
    assert!(xml.contains("<authid>EPSG:4326</authid>"));
    assert!(xml.contains("<layername>parcels</layername>"));
    assert!(xml.contains("<layername>roads</layername>"));
    assert!(xml.contains(r#"<provider encoding="UTF-8">postgres</provider>"#));
}

#[test]
fn test_qgs_datasource_fields() {
    let xml = qgs::generate_qgs(&sample_schema(), &db_config());
    assert!(xml.contains("dbname='test_db' host=localhost port=5432"));
    assert!(xml.contains("key='parcel_id'"));
    assert!(xml.contains(r#"table="public"."parcels" (geom)"#));
}

#[test]
fn test_qgs_geometry_names() {
    let xml = qgs::generate_qgs(&sample_schema(), &db_config());
    assert!(xml.contains(r#"geometry="Polygon""#));
    assert!(xml.contains(r#"geometry="Line""#));
    assert!(xml.contains("<layerGeometryType>2</layerGeometryType>"));
    assert!(xml.contains("<layerGeometryType>1</layerGeometryType>"));
}

#[test]
fn test_qgs_ids_deterministic_across_calls() {
    let first = qgs::generate_qgs(&sample_schema(), &db_config());
    let second = qgs::generate_qgs(&sample_schema(), &db_config());
    let id = layer_id("parcels", "public.parcels");
    assert!(first.contains(&format!("<id>{id}</id>")));
    assert_eq!(
        first.matches(&id).count(),
        second.matches(&id).count()
    );
}

#[test]
fn test_qgs_legend_references_layer_ids() {
    let xml = qgs::generate_qgs(&sample_schema(), &db_config());
    let id = layer_id("roads", "public.roads");
    assert!(xml.contains(&format!(r#"layerid="{id}""#)));
    assert!(xml.contains(r#"<legendlayer name="roads""#));
}

#[test]
fn test_qgs_empty_schema_keeps_skeleton() {
    let xml = qgs::generate_qgs(&empty_schema(), &db_config());
    assert!(xml.starts_with("<!DOCTYPE qgis"));
    assert!(xml.contains("<projectlayers>"));
    assert!(xml.ends_with("</qgis>"));
    assert!(!xml.contains("<maplayer"));
}

// --- Python toolbox --------------------------------------------------------

#[test]
fn test_pyt_toolbox_shape() {
    let code = pyt::generate_pyt(&sample_schema(), &db_config());
    assert!(code.contains("class Toolbox:"));
    assert!(code.contains("self.tools = [LoadPostGISLayers]"));
    assert!(code.contains("class LoadPostGISLayers:"));
    assert!(code.contains("def isLicensed(self):"));
    assert!(code.contains("        return True"));
}

#[test]
fn test_pyt_six_parameters_prefilled() {
    let code = pyt::generate_pyt(&sample_schema(), &db_config());
    assert_eq!(code.matches("arcpy.Parameter(").count(), 6);
    assert!(code.contains(r#"host.value = "localhost""#));
    assert!(code.contains(r#"port.value = "5432""#));
    assert!(code.contains(r#"dbname.value = "test_db""#));
    assert!(code.contains(r#"user.value = "testuser""#));
    assert!(code.contains("return [host, port, dbname, user, password, schema_filter]"));
}

#[test]
fn test_pyt_password_hidden_not_prefilled() {
    let code = pyt::generate_pyt(&sample_schema(), &db_config());
    assert!(code.contains(r#"datatype="GPStringHidden""#));
    assert!(!code.contains("password.value"));
    assert!(!code.contains("testpass"));
}

#[test]
fn test_pyt_layer_tuples_and_load() {
    let code = pyt::generate_pyt(&sample_schema(), &db_config());
    assert!(code.contains(r#"("public", "parcels"),"#));
    assert!(code.contains(r#"("public", "roads"),"#));
    assert!(code.contains("arcpy.management.CreateDatabaseConnection("));
    assert!(code.contains("act_map.addDataFromPath(_fc)"));
    assert!(code.contains("arcpy.env.scratchFolder"));
    assert!(code.contains("schema_filter = arcpy.Parameter("));
}

// --- Security invariant ----------------------------------------------------

#[test]
fn test_no_generator_embeds_password() {
    let schema = sample_schema();
    let mut db = db_config();
    db.password = "s3cr3t!pass'\"word".to_string();

    let outputs = [
        pyqgis::generate_pyqgis(&schema, &db, &[], None, None),
        arcpy::generate_arcpy(&schema, &db, &[], None, None),
        webmap::generate_folium(&schema, &db),
        webmap::generate_kepler(&schema, &db),
        webmap::generate_deck(&schema, &db),
        export::generate_export(&schema, &db),
        qgs::generate_qgs(&schema, &db),
        pyt::generate_pyt(&schema, &db),
    ];
    for code in &outputs {
        assert!(!code.contains("s3cr3t"), "password leaked into output");
    }
    // the scripting targets read it from the environment instead
    assert!(outputs[0].contains("PGPASSWORD"));
    assert!(outputs[1].contains("PGPASSWORD"));
}

#[test]
fn test_password_invariant_idempotent_across_calls() {
    let mut db = db_config();
    db.password = "p@ss word % $ \\".to_string();
    for _ in 0..2 {
        let code = pyqgis::generate_pyqgis(&sample_schema(), &db, &[], None, None);
        assert!(!code.contains("p@ss word"));
    }
}

// --- Empty schema property -------------------------------------------------

#[test]
fn test_empty_schema_every_generator_keeps_preamble() {
    let schema = empty_schema();
    let db = db_config();

    let pyqgis_code = pyqgis::generate_pyqgis(&schema, &db, &[], None, None);
    assert!(pyqgis_code.contains("Auto-generated PyQGIS script"));
    assert!(pyqgis_code.contains("qgs.initQgis()"));
    assert!(pyqgis_code.contains("qgs.exitQgis()"));
    assert!(!pyqgis_code.contains("QgsDataSourceUri()"));

    let arcpy_code = arcpy::generate_arcpy(&schema, &db, &[], None, None);
    assert!(arcpy_code.contains("import arcpy"));
    assert!(arcpy_code.contains("CreateDatabaseConnection"));
    assert!(!arcpy_code.contains("fc_"));

    for code in [
        webmap::generate_folium(&schema, &db),
        webmap::generate_kepler(&schema, &db),
        webmap::generate_deck(&schema, &db),
        export::generate_export(&schema, &db),
        pyt::generate_pyt(&schema, &db),
    ] {
        assert!(!code.is_empty());
        assert!(code.contains("Auto-generated"));
    }
}

// --- Saved-schema round trip -----------------------------------------------

#[test]
fn test_save_then_load_schema_round_trip() {
    let schema = sample_schema();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    std::fs::write(&path, schema.to_json().unwrap()).unwrap();

    let loaded = Schema::from_json_file(&path).unwrap();
    assert_eq!(loaded.layer_count, 2);

    // generation from the snapshot names every layer from the live run
    let code = pyqgis::generate_pyqgis(&loaded, &db_config(), &[], None, None);
    for layer in &schema.layers {
        assert!(code.contains(&layer.table), "missing layer {}", layer.table);
    }
}
