//! Map catalogue loading and per-map script generation.
//!
//! The catalogue is a spreadsheet (worksheet `Catalogue`, header row first)
//! enumerating planned maps. Rows pass the inclusion filter when their
//! status is `have` or `partial` AND their spatial layer type contains
//! `Vector` (substring containment: `Raster/Vector` rows are kept, with a
//! raster TODO note in the generated script). Rows failing the filter are
//! dropped silently.
//!
//! An optional saved-schema JSON (from `gis-codegen --save-schema`) enriches
//! generation: real column lists feed the operation blocks and a best-guess
//! classification field replaces the generic placeholder.

pub mod symbology;

use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::Local;
use std::collections::HashMap;
use std::path::Path;

use crate::config::DbConfig;
use crate::error::{GisError, Result};
use crate::generator::ops::{arcpy_op_blocks, pyqgis_op_blocks, Operation};
use crate::generator::{pyt, qgs};
use crate::schema::{safe_var, Geometry, Layer, Schema};
use symbology::{arcpy_symbology_block, pyqgis_symbology_block};

/// One catalogue row. Every field is free text; absent cells are empty
/// strings.
#[derive(Debug, Clone, Default)]
pub struct MapEntry {
    pub map_id: String,
    pub theme: String,
    pub subtheme: String,
    pub title: String,
    pub short_name: String,
    pub objective: String,
    pub key_questions: String,
    pub key_indicators: String,
    pub study_scale: String,
    pub unit_of_analysis: String,
    pub classification: String,
    pub data_sources: String,
    pub data_vintage: String,
    pub spatial_layer_type: String,
    pub processing_steps: String,
    pub symbology_type: String,
    pub status: String,
    pub owner: String,
    pub priority: String,
    pub effort: String,
    pub dependencies: String,
    pub deliverable_format: String,
    pub validation_checks: String,
    pub risks_limitations: String,
}

impl MapEntry {
    /// Build an entry by matching the header row against a data row.
    pub fn from_row(headers: &[String], cells: &[String]) -> MapEntry {
        let get = |key: &str| -> String {
            headers
                .iter()
                .position(|h| h == key)
                .and_then(|i| cells.get(i))
                .cloned()
                .unwrap_or_default()
        };
        MapEntry {
            map_id: get("map_id"),
            theme: get("theme"),
            subtheme: get("subtheme"),
            title: get("title"),
            short_name: get("short_name"),
            objective: get("objective"),
            key_questions: get("key_questions"),
            key_indicators: get("key_indicators"),
            study_scale: get("study_scale"),
            unit_of_analysis: get("unit_of_analysis"),
            classification: get("classification"),
            data_sources: get("data_sources"),
            data_vintage: get("data_vintage"),
            spatial_layer_type: get("spatial_layer_type"),
            processing_steps: get("processing_steps"),
            symbology_type: get("symbology_type"),
            status: get("status"),
            owner: get("owner"),
            priority: get("priority"),
            effort: get("effort"),
            dependencies: get("dependencies"),
            deliverable_format: get("deliverable_format"),
            validation_checks: get("validation_checks"),
            risks_limitations: get("risks_limitations"),
        }
    }

    /// Inclusion filter: status ∈ {have, partial} AND layer type contains
    /// "Vector". `Raster/Vector` passes; `Raster` alone does not.
    pub fn is_included(&self) -> bool {
        let status = self.status.trim().to_lowercase();
        (status == "have" || status == "partial") && self.spatial_layer_type.contains("Vector")
    }

    /// The layer also carries a raster component
    pub fn has_raster(&self) -> bool {
        self.spatial_layer_type.contains("Raster")
    }

    fn effective_short_name(&self) -> &str {
        if self.short_name.is_empty() {
            "layer"
        } else {
            &self.short_name
        }
    }

    fn effective_map_id(&self) -> &str {
        if self.map_id.is_empty() {
            "M??"
        } else {
            &self.map_id
        }
    }
}

/// Read the catalogue and return the rows passing the inclusion filter.
///
/// `.xlsx` workbooks must contain a `Catalogue` worksheet; a `.csv` file
/// with the same header row is accepted too.
///
/// # Errors
///
/// Returns `GisError::Catalogue` for unreadable files, an unsupported
/// extension, a missing worksheet or a missing header row.
pub fn load_catalogue(path: &Path) -> Result<Vec<MapEntry>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let rows = match ext.as_str() {
        "xlsx" | "xlsm" => read_xlsx_rows(path)?,
        "csv" => read_csv_rows(path)?,
        other => {
            return Err(GisError::Catalogue(format!(
                "Unsupported catalogue format '{other}' for '{}' (expected .xlsx or .csv)",
                path.display()
            )))
        }
    };

    let mut iter = rows.into_iter();
    let headers = iter.next().ok_or_else(|| {
        GisError::Catalogue(format!("Catalogue '{}' has no header row", path.display()))
    })?;

    let mut maps = Vec::new();
    let mut skipped = 0usize;
    for cells in iter {
        let entry = MapEntry::from_row(&headers, &cells);
        if entry.is_included() {
            maps.push(entry);
        } else {
            skipped += 1;
        }
    }
    log::debug!("Catalogue filter kept {} row(s), dropped {skipped}", maps.len());
    Ok(maps)
}

fn read_xlsx_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        GisError::Catalogue(format!(
            "Cannot open catalogue file '{}': {e}",
            path.display()
        ))
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    if !sheet_names.iter().any(|s| s == "Catalogue") {
        return Err(GisError::Catalogue(format!(
            "Worksheet 'Catalogue' not found in '{}'. Available sheets: {sheet_names:?}",
            path.display()
        )));
    }

    let range = workbook
        .worksheet_range("Catalogue")
        .map_err(|e| GisError::Catalogue(format!("Cannot read worksheet 'Catalogue': {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| {
            GisError::Catalogue(format!(
                "Cannot open catalogue file '{}': {e}",
                path.display()
            ))
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| GisError::Catalogue(format!("Invalid CSV record: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Load a saved schema JSON keyed by table name for `short_name` lookups.
pub fn load_schema_lookup(path: &Path) -> Result<HashMap<String, Layer>> {
    let schema = Schema::from_json_file(path)?;
    Ok(schema
        .layers
        .into_iter()
        .map(|layer| (layer.table.clone(), layer))
        .collect())
}

const NUMERIC_TYPES: [&str; 8] = [
    "integer",
    "bigint",
    "smallint",
    "double precision",
    "numeric",
    "real",
    "float4",
    "float8",
];
const TEXT_TYPES: [&str; 4] = ["text", "character varying", "character", "varchar"];

/// Most suitable column for a renderer: skips the geometry column and the
/// primary keys, wants a numeric or text type class depending on the
/// renderer. Falls back to `value`.
pub fn best_field(layer_info: Option<&Layer>, numeric: bool) -> String {
    let Some(layer) = layer_info else {
        return "value".to_string();
    };
    let want: &[&str] = if numeric { &NUMERIC_TYPES } else { &TEXT_TYPES };
    for col in &layer.columns {
        if col.name == layer.geometry.column || layer.primary_keys.contains(&col.name) {
            continue;
        }
        if want.contains(&col.data_type.as_str()) {
            return col.name.clone();
        }
    }
    "value".to_string()
}

/// When the catalogue's classification is blank and a schema layer is known,
/// fill the classification with the best-guess column for the renderer's
/// type class.
fn enrich_classification(entry: &MapEntry, layer_info: Option<&Layer>) -> MapEntry {
    if layer_info.is_none() || !entry.classification.is_empty() {
        return entry.clone();
    }
    let stype = entry.symbology_type.to_lowercase();
    let want_numeric = ["choroplèthe", "dégradé", "gradué", "heatmap", "densité"]
        .iter()
        .any(|k| stype.contains(k));
    let best = best_field(layer_info, want_numeric);
    let mut enriched = entry.clone();
    if best != "value" {
        enriched.classification = best;
    }
    enriched
}

fn docstring_header(entry: &MapEntry) -> Vec<String> {
    vec![
        r#"""""#.to_string(),
        format!("Map ID    : {}", entry.effective_map_id()),
        format!(
            "Title     : {}",
            if entry.title.is_empty() {
                &entry.short_name
            } else {
                &entry.title
            }
        ),
        format!("Theme     : {} > {}", entry.theme, entry.subtheme),
        format!("Objective : {}", entry.objective),
        format!("Questions : {}", entry.key_questions),
        format!("Indicators: {}", entry.key_indicators),
        format!(
            "Scale     : {}  |  Unit: {}",
            entry.study_scale, entry.unit_of_analysis
        ),
        format!("Symbology : {}", entry.symbology_type),
        format!(
            "Sources   : {}  [{}]",
            entry.data_sources, entry.data_vintage
        ),
        format!("Processing: {}", entry.processing_steps),
        format!("Deliverable: {}", entry.deliverable_format),
        format!("Validation: {}", entry.validation_checks),
        format!("Risks     : {}", entry.risks_limitations),
        format!("Status    : {}  |  Owner: {}", entry.status, entry.owner),
        format!("Generated : {}", Local::now().format("%Y-%m-%d %H:%M")),
        r#"""""#.to_string(),
    ]
}

fn validation_check_lines(entry: &MapEntry) -> Vec<String> {
    if entry.validation_checks.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["    # --- Validation checks ---".to_string()];
    for check in entry.validation_checks.split(',') {
        lines.push(format!("    # [ ] {}", check.trim()));
    }
    lines.push(String::new());
    lines
}

/// Generate a standalone PyQGIS script for one catalogue map.
pub fn generate_map_pyqgis(
    entry: &MapEntry,
    db: &DbConfig,
    ops: &[Operation],
    layer_info: Option<&Layer>,
) -> String {
    let short_name = entry.effective_short_name();
    let map_id = entry.effective_map_id();
    let var = safe_var(short_name);

    let mut lines = docstring_header(entry);
    lines.extend([
        String::new(),
        "import os".to_string(),
        String::new(),
        "from qgis.core import (".to_string(),
        "    QgsApplication, QgsDataSourceUri, QgsVectorLayer, QgsProject,".to_string(),
        ")".to_string(),
        String::new(),
        "qgs = QgsApplication([], False)".to_string(),
        "qgs.initQgis()".to_string(),
        String::new(),
        format!(r#"DB_HOST     = "{}""#, db.host),
        format!(r#"DB_PORT     = "{}""#, db.port),
        format!(r#"DB_NAME     = "{}""#, db.dbname),
        format!(r#"DB_USER     = "{}""#, db.user),
        r#"DB_PASSWORD = os.environ["PGPASSWORD"]"#.to_string(),
        String::new(),
        format!("# {}", "=".repeat(66)),
        format!("# {map_id} — {short_name}"),
        format!("# {}", entry.title),
        format!("# {}", "=".repeat(66)),
        String::new(),
        format!("uri_{var} = QgsDataSourceUri()"),
        format!("uri_{var}.setConnection(DB_HOST, DB_PORT, DB_NAME, DB_USER, DB_PASSWORD)"),
        format!(r#"uri_{var}.setDataSource("public", "{short_name}", "geom", "", "")"#),
        String::new(),
        format!(r#"lyr_{var} = QgsVectorLayer(uri_{var}.uri(False), "{short_name}", "postgres")"#),
        String::new(),
        format!("if not lyr_{var}.isValid():"),
        format!(r#"    print(f"[ERROR] '{short_name}' failed to load.")"#),
        "else:".to_string(),
        format!("    QgsProject.instance().addMapLayer(lyr_{var})"),
        format!(r#"    print(f"[OK] {short_name}: {{lyr_{var}.featureCount()}} features")"#),
        format!(r#"    print(f"  CRS: {{lyr_{var}.crs().authid()}}")"#),
        format!(r#"    print(f"  Fields: {{[f.name() for f in lyr_{var}.fields()]}}")"#),
        String::new(),
    ]);

    let enriched = enrich_classification(entry, layer_info);
    lines.extend(pyqgis_symbology_block(&var, &enriched));
    lines.push(String::new());

    if !ops.is_empty() {
        let columns = layer_info.map(|l| l.columns.as_slice()).unwrap_or(&[]);
        lines.extend(pyqgis_op_blocks(&var, short_name, columns, ops));
    }

    if entry.has_raster() {
        lines.extend([
            "    # --- Raster component ---".to_string(),
            format!(
                "    # This layer also has a raster component ({}).",
                entry.spatial_layer_type
            ),
            "    # TODO: load raster layer via QgsRasterLayer and add to project.".to_string(),
            r#"    # raster_path = r"TODO: path to raster file""#.to_string(),
            format!(
                r#"    # lyr_{var}_raster = QgsRasterLayer(raster_path, "{short_name}_raster")"#
            ),
            format!("    # QgsProject.instance().addMapLayer(lyr_{var}_raster)"),
            String::new(),
        ]);
    }

    lines.extend(validation_check_lines(entry));

    lines.extend([
        format!("    # --- Export: {} ---", entry.deliverable_format),
        format!(r#"    # TODO: configure a QGIS print layout named "{map_id}_layout" then:"#),
        "    # from qgis.core import QgsLayoutExporter".to_string(),
        "    # layout   = QgsProject.instance().layoutManager()".to_string(),
        format!(r#"    #            .layoutByName("{map_id}_layout")"#),
        "    # exporter = QgsLayoutExporter(layout)".to_string(),
        format!(r#"    # exporter.exportToPdf("{map_id}_{short_name}.pdf","#),
        "    #     QgsLayoutExporter.PdfExportSettings())".to_string(),
        String::new(),
        "qgs.exitQgis()".to_string(),
    ]);

    lines.join("\n")
}

/// Generate an ArcPy script for one catalogue map.
pub fn generate_map_arcpy(
    entry: &MapEntry,
    db: &DbConfig,
    ops: &[Operation],
    layer_info: Option<&Layer>,
) -> String {
    let short_name = entry.effective_short_name();
    let map_id = entry.effective_map_id();
    let var = safe_var(short_name);

    let mut lines = docstring_header(entry);
    lines.extend([
        String::new(),
        "import arcpy".to_string(),
        "import os".to_string(),
        "import tempfile".to_string(),
        String::new(),
        format!(r#"DB_HOST     = "{}""#, db.host),
        format!(r#"DB_PORT     = "{}""#, db.port),
        format!(r#"DB_NAME     = "{}""#, db.dbname),
        format!(r#"DB_USER     = "{}""#, db.user),
        r#"DB_PASSWORD = os.environ["PGPASSWORD"]"#.to_string(),
        String::new(),
        "# --- SDE connection file ---".to_string(),
        "SDE_FOLDER = tempfile.gettempdir()".to_string(),
        r#"SDE_FILE   = os.path.join(SDE_FOLDER, f"{DB_NAME}.sde")"#.to_string(),
        String::new(),
        "if not os.path.exists(SDE_FILE):".to_string(),
        "    arcpy.management.CreateDatabaseConnection(".to_string(),
        "        out_folder_path=SDE_FOLDER,".to_string(),
        "        out_name=os.path.basename(SDE_FILE),".to_string(),
        r#"        database_platform="POSTGRESQL","#.to_string(),
        r#"        instance=f"{DB_HOST},{DB_PORT}","#.to_string(),
        r#"        account_authentication="DATABASE_AUTH","#.to_string(),
        "        username=DB_USER,".to_string(),
        "        password=DB_PASSWORD,".to_string(),
        r#"        save_user_pass="SAVE_USERNAME","#.to_string(),
        "        database=DB_NAME,".to_string(),
        "    )".to_string(),
        r#"    print(f"[OK] SDE connection created: {SDE_FILE}")"#.to_string(),
        "else:".to_string(),
        r#"    print(f"[OK] Reusing SDE connection: {SDE_FILE}")"#.to_string(),
        String::new(),
        format!("# {}", "=".repeat(66)),
        format!("# {map_id} — {short_name}"),
        format!("# {}", entry.title),
        format!("# {}", "=".repeat(66)),
        String::new(),
        format!(r#"fc_{var} = os.path.join(SDE_FILE, "public.{short_name}")"#),
        String::new(),
        format!("if not arcpy.Exists(fc_{var}):"),
        format!(r#"    print(f"[ERROR] '{short_name}' not found in SDE connection.")"#),
        "else:".to_string(),
        format!("    desc_{var} = arcpy.Describe(fc_{var})"),
        format!(r#"    print(f"[OK] {short_name}")"#),
        format!(r#"    print(f"  Geometry : {{desc_{var}.shapeType}}")"#),
        format!(r#"    print(f"  CRS      : {{desc_{var}.spatialReference.name}}")"#),
        format!("    count_{var} = int(arcpy.management.GetCount(fc_{var})[0])"),
        format!(r#"    print(f"  Rows: {{count_{var}}}")"#),
        String::new(),
        "    # --- Add to ArcGIS Pro project ---".to_string(),
        r#"    # Use "CURRENT" when running inside the ArcGIS Pro Python console."#.to_string(),
        "    # For standalone use, point APRX_PATH to your .aprx file.".to_string(),
        r#"    APRX_PATH = "CURRENT"  # TODO: or r"C:\path\to\project.aprx""#.to_string(),
        "    aprx   = arcpy.mp.ArcGISProject(APRX_PATH)".to_string(),
        "    mp_map = aprx.listMaps()[0]".to_string(),
        format!("    lyr_{var} = mp_map.addDataFromPath(fc_{var})"),
        r#"    print(f"  Added to map: {mp_map.name}")"#.to_string(),
        String::new(),
    ]);

    let enriched = enrich_classification(entry, layer_info);
    lines.extend(arcpy_symbology_block(&var, &enriched));
    lines.push(String::new());

    if !ops.is_empty() {
        let columns = layer_info.map(|l| l.columns.as_slice()).unwrap_or(&[]);
        lines.extend(arcpy_op_blocks(&var, short_name, columns, ops));
    }

    lines.push("    aprx.save()".to_string());
    lines.push(String::new());

    if entry.has_raster() {
        lines.extend([
            "    # --- Raster component ---".to_string(),
            format!(
                "    # This layer also has a raster component ({}).",
                entry.spatial_layer_type
            ),
            "    # TODO: load the raster via mp_map.addDataFromPath(raster_path).".to_string(),
            r#"    # raster_path = r"TODO: path to raster file""#.to_string(),
            format!("    # lyr_{var}_raster = mp_map.addDataFromPath(raster_path)"),
            String::new(),
        ]);
    }

    lines.extend(validation_check_lines(entry));

    lines.extend([
        format!("    # --- Export: {} ---", entry.deliverable_format),
        format!(r#"    # TODO: configure a layout named "{map_id}_layout" in your .aprx, then:"#),
        format!(r#"    # layout = aprx.listLayouts("{map_id}_layout")[0]"#),
        format!(r#"    # layout.exportToPDF("{map_id}_{short_name}.pdf")"#),
    ]);

    lines.join("\n")
}

/// Synthesize a one-layer schema for the project-file generators. Schema
/// details come from the saved-schema layer when available, generic
/// placeholders otherwise.
fn single_layer_schema(entry: &MapEntry, db: &DbConfig, layer_info: Option<&Layer>) -> Schema {
    let short_name = entry.effective_short_name();
    let (geometry, columns, primary_keys) = match layer_info {
        Some(layer) => (
            layer.geometry.clone(),
            layer.columns.clone(),
            layer.primary_keys.clone(),
        ),
        None => (
            Geometry {
                column: "geom".to_string(),
                geom_type: "GEOMETRY".to_string(),
                srid: 4326,
            },
            Vec::new(),
            Vec::new(),
        ),
    };
    Schema {
        database: db.dbname.clone(),
        host: db.host.clone(),
        layer_count: 1,
        layers: vec![Layer {
            schema: "public".to_string(),
            table: short_name.to_string(),
            qualified_name: Layer::qualified("public", short_name),
            geometry,
            columns,
            primary_keys,
            row_count_estimate: None,
            comment: None,
        }],
    }
}

/// QGIS project file for one catalogue map. `ops` is accepted for API
/// consistency but ignored (.qgs has no operation blocks).
pub fn generate_map_qgs(
    entry: &MapEntry,
    db: &DbConfig,
    _ops: &[Operation],
    layer_info: Option<&Layer>,
) -> String {
    qgs::generate_qgs(&single_layer_schema(entry, db, layer_info), db)
}

/// ArcGIS Python Toolbox for one catalogue map. `ops` is accepted for API
/// consistency but ignored (.pyt has no operation blocks).
pub fn generate_map_pyt(
    entry: &MapEntry,
    db: &DbConfig,
    _ops: &[Operation],
    layer_info: Option<&Layer>,
) -> String {
    pyt::generate_pyt(&single_layer_schema(entry, db, layer_info), db)
}
