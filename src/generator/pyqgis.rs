//! Standalone PyQGIS script generator.

use chrono::Local;

use crate::config::DbConfig;
use crate::generator::ops::{pyqgis_op_blocks, Operation};
use crate::generator::types::pg_type_to_pyqgis;
use crate::generator::PerLayerOps;
use crate::layout::TemplateConfig;
use crate::schema::{safe_var, Schema};

/// Generate a PyQGIS script that loads every layer, prints diagnostics and
/// applies the requested operation blocks.
///
/// The password is never embedded; the script reads `PGPASSWORD` at runtime.
pub fn generate_pyqgis(
    schema: &Schema,
    db: &DbConfig,
    operations: &[Operation],
    template: Option<&TemplateConfig>,
    per_layer_ops: Option<&PerLayerOps>,
) -> String {
    // `from qgis import processing` is only needed when some layer ends up
    // with a processing-based operation, global or per-layer.
    let mut all_ops: Vec<Operation> = operations.to_vec();
    if let Some(per_layer) = per_layer_ops {
        for ops in per_layer.values() {
            all_ops.extend(ops.iter().copied());
        }
    }
    let needs_processing = all_ops.iter().any(|op| op.needs_processing());

    let mut lines: Vec<String> = vec![
        r#"""""#.to_string(),
        "Auto-generated PyQGIS script".to_string(),
        format!("Database : {} @ {}:{}", db.dbname, db.host, db.port),
        format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M")),
        format!("Layers   : {}", schema.layers.len()),
        String::new(),
        "Run as a standalone script (outside QGIS) or paste into the QGIS".to_string(),
        "Python console. In the console, omit the QgsApplication init block.".to_string(),
        r#"""""#.to_string(),
        String::new(),
        "import os".to_string(),
        "import sys".to_string(),
        String::new(),
        "# -- QGIS standalone init (remove if running inside QGIS console) ------".to_string(),
        "from qgis.core import (".to_string(),
        "    QgsApplication, QgsDataSourceUri, QgsVectorLayer, QgsProject,".to_string(),
        "    QgsCoordinateReferenceSystem,".to_string(),
        ")".to_string(),
        String::new(),
        "qgs = QgsApplication([], False)".to_string(),
        "qgs.initQgis()".to_string(),
        "# -------------------------------------------------------------------------".to_string(),
        String::new(),
    ];

    if needs_processing {
        lines.push("from qgis import processing".to_string());
        lines.push(String::new());
    }

    lines.extend([
        "# Database connection defaults (edit as needed)".to_string(),
        format!(r#"DB_HOST     = "{}""#, db.host),
        format!(r#"DB_PORT     = "{}""#, db.port),
        format!(r#"DB_NAME     = "{}""#, db.dbname),
        format!(r#"DB_USER     = "{}""#, db.user),
        r#"DB_PASSWORD = os.environ.get("PGPASSWORD", "")  # set PGPASSWORD before running"#
            .to_string(),
        String::new(),
    ]);

    if let Some(t) = template {
        if let Some(preamble) = &t.preamble {
            lines.push(preamble.clone());
            lines.push(String::new());
        }
        if let Some(extra_imports) = &t.extra_imports {
            lines.push(extra_imports.clone());
            lines.push(String::new());
        }
    }

    for layer in &schema.layers {
        let var = safe_var(&layer.table);
        let pk_col = layer.primary_keys.first().map(String::as_str).unwrap_or("");

        let layer_ops = per_layer_ops.and_then(|m| m.get(&layer.qualified_name));
        let effective_ops: &[Operation] = layer_ops.map(Vec::as_slice).unwrap_or(operations);

        let include_sample_rows = template.map(|t| t.include_sample_rows).unwrap_or(true);
        let include_crs_info = template.map(|t| t.include_crs_info).unwrap_or(true);
        let include_field_list = template.map(|t| t.include_field_list).unwrap_or(true);

        let field_comments = layer
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, pg_type_to_pyqgis(&c.data_type)))
            .collect::<Vec<_>>()
            .join(", ");

        // Sample iteration uses the first 10 attribute columns
        let sample_fields: Vec<&str> = layer
            .columns
            .iter()
            .take(10)
            .map(|c| c.name.as_str())
            .collect();

        if let Some(t) = template {
            if let Some(prefix) = &t.per_layer_prefix {
                lines.push(t.substitute_placeholders(
                    prefix,
                    &layer.table,
                    &layer.schema,
                    &layer.qualified_name,
                ));
                lines.push(String::new());
            }
        }

        lines.extend([
            format!("# {}", "=".repeat(66)),
            format!("# Layer : {}.{}", layer.schema, layer.table),
            format!(
                "# Geom  : {}  |  SRID: {}",
                layer.geometry.geom_type, layer.geometry.srid
            ),
            format!("# Rows  : {}", layer.row_count_label()),
            format!(
                "# Fields: {}",
                if field_comments.is_empty() {
                    "(none)"
                } else {
                    field_comments.as_str()
                }
            ),
            format!("# {}", "=".repeat(66)),
            String::new(),
            format!("uri_{var} = QgsDataSourceUri()"),
            format!("uri_{var}.setConnection(DB_HOST, DB_PORT, DB_NAME, DB_USER, DB_PASSWORD)"),
            format!("uri_{var}.setDataSource("),
            format!(r#"    "{}","#, layer.schema),
            format!(r#"    "{}","#, layer.table),
            format!(r#"    "{}",  # geometry column"#, layer.geometry.column),
            r#"    "",               # optional SQL WHERE filter"#.to_string(),
            format!(r#"    "{pk_col}",       # primary key column"#),
            ")".to_string(),
            String::new(),
            format!(
                r#"lyr_{var} = QgsVectorLayer(uri_{var}.uri(False), "{}", "postgres")"#,
                layer.table
            ),
            String::new(),
            format!("if not lyr_{var}.isValid():"),
            format!(
                r#"    print(f"[ERROR] Layer '{}' failed to load — check connection.")"#,
                layer.table
            ),
            "else:".to_string(),
            format!("    QgsProject.instance().addMapLayer(lyr_{var})"),
            format!(
                r#"    print(f"[OK] {}: {{lyr_{var}.featureCount()}} features")"#,
                layer.table
            ),
            String::new(),
        ]);

        if include_crs_info {
            lines.extend([
                "    # CRS".to_string(),
                format!("    crs = lyr_{var}.crs()"),
                r#"    print(f"  CRS: {crs.authid()}  ({crs.description()})")"#.to_string(),
                String::new(),
            ]);
        }

        if include_field_list {
            lines.extend([
                "    # Field names".to_string(),
                format!("    fields = [f.name() for f in lyr_{var}.fields()]"),
                r#"    print(f"  Fields: {fields}")"#.to_string(),
                String::new(),
            ]);
        }

        if include_sample_rows && !sample_fields.is_empty() {
            let quoted = sample_fields
                .iter()
                .map(|f| format!(r#""{f}""#))
                .collect::<Vec<_>>()
                .join(", ");
            lines.extend([
                "    # --- Sample: iterate first 5 features ---".to_string(),
                format!("    for i, feat in enumerate(lyr_{var}.getFeatures()):"),
                "        if i >= 5:".to_string(),
                "            break".to_string(),
                format!(r#"        print("  row:", {{k: feat[k] for k in [{quoted}]}})"#),
                String::new(),
            ]);
        }

        lines.extend(pyqgis_op_blocks(
            &var,
            &layer.table,
            &layer.columns,
            effective_ops,
        ));

        if let Some(t) = template {
            if let Some(suffix) = &t.per_layer_suffix {
                lines.push(t.substitute_placeholders(
                    suffix,
                    &layer.table,
                    &layer.schema,
                    &layer.qualified_name,
                ));
                lines.push(String::new());
            }
        }

        lines.extend([
            "    # --- Example: spatial filter (bounding box) ---".to_string(),
            "    # from qgis.core import QgsRectangle".to_string(),
            "    # bbox = QgsRectangle(xmin, ymin, xmax, ymax)".to_string(),
            "    # request = QgsFeatureRequest().setFilterRect(bbox)".to_string(),
            format!("    # for feat in lyr_{var}.getFeatures(request):"),
            "    #     print(feat.id())".to_string(),
            String::new(),
            "    # --- Example: attribute filter ---".to_string(),
            r#"    # request = QgsFeatureRequest().setFilterExpression('"field" = \'value\'')"#
                .to_string(),
            format!("    # for feat in lyr_{var}.getFeatures(request):"),
            "    #     print(feat.id())".to_string(),
            String::new(),
        ]);
    }

    if let Some(t) = template {
        if let Some(teardown) = &t.teardown {
            lines.push(teardown.clone());
            lines.push(String::new());
        }
    }

    lines.extend([
        "# -- Cleanup (standalone only) ----------------------------------------".to_string(),
        "qgs.exitQgis()".to_string(),
    ]);

    lines.join("\n")
}
