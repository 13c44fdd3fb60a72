//! ArcPy (ArcGIS Pro) script generator.

use chrono::Local;

use crate::config::DbConfig;
use crate::generator::ops::{arcpy_op_blocks, Operation};
use crate::generator::types::pg_type_to_arcpy;
use crate::generator::PerLayerOps;
use crate::layout::TemplateConfig;
use crate::schema::{safe_var, Schema};

/// Generate an ArcPy script: creates a temporary `.sde` connection file,
/// then loads and inspects every layer.
///
/// The password is never embedded; the script reads `PGPASSWORD` at runtime.
pub fn generate_arcpy(
    schema: &Schema,
    db: &DbConfig,
    operations: &[Operation],
    template: Option<&TemplateConfig>,
    per_layer_ops: Option<&PerLayerOps>,
) -> String {
    let mut lines: Vec<String> = vec![
        r#"""""#.to_string(),
        "Auto-generated ArcPy script".to_string(),
        format!("Database : {} @ {}:{}", db.dbname, db.host, db.port),
        format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M")),
        format!("Layers   : {}", schema.layers.len()),
        String::new(),
        "Requires ArcGIS Pro with the PostgreSQL client libraries installed.".to_string(),
        "Run from an ArcGIS Pro Python environment or ArcGIS Pro console.".to_string(),
        r#"""""#.to_string(),
        String::new(),
        "import arcpy".to_string(),
        "import os".to_string(),
        "import tempfile".to_string(),
        String::new(),
        "# Database connection parameters".to_string(),
        format!(r#"DB_HOST     = "{}""#, db.host),
        format!(
            r#"DB_INSTANCE = "{},{}"  # ArcGIS uses "host,port" format"#,
            db.host, db.port
        ),
        format!(r#"DB_NAME     = "{}""#, db.dbname),
        format!(r#"DB_USER     = "{}""#, db.user),
        r#"DB_PASSWORD = os.environ.get("PGPASSWORD", "")  # set PGPASSWORD before running"#
            .to_string(),
        String::new(),
        "# Create a temporary .sde connection file".to_string(),
        "SDE_FOLDER = tempfile.gettempdir()".to_string(),
        r#"SDE_FILE   = os.path.join(SDE_FOLDER, f"{DB_NAME}.sde")"#.to_string(),
        String::new(),
        "if not os.path.exists(SDE_FILE):".to_string(),
        "    arcpy.management.CreateDatabaseConnection(".to_string(),
        "        out_folder_path=SDE_FOLDER,".to_string(),
        "        out_name=os.path.basename(SDE_FILE),".to_string(),
        r#"        database_platform="POSTGRESQL","#.to_string(),
        "        instance=DB_INSTANCE,".to_string(),
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
    ];

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

        let layer_ops = per_layer_ops.and_then(|m| m.get(&layer.qualified_name));
        let effective_ops: &[Operation] = layer_ops.map(Vec::as_slice).unwrap_or(operations);

        let include_sample_rows = template.map(|t| t.include_sample_rows).unwrap_or(true);
        let include_crs_info = template.map(|t| t.include_crs_info).unwrap_or(true);
        let include_field_list = template.map(|t| t.include_field_list).unwrap_or(true);

        let field_comments = layer
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, pg_type_to_arcpy(&c.data_type)))
            .collect::<Vec<_>>()
            .join(", ");

        // SearchCursor sample: first pk + first few attrs + the geometry token
        let mut cursor_fields: Vec<String> = Vec::new();
        cursor_fields.extend(layer.primary_keys.iter().take(1).cloned());
        cursor_fields.extend(layer.columns.iter().take(4).map(|c| c.name.clone()));
        cursor_fields.push("SHAPE@".to_string());
        let cursor_fields_str = format!(
            "[{}]",
            cursor_fields
                .iter()
                .map(|f| format!("'{f}'"))
                .collect::<Vec<_>>()
                .join(", ")
        );

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
            format!(
                r#"fc_{var} = os.path.join(SDE_FILE, "{}.{}")"#,
                layer.schema, layer.table
            ),
            String::new(),
            format!("if arcpy.Exists(fc_{var}):"),
            format!("    desc_{var} = arcpy.Describe(fc_{var})"),
            format!(r#"    print(f"[OK] {}")"#, layer.table),
        ]);

        if include_crs_info {
            lines.extend([
                format!(r#"    print(f"  Geometry : {{desc_{var}.shapeType}}")"#),
                format!(r#"    print(f"  CRS      : {{desc_{var}.spatialReference.name}}")"#),
                String::new(),
            ]);
        }

        if include_field_list {
            lines.extend([
                "    # List fields".to_string(),
                format!("    fields_{var} = arcpy.ListFields(fc_{var})"),
                format!("    for fld in fields_{var}:"),
                r#"        print(f"  field: {fld.name} ({fld.type})")"#.to_string(),
                String::new(),
            ]);
        }

        // Row count is included regardless (part of basic layer info)
        lines.extend([
            "    # Row count".to_string(),
            format!("    count_{var} = int(arcpy.management.GetCount(fc_{var})[0])"),
            format!(r#"    print(f"  Rows: {{count_{var}}}")"#),
            String::new(),
        ]);

        if include_sample_rows {
            lines.extend([
                "    # --- Sample: iterate first 5 rows ---".to_string(),
                format!(
                    "    with arcpy.da.SearchCursor(fc_{var}, {cursor_fields_str}) as cur_{var}:"
                ),
                format!("        for i, row in enumerate(cur_{var}):"),
                "            if i >= 5:".to_string(),
                "                break".to_string(),
                r#"            print("  row:", row)"#.to_string(),
                String::new(),
            ]);
        }

        lines.extend(arcpy_op_blocks(
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
            "    # --- Example: SQL WHERE filter ---".to_string(),
            format!(
                r#"    # with arcpy.da.SearchCursor(fc_{var}, ["*"], where_clause="field = 'value'") as cur:"#
            ),
            "    #     for row in cur:".to_string(),
            "    #         print(row)".to_string(),
            String::new(),
            "else:".to_string(),
            format!(
                r#"    print(f"[ERROR] Layer '{}.{}' not found in SDE connection.")"#,
                layer.schema, layer.table
            ),
            String::new(),
        ]);
    }

    if let Some(t) = template {
        if let Some(teardown) = &t.teardown {
            lines.push(teardown.clone());
            lines.push(String::new());
        }
    }

    lines.join("\n")
}
