//! PostGIS → GeoPackage export script generator.
//!
//! The generated script writes every layer into one `.gpkg` file: the first
//! layer creates the file (`mode="w"`), subsequent layers append. Each layer
//! is wrapped in its own try/except so a single failing table does not stop
//! the run; the script exits nonzero when any layer failed.

use chrono::Local;

use crate::config::DbConfig;
use crate::schema::{safe_var, Schema};

pub fn generate_export(schema: &Schema, db: &DbConfig) -> String {
    let layers = &schema.layers;
    let n = layers.len();

    let mut lines: Vec<String> = vec![
        r#"""""#.to_string(),
        "Auto-generated PostGIS -> GeoPackage export script".to_string(),
        String::new(),
        format!("Database : {} @ {}:{}", schema.database, db.host, db.port),
        format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M")),
        format!("Layers   : {n}"),
        String::new(),
        "Install:  pip install geopandas sqlalchemy psycopg2-binary".to_string(),
        format!("Run:      python <this_file>.py  ->  {}_export.gpkg", db.dbname),
        r#"""""#.to_string(),
        String::new(),
        "import os".to_string(),
        "import sys".to_string(),
        "from urllib.parse import quote_plus".to_string(),
        "import geopandas as gpd".to_string(),
        "from sqlalchemy import create_engine".to_string(),
        String::new(),
        format!(r#"DB_HOST     = "{}""#, db.host),
        format!("DB_PORT     = {}", db.port),
        format!(r#"DB_NAME     = "{}""#, db.dbname),
        format!(r#"DB_USER     = "{}""#, db.user),
        r#"DB_PASSWORD = os.environ["PGPASSWORD"]"#.to_string(),
        r#"OUTPUT_GPKG = f"{DB_NAME}_export.gpkg""#.to_string(),
        String::new(),
        "engine = create_engine(".to_string(),
        r#"    f"postgresql://{DB_USER}:{quote_plus(DB_PASSWORD)}@{DB_HOST}:{DB_PORT}/{DB_NAME}""#
            .to_string(),
        ")".to_string(),
        String::new(),
        format!(r#"print(f"[export] Writing {{OUTPUT_GPKG}} ({n} layer(s))")"#),
        "_ok = 0".to_string(),
        String::new(),
    ];

    for (i, layer) in layers.iter().enumerate() {
        let var = safe_var(&layer.table);
        let rows_hint = match layer.row_count_estimate {
            Some(est) if est >= 0 => format!("~{est} rows"),
            _ => "row count unknown".to_string(),
        };
        // First layer creates the file; subsequent layers append
        let write_mode = if i == 0 { r#""w""# } else { r#""a""# };

        lines.extend([
            format!("# {}", "=".repeat(66)),
            format!("# [{}/{n}] {}.{}", i + 1, layer.schema, layer.table),
            format!(
                "#     Geometry : {}   SRID: {}   {rows_hint}",
                layer.geometry.geom_type, layer.geometry.srid
            ),
            format!("# {}", "=".repeat(66)),
            format!(
                r#"print(f"[{}/{n}] {} ...", end=" ", flush=True)"#,
                i + 1,
                layer.table
            ),
            "try:".to_string(),
            format!("    gdf_{var} = gpd.read_postgis("),
            format!(r#"        'SELECT * FROM "{}"."{}"',"#, layer.schema, layer.table),
            "        engine,".to_string(),
            format!(r#"        geom_col="{}","#, layer.geometry.column),
            "    )".to_string(),
            format!(
                "    # CRS is preserved from PostGIS (SRID {}).",
                layer.geometry.srid
            ),
            format!("    # To reproject: gdf_{var} = gdf_{var}.to_crs(epsg=4326)"),
            format!(
                r#"    gdf_{var}.to_file(OUTPUT_GPKG, layer="{}", driver="GPKG", mode={write_mode})"#,
                layer.table
            ),
            format!(r#"    print(f"OK  ({{len(gdf_{var})}} rows)")"#),
            "    _ok += 1".to_string(),
            "except Exception as _e:".to_string(),
            r#"    print(f"FAILED  ({_e})", file=sys.stderr)"#.to_string(),
            String::new(),
        ]);
    }

    lines.extend([
        "engine.dispose()".to_string(),
        format!(r#"print(f"\n[DONE] {{_ok}}/{n} layers written to {{OUTPUT_GPKG}}")"#),
        format!("if _ok < {n}:"),
        "    sys.exit(1)".to_string(),
    ]);

    lines.join("\n")
}
