//! Web-mapping script generators: Folium (Leaflet), Kepler.gl and pydeck.
//!
//! All three load layers through geopandas `read_postgis` and never embed
//! the password: the generated scripts read `PGPASSWORD` from the
//! environment (and fail fast when it is unset, hence `os.environ[...]`
//! rather than `.get`).

use chrono::Local;

use crate::config::DbConfig;
use crate::schema::{safe_var, Column, Schema};

/// Cycling palette used to assign distinct colours to layers:
/// hex form for Folium, RGBA list form for pydeck.
const WEB_COLORS: [(&str, &str); 6] = [
    ("#ff8c00", "[255, 140, 0, 160]"),   // orange
    ("#0080ff", "[0, 128, 255, 160]"),   // blue
    ("#00c864", "[0, 200, 100, 160]"),   // green
    ("#ff3232", "[255, 50, 50, 160]"),   // red
    ("#b400ff", "[180, 0, 255, 160]"),   // purple
    ("#00c8c8", "[0, 200, 200, 160]"),   // teal
];

const HEIGHT_HINTS: [&str; 12] = [
    "height",
    "bldg_height",
    "building_height",
    "h",
    "elev",
    "elevation",
    "floors",
    "num_floors",
    "stories",
    "z",
    "roof_height",
    "max_height",
];

/// First column whose name looks like a building-height attribute
pub fn guess_height_field(columns: &[Column]) -> Option<&str> {
    columns
        .iter()
        .find(|c| HEIGHT_HINTS.contains(&c.name.to_lowercase().as_str()))
        .map(|c| c.name.as_str())
}

fn engine_lines(db: &DbConfig) -> Vec<String> {
    vec![
        format!(r#"DB_HOST     = "{}""#, db.host),
        format!("DB_PORT     = {}", db.port),
        format!(r#"DB_NAME     = "{}""#, db.dbname),
        format!(r#"DB_USER     = "{}""#, db.user),
        r#"DB_PASSWORD = os.environ["PGPASSWORD"]"#.to_string(),
    ]
}

fn create_engine_lines() -> Vec<String> {
    vec![
        "engine = create_engine(".to_string(),
        r#"    f"postgresql://{DB_USER}:{quote_plus(DB_PASSWORD)}@{DB_HOST}:{DB_PORT}/{DB_NAME}""#
            .to_string(),
        ")".to_string(),
        String::new(),
    ]
}

fn read_postgis_lines(var: &str, schema_name: &str, table: &str, geom_column: &str) -> Vec<String> {
    vec![
        format!("gdf_{var} = gpd.read_postgis("),
        format!(r#"    'SELECT * FROM "{schema_name}"."{table}"',"#),
        "    engine,".to_string(),
        format!(r#"    geom_col="{geom_column}","#),
        ")".to_string(),
    ]
}

/// Folium (Leaflet) web map script
pub fn generate_folium(schema: &Schema, db: &DbConfig) -> String {
    let layers = &schema.layers;

    let mut lines: Vec<String> = vec![
        r#"""""#.to_string(),
        "Auto-generated Folium (Leaflet) web map".to_string(),
        format!("Database : {} @ {}:{}", db.dbname, db.host, db.port),
        format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M")),
        format!("Layers   : {}", layers.len()),
        String::new(),
        "Install:  pip install geopandas folium sqlalchemy psycopg2-binary".to_string(),
        "Run:      python <this_file>.py  →  opens map.html".to_string(),
        r#"""""#.to_string(),
        String::new(),
        "import os".to_string(),
        "from urllib.parse import quote_plus".to_string(),
        "import geopandas as gpd".to_string(),
        "import folium".to_string(),
        "from sqlalchemy import create_engine".to_string(),
        String::new(),
    ];
    lines.extend(engine_lines(db));
    lines.push(r#"OUTPUT_HTML = "map.html""#.to_string());
    lines.push(String::new());
    lines.extend(create_engine_lines());

    for layer in layers {
        let var = safe_var(&layer.table);
        lines.extend([
            format!("# {}", "=".repeat(66)),
            format!(
                "# Layer: {}.{}  ({}, SRID {})",
                layer.schema, layer.table, layer.geometry.geom_type, layer.geometry.srid
            ),
            format!("# {}", "=".repeat(66)),
        ]);
        lines.extend(read_postgis_lines(
            &var,
            &layer.schema,
            &layer.table,
            &layer.geometry.column,
        ));
        lines.extend([
            format!("gdf_{var} = gdf_{var}.to_crs(epsg=4326)"),
            format!(
                r#"print(f"[OK] {}: {{len(gdf_{var})}} features")"#,
                layer.table
            ),
            String::new(),
        ]);
    }

    // Map centre from the first layer's bounds
    let first_var = layers
        .first()
        .map(|l| safe_var(&l.table))
        .unwrap_or_else(|| "layer".to_string());
    lines.extend([
        "# --- Build map ---".to_string(),
        format!("_b = gdf_{first_var}.total_bounds  # [minx, miny, maxx, maxy]"),
        "_cx, _cy = (_b[0] + _b[2]) / 2, (_b[1] + _b[3]) / 2".to_string(),
        String::new(),
        r#"m = folium.Map(location=[_cy, _cx], zoom_start=12, tiles="CartoDB positron")"#
            .to_string(),
        String::new(),
    ]);

    for (i, layer) in layers.iter().enumerate() {
        let var = safe_var(&layer.table);
        let geom_type = layer.geometry.geom_type.to_uppercase();
        let (hex_color, _) = WEB_COLORS[i % WEB_COLORS.len()];
        let tooltip_fields: Vec<&str> = layer
            .columns
            .iter()
            .take(5)
            .map(|c| c.name.as_str())
            .collect();
        let tooltip_aliases: Vec<String> = tooltip_fields
            .iter()
            .map(|f| title_case(&f.replace('_', " ")))
            .collect();

        // Style differs by geometry family
        let is_line = geom_type.contains("LINE");
        let is_point = geom_type.contains("POINT");
        let style = if is_line {
            format!(r#"{{"color": "{hex_color}", "weight": 2, "fillOpacity": 0.0}}"#)
        } else if is_point {
            format!(
                r#"{{"color": "{hex_color}", "fillColor": "{hex_color}", "radius": 5, "fillOpacity": 0.7}}"#
            )
        } else {
            format!(
                r##"{{"fillColor": "{hex_color}", "color": "#333333", "weight": 1, "fillOpacity": 0.5}}"##
            )
        };

        lines.extend([
            "folium.GeoJson(".to_string(),
            format!("    gdf_{var}.__geo_interface__,"),
            format!(r#"    name="{}","#, layer.table),
            format!("    style_function=lambda _: {style},"),
        ]);
        if !tooltip_fields.is_empty() {
            lines.extend([
                "    tooltip=folium.GeoJsonTooltip(".to_string(),
                format!("        fields={},", python_str_list(&tooltip_fields)),
                format!(
                    "        aliases={},",
                    python_str_list(
                        &tooltip_aliases.iter().map(String::as_str).collect::<Vec<_>>()
                    )
                ),
                "        sticky=True,".to_string(),
                "    ),".to_string(),
            ]);
        }
        lines.push(").add_to(m)".to_string());
        lines.push(String::new());
    }

    lines.extend([
        "folium.LayerControl(collapsed=False).add_to(m)".to_string(),
        "m.save(OUTPUT_HTML)".to_string(),
        r#"print(f"[OK] Map saved to {OUTPUT_HTML}")"#.to_string(),
    ]);

    lines.join("\n")
}

/// Kepler.gl web map script
pub fn generate_kepler(schema: &Schema, db: &DbConfig) -> String {
    let layers = &schema.layers;

    let mut lines: Vec<String> = vec![
        r#"""""#.to_string(),
        "Auto-generated Kepler.gl web map".to_string(),
        format!("Database : {} @ {}:{}", db.dbname, db.host, db.port),
        format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M")),
        format!("Layers   : {}", layers.len()),
        String::new(),
        "Install:  pip install geopandas keplergl sqlalchemy psycopg2-binary".to_string(),
        "Run:      python <this_file>.py  →  opens kepler_map.html".to_string(),
        "         (or call map_k in a Jupyter cell to render inline)".to_string(),
        r#"""""#.to_string(),
        String::new(),
        "import os".to_string(),
        "from urllib.parse import quote_plus".to_string(),
        "import geopandas as gpd".to_string(),
        "from keplergl import KeplerGl".to_string(),
        "from sqlalchemy import create_engine".to_string(),
        String::new(),
    ];
    lines.extend(engine_lines(db));
    lines.push(r#"OUTPUT_HTML = "kepler_map.html""#.to_string());
    lines.push(String::new());
    lines.extend(create_engine_lines());
    lines.push("map_k = KeplerGl(height=600)".to_string());
    lines.push(String::new());

    for layer in layers {
        let var = safe_var(&layer.table);
        let height_col = guess_height_field(&layer.columns);

        lines.extend([
            format!("# {}", "=".repeat(66)),
            format!(
                "# Layer: {}.{}  ({}, SRID {})",
                layer.schema, layer.table, layer.geometry.geom_type, layer.geometry.srid
            ),
        ]);
        if let Some(col) = height_col {
            lines.push(format!(r#"# 3D height field detected: "{col}""#));
        }
        lines.push(format!("# {}", "=".repeat(66)));
        lines.extend(read_postgis_lines(
            &var,
            &layer.schema,
            &layer.table,
            &layer.geometry.column,
        ));
        lines.extend([
            format!(
                r#"print(f"[OK] {}: {{len(gdf_{var})}} features")"#,
                layer.table
            ),
            format!(r#"map_k.add_data(data=gdf_{var}, name="{}")"#, layer.table),
        ]);
        if let Some(col) = height_col {
            lines.extend([
                format!("# 3D tip: in the Kepler UI → Layers → {}", layer.table),
                format!(
                    r#"#   set type to "GeoJson", enable "3D buildings", height field = "{col}""#
                ),
            ]);
        }
        lines.push(String::new());
    }

    lines.extend([
        "map_k.save_to_html(file_name=OUTPUT_HTML)".to_string(),
        r#"print(f"[OK] Kepler map saved to {OUTPUT_HTML}")"#.to_string(),
    ]);

    lines.join("\n")
}

/// pydeck (deck.gl) web map script
pub fn generate_deck(schema: &Schema, db: &DbConfig) -> String {
    let layers = &schema.layers;

    let mut lines: Vec<String> = vec![
        r#"""""#.to_string(),
        "Auto-generated pydeck (deck.gl) web map".to_string(),
        format!("Database : {} @ {}:{}", db.dbname, db.host, db.port),
        format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M")),
        format!("Layers   : {}", layers.len()),
        String::new(),
        "Install:  pip install geopandas pydeck sqlalchemy psycopg2-binary".to_string(),
        "Run:      python <this_file>.py  →  opens deck_map.html".to_string(),
        r#"""""#.to_string(),
        String::new(),
        "import os".to_string(),
        "import json".to_string(),
        "from urllib.parse import quote_plus".to_string(),
        "import geopandas as gpd".to_string(),
        "import pydeck as pdk".to_string(),
        "from sqlalchemy import create_engine".to_string(),
        String::new(),
    ];
    lines.extend(engine_lines(db));
    lines.push(r#"OUTPUT_HTML = "deck_map.html""#.to_string());
    lines.push(String::new());
    lines.extend(create_engine_lines());
    lines.push("_deck_layers = []".to_string());
    lines.push(String::new());

    let first_var = layers
        .first()
        .map(|l| safe_var(&l.table))
        .unwrap_or_else(|| "layer".to_string());

    for (i, layer) in layers.iter().enumerate() {
        let var = safe_var(&layer.table);
        let height_col = guess_height_field(&layer.columns);
        let (_, rgba) = WEB_COLORS[i % WEB_COLORS.len()];
        let is_point = layer.geometry.geom_type.to_uppercase().contains("POINT");

        lines.extend([
            format!("# {}", "=".repeat(66)),
            format!(
                "# Layer: {}.{}  ({}, SRID {})",
                layer.schema, layer.table, layer.geometry.geom_type, layer.geometry.srid
            ),
        ]);
        if let Some(col) = height_col {
            lines.push(format!(r#"# 3D height field detected: "{col}""#));
        }
        lines.push(format!("# {}", "=".repeat(66)));
        lines.extend(read_postgis_lines(
            &var,
            &layer.schema,
            &layer.table,
            &layer.geometry.column,
        ));
        lines.extend([
            format!("gdf_{var} = gdf_{var}.to_crs(epsg=4326)"),
            format!(
                r#"print(f"[OK] {}: {{len(gdf_{var})}} features")"#,
                layer.table
            ),
            String::new(),
        ]);

        if is_point {
            // ScatterplotLayer for points
            lines.extend([
                format!("_lyr_{var} = pdk.Layer("),
                r#"    "ScatterplotLayer","#.to_string(),
                format!(r#"    data=json.loads(gdf_{var}.to_json())["features"],"#),
                r#"    get_position="geometry.coordinates","#.to_string(),
                format!("    get_fill_color={rgba},"),
                "    get_radius=50,".to_string(),
                "    radius_min_pixels=3,".to_string(),
                "    pickable=True,".to_string(),
                ")".to_string(),
            ]);
        } else {
            // GeoJsonLayer for polygons/lines, with optional 3D extrusion
            lines.extend([
                format!("_lyr_{var} = pdk.Layer("),
                r#"    "GeoJsonLayer","#.to_string(),
                format!("    data=json.loads(gdf_{var}.to_json()),"),
                format!("    get_fill_color={rgba},"),
                "    get_line_color=[50, 50, 50, 200],".to_string(),
                "    line_width_min_pixels=1,".to_string(),
                "    pickable=True,".to_string(),
            ]);
            if let Some(col) = height_col {
                lines.extend([
                    "    # 3D extrusion — uncomment to enable:".to_string(),
                    "    # extruded=True,".to_string(),
                    format!(r#"    # get_elevation="properties.{col}","#),
                    "    # elevation_scale=1,".to_string(),
                ]);
            }
            lines.push(")".to_string());
        }

        lines.push(format!("_deck_layers.append(_lyr_{var})"));
        lines.push(String::new());
    }

    lines.extend([
        format!("_b   = gdf_{first_var}.total_bounds"),
        "_cx, _cy = (_b[0] + _b[2]) / 2, (_b[1] + _b[3]) / 2".to_string(),
        String::new(),
        "_view = pdk.ViewState(".to_string(),
        "    latitude=_cy,".to_string(),
        "    longitude=_cx,".to_string(),
        "    zoom=12,".to_string(),
        "    pitch=0,  # Set to 45 for 3D view when using extrusion".to_string(),
        ")".to_string(),
        String::new(),
        "r = pdk.Deck(".to_string(),
        "    layers=_deck_layers,".to_string(),
        "    initial_view_state=_view,".to_string(),
        r#"    map_style="light","#.to_string(),
        ")".to_string(),
        "r.to_html(OUTPUT_HTML)".to_string(),
        r#"print(f"[OK] pydeck map saved to {OUTPUT_HTML}")"#.to_string(),
    ]);

    lines.join("\n")
}

/// Python list literal of single-quoted strings, matching `str(list)`
fn python_str_list(items: &[&str]) -> String {
    format!(
        "[{}]",
        items
            .iter()
            .map(|i| format!("'{i}'"))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// Uppercase the first letter of each word (tooltip aliases)
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
