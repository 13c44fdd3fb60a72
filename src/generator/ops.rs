//! Operation block library.
//!
//! Each operation independently emits a fixed block of target-platform code,
//! 4-space indented so it nests under the enclosing per-layer block. Blocks
//! are self-contained: they reference only variables they define themselves
//! plus the layer variable from the enclosing block.
//!
//! clip, spatial_join and intersect emit commented-out scaffolding: they need
//! a second input layer the schema cannot provide, so the generated code
//! cannot be runnable as-is. That partial state is part of the contract.

use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

use crate::schema::Column;

/// One injectable geometric processing step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[value(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    // general
    Reproject,
    Export,
    Buffer,
    Clip,
    Select,
    Dissolve,
    Centroid,
    FieldCalc,
    SpatialJoin,
    Intersect,
    // 3D massing
    Extrude,
    ZStats,
    FloorCeiling,
    Volume,
    SceneLayer,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::Reproject,
        Operation::Export,
        Operation::Buffer,
        Operation::Clip,
        Operation::Select,
        Operation::Dissolve,
        Operation::Centroid,
        Operation::FieldCalc,
        Operation::SpatialJoin,
        Operation::Intersect,
        Operation::Extrude,
        Operation::ZStats,
        Operation::FloorCeiling,
        Operation::Volume,
        Operation::SceneLayer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Reproject => "reproject",
            Operation::Export => "export",
            Operation::Buffer => "buffer",
            Operation::Clip => "clip",
            Operation::Select => "select",
            Operation::Dissolve => "dissolve",
            Operation::Centroid => "centroid",
            Operation::FieldCalc => "field_calc",
            Operation::SpatialJoin => "spatial_join",
            Operation::Intersect => "intersect",
            Operation::Extrude => "extrude",
            Operation::ZStats => "z_stats",
            Operation::FloorCeiling => "floor_ceiling",
            Operation::Volume => "volume",
            Operation::SceneLayer => "scene_layer",
        }
    }

    /// Operations whose PyQGIS rendition calls `processing.run`
    pub fn needs_processing(self) -> bool {
        matches!(
            self,
            Operation::Reproject
                | Operation::Buffer
                | Operation::Clip
                | Operation::Dissolve
                | Operation::Centroid
                | Operation::FieldCalc
                | Operation::SpatialJoin
                | Operation::Intersect
                | Operation::SceneLayer
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn first_col_name(columns: &[Column]) -> &str {
    columns.first().map(|c| c.name.as_str()).unwrap_or("field_name")
}

/// Emit 4-space-indented PyQGIS lines for each requested operation.
///
/// Blocks appear in the fixed registry order regardless of request order.
pub fn pyqgis_op_blocks(
    var: &str,
    table: &str,
    columns: &[Column],
    ops: &[Operation],
) -> Vec<String> {
    let has = |op: Operation| ops.contains(&op);
    let first_col = first_col_name(columns);
    let mut lines: Vec<String> = Vec::new();

    if has(Operation::Reproject) {
        lines.extend([
            "    # --- reproject ---".to_string(),
            r#"    # TODO: change "EPSG:4326" to your target CRS"#.to_string(),
            format!(r#"    _target_crs_{var} = QgsCoordinateReferenceSystem("EPSG:4326")"#),
            format!(r#"    _reproj_{var} = processing.run("native:reprojectlayer", {{"#),
            format!(r#"        "INPUT":      lyr_{var},"#),
            format!(r#"        "TARGET_CRS": _target_crs_{var},"#),
            r#"        "OUTPUT":     "memory:","#.to_string(),
            "    })".to_string(),
            format!(r#"    lyr_{var}_reprojected = _reproj_{var}["OUTPUT"]"#),
            format!(
                r#"    print(f"  Reprojected: {{lyr_{var}_reprojected.featureCount()}} features")"#
            ),
            String::new(),
        ]);
    }

    if has(Operation::Export) {
        lines.extend([
            "    # --- export to GeoJSON ---".to_string(),
            "    # TODO: change output path".to_string(),
            "    from qgis.core import QgsVectorFileWriter".to_string(),
            format!(r#"    _out_{var} = f"/tmp/{table}.geojson""#),
            format!(r#"    _err_{var}, _msg_{var} = QgsVectorFileWriter.writeAsVectorFormat("#),
            format!(r#"        lyr_{var}, _out_{var}, "utf-8", lyr_{var}.crs(), "GeoJSON","#),
            "    )".to_string(),
            format!(r#"    if _err_{var} == QgsVectorFileWriter.NoError:"#),
            format!(r#"        print(f"  Exported to {{_out_{var}}}")"#),
            "    else:".to_string(),
            format!(r#"        print(f"  Export error: {{_msg_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::Buffer) {
        lines.extend([
            "    # --- buffer ---".to_string(),
            "    # TODO: set DISTANCE in layer CRS units".to_string(),
            format!(r#"    _buf_{var} = processing.run("native:buffer", {{"#),
            format!(r#"        "INPUT":         lyr_{var},"#),
            r#"        "DISTANCE":      100,"#.to_string(),
            r#"        "SEGMENTS":      5,"#.to_string(),
            r#"        "END_CAP_STYLE": 0,"#.to_string(),
            r#"        "JOIN_STYLE":    0,"#.to_string(),
            r#"        "MITER_LIMIT":   2,"#.to_string(),
            r#"        "DISSOLVE":      False,"#.to_string(),
            r#"        "OUTPUT":        "memory:","#.to_string(),
            "    })".to_string(),
            format!(r#"    lyr_{var}_buffer = _buf_{var}["OUTPUT"]"#),
            format!(r#"    print(f"  Buffer: {{lyr_{var}_buffer.featureCount()}} features")"#),
            String::new(),
        ]);
    }

    if has(Operation::Clip) {
        lines.extend([
            "    # --- clip ---".to_string(),
            format!("    # TODO: define clip_layer_{var}, then uncomment"),
            format!(
                r#"    # clip_layer_{var} = QgsVectorLayer("/path/to/boundary.shp", "boundary", "ogr")"#
            ),
            format!(r#"    # _clip_{var} = processing.run("native:clip", {{"#),
            format!(r#"    #     "INPUT":   lyr_{var},"#),
            format!(r#"    #     "OVERLAY": clip_layer_{var},"#),
            r#"    #     "OUTPUT":  "memory:","#.to_string(),
            "    # })".to_string(),
            format!(r#"    # lyr_{var}_clipped = _clip_{var}["OUTPUT"]"#),
            format!(r#"    # print(f"  Clipped: {{lyr_{var}_clipped.featureCount()}} features")"#),
            String::new(),
        ]);
    }

    if has(Operation::Select) {
        lines.extend([
            "    # --- select by attribute ---".to_string(),
            "    # TODO: update expression".to_string(),
            format!(r#"    lyr_{var}.selectByExpression('"{first_col}" IS NOT NULL')"#),
            format!(r#"    print(f"  Selected: {{lyr_{var}.selectedFeatureCount()}} features")"#),
            format!("    lyr_{var}.removeSelection()"),
            String::new(),
        ]);
    }

    if has(Operation::Dissolve) {
        lines.extend([
            "    # --- dissolve ---".to_string(),
            "    # TODO: set FIELD list (empty = dissolve all into one feature)".to_string(),
            format!(r#"    _diss_{var} = processing.run("native:dissolve", {{"#),
            format!(r#"        "INPUT":  lyr_{var},"#),
            r#"        "FIELD":  [],  # e.g. ["district_name"]"#.to_string(),
            r#"        "OUTPUT": "memory:","#.to_string(),
            "    })".to_string(),
            format!(r#"    lyr_{var}_dissolved = _diss_{var}["OUTPUT"]"#),
            format!(
                r#"    print(f"  Dissolved: {{lyr_{var}_dissolved.featureCount()}} features")"#
            ),
            String::new(),
        ]);
    }

    if has(Operation::Centroid) {
        lines.extend([
            "    # --- centroid ---".to_string(),
            format!(r#"    _cent_{var} = processing.run("native:centroids", {{"#),
            format!(r#"        "INPUT":     lyr_{var},"#),
            r#"        "ALL_PARTS": False,"#.to_string(),
            r#"        "OUTPUT":    "memory:","#.to_string(),
            "    })".to_string(),
            format!(r#"    lyr_{var}_centroids = _cent_{var}["OUTPUT"]"#),
            format!(r#"    print(f"  Centroids: {{lyr_{var}_centroids.featureCount()}} points")"#),
            String::new(),
        ]);
    }

    if has(Operation::FieldCalc) {
        lines.extend([
            "    # --- field calculator ---".to_string(),
            "    # TODO: set FIELD_NAME and FORMULA (uses QGIS expression syntax)".to_string(),
            format!(r#"    _calc_{var} = processing.run("native:fieldcalculator", {{"#),
            format!(r#"        "INPUT":           lyr_{var},"#),
            r#"        "FIELD_NAME":      "new_field",  # TODO: change"#.to_string(),
            r#"        "FIELD_TYPE":      0,            # 0=float, 1=int, 2=string"#.to_string(),
            r#"        "FIELD_LENGTH":    20,"#.to_string(),
            r#"        "FIELD_PRECISION": 3,"#.to_string(),
            r#"        "FORMULA":         "$area",      # TODO: change expression"#.to_string(),
            r#"        "OUTPUT":          "memory:","#.to_string(),
            "    })".to_string(),
            format!(r#"    lyr_{var}_calculated = _calc_{var}["OUTPUT"]"#),
            format!(
                r#"    print(f"  Field calculated: {{lyr_{var}_calculated.featureCount()}} features")"#
            ),
            String::new(),
        ]);
    }

    if has(Operation::SpatialJoin) {
        lines.extend([
            "    # --- spatial join ---".to_string(),
            format!("    # TODO: define join_layer_{var}, then uncomment"),
            format!(
                r#"    # join_layer_{var} = QgsVectorLayer("/path/to/join.shp", "join", "ogr")"#
            ),
            format!(r#"    # _sjoin_{var} = processing.run("native:joinattributesbylocation", {{"#),
            format!(r#"    #     "INPUT":              lyr_{var},"#),
            format!(r#"    #     "JOIN":               join_layer_{var},"#),
            r#"    #     "PREDICATE":          [0],  # 0=intersects, 1=contains, 2=equals"#
                .to_string(),
            r#"    #     "JOIN_FIELDS":        [],   # empty = all fields"#.to_string(),
            r#"    #     "METHOD":             1,    # 1=first match, 2=largest overlap"#
                .to_string(),
            r#"    #     "DISCARD_NONMATCHING": False,"#.to_string(),
            r#"    #     "OUTPUT":             "memory:","#.to_string(),
            "    # })".to_string(),
            format!(r#"    # lyr_{var}_joined = _sjoin_{var}["OUTPUT"]"#),
            format!(
                r#"    # print(f"  Spatial join: {{lyr_{var}_joined.featureCount()}} features")"#
            ),
            String::new(),
        ]);
    }

    if has(Operation::Intersect) {
        lines.extend([
            "    # --- intersect ---".to_string(),
            format!("    # TODO: define overlay_layer_{var}, then uncomment"),
            format!(
                r#"    # overlay_layer_{var} = QgsVectorLayer("/path/to/overlay.shp", "overlay", "ogr")"#
            ),
            format!(r#"    # _isect_{var} = processing.run("native:intersection", {{"#),
            format!(r#"    #     "INPUT":          lyr_{var},"#),
            format!(r#"    #     "OVERLAY":        overlay_layer_{var},"#),
            r#"    #     "INPUT_FIELDS":   [],"#.to_string(),
            r#"    #     "OVERLAY_FIELDS": [],"#.to_string(),
            r#"    #     "OUTPUT":         "memory:","#.to_string(),
            "    # })".to_string(),
            format!(r#"    # lyr_{var}_intersected = _isect_{var}["OUTPUT"]"#),
            format!(
                r#"    # print(f"  Intersect: {{lyr_{var}_intersected.featureCount()}} features")"#
            ),
            String::new(),
        ]);
    }

    // 3D massing

    if has(Operation::Extrude) {
        lines.extend([
            "    # --- 3D extrude ---".to_string(),
            "    # Applies a data-defined extrusion renderer to the layer.".to_string(),
            "    # TODO: set HEIGHT_FIELD to your building height attribute.".to_string(),
            "    from qgis.core import (".to_string(),
            "        QgsPolygon3DSymbol, QgsVectorLayer3DRenderer,".to_string(),
            "        QgsAbstract3DSymbol, QgsProperty,".to_string(),
            "    )".to_string(),
            format!(r#"    _HEIGHT_FIELD_{var} = "height"  # TODO: change"#),
            format!("    _sym3d_{var} = QgsPolygon3DSymbol()"),
            format!("    _ddp_{var}   = _sym3d_{var}.dataDefinedProperties()"),
            format!("    _ddp_{var}.setProperty("),
            "        QgsAbstract3DSymbol.PropertyExtrusionHeight,".to_string(),
            format!("        QgsProperty.fromField(_HEIGHT_FIELD_{var}),"),
            "    )".to_string(),
            format!("    _sym3d_{var}.setDataDefinedProperties(_ddp_{var})"),
            format!("    _rndr3d_{var} = QgsVectorLayer3DRenderer()"),
            format!("    _rndr3d_{var}.setSymbol(_sym3d_{var})"),
            format!("    lyr_{var}.setRenderer3D(_rndr3d_{var})"),
            format!("    lyr_{var}.triggerRepaint()"),
            format!(
                r#"    print(f"  3D extrusion applied using '{{_HEIGHT_FIELD_{var}}}'")"#
            ),
            String::new(),
        ]);
    }

    if has(Operation::ZStats) {
        lines.extend([
            "    # --- Z statistics ---".to_string(),
            "    from qgis.core import QgsWkbTypes".to_string(),
            format!("    if QgsWkbTypes.hasZ(lyr_{var}.wkbType()):"),
            format!("        _zvals_{var} = []"),
            format!("        for _feat in lyr_{var}.getFeatures():"),
            "            for _v in _feat.geometry().vertices():".to_string(),
            format!("                _zvals_{var}.append(_v.z())"),
            format!("        if _zvals_{var}:"),
            format!(r#"            print(f"  Z min : {{min(_zvals_{var}):.3f}}")"#),
            format!(r#"            print(f"  Z max : {{max(_zvals_{var}):.3f}}")"#),
            format!(
                r#"            print(f"  Z mean: {{sum(_zvals_{var})/len(_zvals_{var}):.3f}}")"#
            ),
            "    else:".to_string(),
            r#"        print("  Layer has no Z values — load a 3D geometry source.")"#.to_string(),
            String::new(),
        ]);
    }

    if has(Operation::FloorCeiling) {
        lines.extend([
            "    # --- floor / ceiling heights ---".to_string(),
            "    # Extrudes from a base elevation to a roof elevation using two fields."
                .to_string(),
            "    # TODO: set BASE_FIELD and ROOF_FIELD.".to_string(),
            "    from qgis.core import (".to_string(),
            "        QgsPolygon3DSymbol, QgsVectorLayer3DRenderer,".to_string(),
            "        QgsAbstract3DSymbol, QgsProperty,".to_string(),
            "    )".to_string(),
            format!(r#"    _BASE_FIELD_{var} = "base_height"  # TODO: change"#),
            format!(r#"    _ROOF_FIELD_{var} = "roof_height"  # TODO: change"#),
            format!("    _sym_fc_{var} = QgsPolygon3DSymbol()"),
            format!("    _ddp_fc_{var} = _sym_fc_{var}.dataDefinedProperties()"),
            "    # Base (floor) elevation".to_string(),
            format!("    _ddp_fc_{var}.setProperty("),
            "        QgsAbstract3DSymbol.PropertyHeight,".to_string(),
            format!("        QgsProperty.fromField(_BASE_FIELD_{var}),"),
            "    )".to_string(),
            "    # Extrusion = roof - base".to_string(),
            format!("    _ddp_fc_{var}.setProperty("),
            "        QgsAbstract3DSymbol.PropertyExtrusionHeight,".to_string(),
            "        QgsProperty.fromExpression(".to_string(),
            format!(r#"            f'"{{_ROOF_FIELD_{var}}}" - "{{_BASE_FIELD_{var}}}"'"#),
            "        ),".to_string(),
            "    )".to_string(),
            format!("    _sym_fc_{var}.setDataDefinedProperties(_ddp_fc_{var})"),
            format!("    _rndr_fc_{var} = QgsVectorLayer3DRenderer()"),
            format!("    _rndr_fc_{var}.setSymbol(_sym_fc_{var})"),
            format!("    lyr_{var}.setRenderer3D(_rndr_fc_{var})"),
            format!("    lyr_{var}.triggerRepaint()"),
            format!(
                r#"    print(f"  Floor/ceiling extrusion: base='{{_BASE_FIELD_{var}}}' roof='{{_ROOF_FIELD_{var}}}'")"#
            ),
            String::new(),
        ]);
    }

    if has(Operation::Volume) {
        lines.extend([
            "    # --- approximate volume (footprint area × height) ---".to_string(),
            "    # TODO: set HEIGHT_FIELD.".to_string(),
            "    # For exact 3D volume use ST_Volume() directly in PostGIS.".to_string(),
            format!(r#"    _VOL_HEIGHT_{var} = "height"  # TODO: change"#),
            format!("    _total_vol_{var} = 0.0"),
            format!("    for _feat in lyr_{var}.getFeatures():"),
            format!("        _h = _feat[_VOL_HEIGHT_{var}]"),
            "        if _h:".to_string(),
            format!("            _total_vol_{var} += _feat.geometry().area() * float(_h)"),
            format!(
                r#"    print(f"  Approx. total volume: {{_total_vol_{var}:,.1f}} (CRS units³)")"#
            ),
            String::new(),
        ]);
    }

    if has(Operation::SceneLayer) {
        lines.extend([
            "    # --- export to 3D Tiles (QGIS 3.34+) ---".to_string(),
            "    # TODO: set output directory. Requires the layer to have a 3D renderer."
                .to_string(),
            format!(r#"    _out_tiles_{var} = f"/tmp/{table}_3dtiles""#),
            "    import os as _os".to_string(),
            format!("    _os.makedirs(_out_tiles_{var}, exist_ok=True)"),
            format!(r#"    # processing.run("native:convert3dtiles", {{"#),
            format!(r#"    #     "INPUT":           lyr_{var},"#),
            format!(r#"    #     "OUTPUT_FOLDER":   _out_tiles_{var},"#),
            r#"    #     "COMPRESSION":     0,  # 0=None, 1=GZIP"#.to_string(),
            "    # })".to_string(),
            format!(r#"    # print(f"  3D Tiles written to: {{_out_tiles_{var}}}")"#),
            String::new(),
        ]);
    }

    lines
}

/// Emit 4-space-indented ArcPy lines for each requested operation.
pub fn arcpy_op_blocks(
    var: &str,
    table: &str,
    columns: &[Column],
    ops: &[Operation],
) -> Vec<String> {
    let has = |op: Operation| ops.contains(&op);
    let first_col = first_col_name(columns);
    let mut lines: Vec<String> = Vec::new();

    if has(Operation::Reproject) {
        lines.extend([
            "    # --- reproject ---".to_string(),
            "    # TODO: set output path and target WKID".to_string(),
            format!(
                r#"    _out_reproj_{var} = os.path.join(tempfile.gettempdir(), "{table}_reproj.shp")"#
            ),
            "    arcpy.management.Project(".to_string(),
            format!("        fc_{var},"),
            format!("        _out_reproj_{var},"),
            "        arcpy.SpatialReference(4326),  # TODO: change WKID".to_string(),
            "    )".to_string(),
            format!(r#"    print(f"  Reprojected to: {{_out_reproj_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::Export) {
        lines.extend([
            "    # --- export ---".to_string(),
            "    # TODO: set output directory".to_string(),
            format!("    _out_dir_{var} = tempfile.gettempdir()"),
            format!("    arcpy.conversion.FeatureClassToShapefile(fc_{var}, _out_dir_{var})"),
            format!(r#"    print(f"  Exported shapefile to: {{_out_dir_{var}}}")"#),
            "    # To export as GeoJSON:".to_string(),
            "    # arcpy.conversion.FeaturesToJSON(".to_string(),
            format!("    #     fc_{var},"),
            format!(r#"    #     os.path.join(_out_dir_{var}, "{table}.geojson"),"#),
            r#"    #     geoJSON="GEOJSON","#.to_string(),
            "    # )".to_string(),
            String::new(),
        ]);
    }

    if has(Operation::Buffer) {
        lines.extend([
            "    # --- buffer ---".to_string(),
            "    # TODO: set output path and distance".to_string(),
            format!(
                r#"    _out_buf_{var} = os.path.join(tempfile.gettempdir(), "{table}_buffer.shp")"#
            ),
            "    arcpy.analysis.Buffer(".to_string(),
            format!("        fc_{var},"),
            format!("        _out_buf_{var},"),
            r#"        "100 Meters",  # TODO: change distance and units"#.to_string(),
            r#"        "FULL", "ROUND", "NONE","#.to_string(),
            "    )".to_string(),
            format!(r#"    print(f"  Buffer saved to: {{_out_buf_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::Clip) {
        lines.extend([
            "    # --- clip ---".to_string(),
            "    # TODO: set clip boundary path, then uncomment".to_string(),
            format!(r#"    # _clip_fc_{var}  = r"C:\path\to\boundary.shp""#),
            format!(
                r#"    # _out_clip_{var} = os.path.join(tempfile.gettempdir(), "{table}_clipped.shp")"#
            ),
            format!("    # arcpy.analysis.Clip(fc_{var}, _clip_fc_{var}, _out_clip_{var})"),
            format!(r#"    # print(f"  Clipped to: {{_out_clip_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::Select) {
        lines.extend([
            "    # --- select by attribute ---".to_string(),
            "    # TODO: update where_clause".to_string(),
            format!(
                r#"    _lyr_sel_{var} = arcpy.management.MakeFeatureLayer(fc_{var}, "{table}_sel")[0]"#
            ),
            "    arcpy.management.SelectLayerByAttribute(".to_string(),
            format!(r#"        _lyr_sel_{var}, "NEW_SELECTION", "{first_col} IS NOT NULL","#),
            "    )".to_string(),
            format!("    _sel_count_{var} = int(arcpy.management.GetCount(_lyr_sel_{var})[0])"),
            format!(r#"    print(f"  Selected: {{_sel_count_{var}}} features")"#),
            format!("    arcpy.management.Delete(_lyr_sel_{var})"),
            String::new(),
        ]);
    }

    if has(Operation::Dissolve) {
        lines.extend([
            "    # --- dissolve ---".to_string(),
            "    # TODO: set dissolve_field (None = dissolve all into one feature)".to_string(),
            format!(
                r#"    _out_diss_{var} = os.path.join(tempfile.gettempdir(), "{table}_dissolved.shp")"#
            ),
            "    arcpy.management.Dissolve(".to_string(),
            format!("        fc_{var},"),
            format!("        _out_diss_{var},"),
            r#"        dissolve_field=None,  # e.g. "district_name""#.to_string(),
            r#"        multi_part="MULTI_PART","#.to_string(),
            "    )".to_string(),
            format!(r#"    print(f"  Dissolved to: {{_out_diss_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::Centroid) {
        lines.extend([
            "    # --- centroid ---".to_string(),
            format!(
                r#"    _out_cent_{var} = os.path.join(tempfile.gettempdir(), "{table}_centroids.shp")"#
            ),
            "    arcpy.management.FeatureToPoint(".to_string(),
            format!(r#"        fc_{var}, _out_cent_{var}, point_location="CENTROID","#),
            "    )".to_string(),
            format!(r#"    print(f"  Centroids saved to: {{_out_cent_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::FieldCalc) {
        lines.extend([
            "    # --- field calculator ---".to_string(),
            "    # Copies to temp first to avoid modifying the source DB".to_string(),
            "    # TODO: set field name, type, and expression".to_string(),
            format!(
                r#"    _out_calc_{var} = os.path.join(tempfile.gettempdir(), "{table}_calc.shp")"#
            ),
            format!("    arcpy.management.CopyFeatures(fc_{var}, _out_calc_{var})"),
            format!(r#"    arcpy.management.AddField(_out_calc_{var}, "new_field", "DOUBLE")"#),
            "    arcpy.management.CalculateField(".to_string(),
            format!("        _out_calc_{var},"),
            r#"        "new_field","#.to_string(),
            r#"        "!Shape_Area!",  # TODO: change expression"#.to_string(),
            r#"        "PYTHON3","#.to_string(),
            "    )".to_string(),
            format!(r#"    print(f"  Field calculated, saved to: {{_out_calc_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::SpatialJoin) {
        lines.extend([
            "    # --- spatial join ---".to_string(),
            format!("    # TODO: set _join_fc_{var} path, then uncomment"),
            format!(r#"    # _join_fc_{var}   = r"C:\path\to\join_layer.shp""#),
            format!(
                r#"    # _out_sjoin_{var} = os.path.join(tempfile.gettempdir(), "{table}_sjoin.shp")"#
            ),
            "    # arcpy.analysis.SpatialJoin(".to_string(),
            format!("    #     target_features=fc_{var},"),
            format!("    #     join_features=_join_fc_{var},"),
            format!("    #     out_feature_class=_out_sjoin_{var},"),
            r#"    #     join_operation="JOIN_ONE_TO_ONE","#.to_string(),
            r#"    #     join_type="KEEP_ALL","#.to_string(),
            r#"    #     match_option="INTERSECT","#.to_string(),
            "    # )".to_string(),
            format!(r#"    # print(f"  Spatial join saved to: {{_out_sjoin_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::Intersect) {
        lines.extend([
            "    # --- intersect ---".to_string(),
            format!("    # TODO: set _overlay_fc_{var} path, then uncomment"),
            format!(r#"    # _overlay_fc_{var} = r"C:\path\to\overlay.shp""#),
            format!(
                r#"    # _out_isect_{var}  = os.path.join(tempfile.gettempdir(), "{table}_intersect.shp")"#
            ),
            "    # arcpy.analysis.Intersect(".to_string(),
            format!("    #     in_features=[fc_{var}, _overlay_fc_{var}],"),
            format!("    #     out_feature_class=_out_isect_{var},"),
            "    # )".to_string(),
            format!(r#"    # print(f"  Intersect saved to: {{_out_isect_{var}}}")"#),
            String::new(),
        ]);
    }

    // 3D massing

    if has(Operation::Extrude) {
        lines.extend([
            "    # --- 3D extrude (multipatch) ---".to_string(),
            "    # Requires 3D Analyst extension.".to_string(),
            "    # TODO: set HEIGHT_FIELD to your building height attribute.".to_string(),
            "    import arcpy.ddd".to_string(),
            format!(r#"    _HEIGHT_FIELD_{var} = "height"  # TODO: change"#),
            format!(
                r#"    _out_mp_{var} = os.path.join(tempfile.gettempdir(), "{table}_multipatch.gdb", "{table}_mp")"#
            ),
            format!(
                r#"    arcpy.management.CreateFileGDB(tempfile.gettempdir(), "{table}_multipatch.gdb")"#
            ),
            "    arcpy.ddd.ExtrudePolygon(".to_string(),
            format!("        in_features=fc_{var},"),
            format!("        out_feature_class=_out_mp_{var},"),
            format!("        size=_HEIGHT_FIELD_{var},"),
            "    )".to_string(),
            format!(r#"    print(f"  Multipatch saved to: {{_out_mp_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::ZStats) {
        lines.extend([
            "    # --- Z statistics ---".to_string(),
            "    # Requires 3D Analyst extension. Adds Z fields to a temp copy.".to_string(),
            "    import arcpy.ddd".to_string(),
            format!(
                r#"    _out_z_{var} = os.path.join(tempfile.gettempdir(), "{table}_zstats.shp")"#
            ),
            format!("    arcpy.management.CopyFeatures(fc_{var}, _out_z_{var})"),
            format!(r#"    arcpy.ddd.AddZInformation(_out_z_{var}, "Z_MIN;Z_MAX;Z_MEAN", "NO_FILTER")"#),
            format!(
                r#"    with arcpy.da.SearchCursor(_out_z_{var}, ["Z_MIN", "Z_MAX", "Z_MEAN"]) as _cur_z:"#
            ),
            "        for _i, _row in enumerate(_cur_z):".to_string(),
            "            if _i >= 5: break".to_string(),
            r#"            print(f"  Z_MIN={_row[0]:.2f}  Z_MAX={_row[1]:.2f}  Z_MEAN={_row[2]:.2f}")"#
                .to_string(),
            String::new(),
        ]);
    }

    if has(Operation::FloorCeiling) {
        lines.extend([
            "    # --- floor / ceiling heights ---".to_string(),
            "    # Extrudes from a base elevation field to a roof elevation field.".to_string(),
            "    # Requires 3D Analyst extension.".to_string(),
            "    # TODO: set BASE_FIELD and ROOF_FIELD.".to_string(),
            "    import arcpy.ddd".to_string(),
            format!(r#"    _BASE_FIELD_{var} = "base_height"  # TODO: change"#),
            format!(r#"    _ROOF_FIELD_{var} = "roof_height"  # TODO: change"#),
            format!(
                r#"    _out_fc_{var} = os.path.join(tempfile.gettempdir(), "{table}_massing.gdb", "{table}_mp")"#
            ),
            format!(
                r#"    arcpy.management.CreateFileGDB(tempfile.gettempdir(), "{table}_massing.gdb")"#
            ),
            "    arcpy.ddd.ExtrudePolygon(".to_string(),
            format!("        in_features=fc_{var},"),
            format!("        out_feature_class=_out_fc_{var},"),
            format!("        size=_ROOF_FIELD_{var},"),
            format!("        base_elevation_field=_BASE_FIELD_{var},"),
            "    )".to_string(),
            format!(r#"    print(f"  Massing saved to: {{_out_fc_{var}}}")"#),
            String::new(),
        ]);
    }

    if has(Operation::Volume) {
        lines.extend([
            "    # --- approximate volume (footprint area × height) ---".to_string(),
            "    # For exact multipatch volume use arcpy.ddd.SurfaceVolume().".to_string(),
            "    # TODO: set HEIGHT_FIELD.".to_string(),
            format!(r#"    _VOL_HEIGHT_{var} = "height"  # TODO: change"#),
            format!("    _total_vol_{var} = 0.0"),
            "    with arcpy.da.SearchCursor(".to_string(),
            format!(r#"        fc_{var}, [_VOL_HEIGHT_{var}, "SHAPE@AREA"]"#),
            "    ) as _cur_vol:".to_string(),
            "        for _row in _cur_vol:".to_string(),
            "            if _row[0] and _row[1]:".to_string(),
            format!("                _total_vol_{var} += _row[0] * _row[1]"),
            format!(
                r#"    print(f"  Approx. total volume: {{_total_vol_{var}:,.1f}} (CRS units³)")"#
            ),
            "    # For multipatch volume: arcpy.ddd.SurfaceVolume(multipatch_fc, ...)".to_string(),
            String::new(),
        ]);
    }

    if has(Operation::SceneLayer) {
        lines.extend([
            "    # --- export to Scene Layer Package (.slpk) ---".to_string(),
            "    # TODO: set output path.".to_string(),
            format!(
                r#"    _out_slpk_{var} = os.path.join(tempfile.gettempdir(), "{table}.slpk")"#
            ),
            "    arcpy.management.CreateSceneLayerPackage(".to_string(),
            format!("        in_dataset=fc_{var},"),
            format!("        output_slpk=_out_slpk_{var},"),
            "    )".to_string(),
            format!(r#"    print(f"  Scene Layer Package: {{_out_slpk_{var}}}")"#),
            String::new(),
        ]);
    }

    lines
}
