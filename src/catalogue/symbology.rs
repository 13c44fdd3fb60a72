//! Symbology dispatch table and renderer block builders.
//!
//! The catalogue's `symbology_type` field is free text (mixed French and
//! English). Dispatch is case-insensitive substring matching over an ordered
//! rule list; the first matching rule wins. The rule order is a behavioral
//! contract: overlapping keyword sets exist by construction ("choroplèthe
//! catégoriel" must pick the categorized renderer, a string containing both
//! "heatmap" and "choroplèthe" must pick the heatmap). Do not reorder.

use crate::catalogue::MapEntry;

// --- PyQGIS renderer blocks ------------------------------------------------

fn graduated_block(var: &str, field_hint: &str, ramp: &str, n_classes: u8) -> Vec<String> {
    vec![
        "    from qgis.core import (".to_string(),
        "        QgsGraduatedSymbolRenderer, QgsClassificationQuantile,".to_string(),
        "        QgsColorBrewerColorRamp,".to_string(),
        "    )".to_string(),
        format!(r#"    GRAD_FIELD_{var} = "{field_hint}"  # TODO: verify field name"#),
        format!("    _rend_{var} = QgsGraduatedSymbolRenderer(GRAD_FIELD_{var})"),
        format!("    _rend_{var}.setClassificationMethod(QgsClassificationQuantile())"),
        format!("    _rend_{var}.updateClasses(lyr_{var}, {n_classes})"),
        format!(
            r#"    _rend_{var}.updateColorRamp(QgsColorBrewerColorRamp("{ramp}", {n_classes}))"#
        ),
        format!("    lyr_{var}.setRenderer(_rend_{var})"),
        format!("    lyr_{var}.triggerRepaint()"),
        format!(
            r#"    print(f"  Renderer: graduated on '{{GRAD_FIELD_{var}}}', {n_classes} classes")"#
        ),
    ]
}

fn categorized_block(var: &str, field_hint: &str, classification: &str) -> Vec<String> {
    let scheme = if classification.is_empty() {
        "see catalogue"
    } else {
        classification
    };
    vec![
        "    from qgis.core import (".to_string(),
        "        QgsCategorizedSymbolRenderer, QgsRendererCategory,".to_string(),
        "        QgsSymbol, QgsStyle,".to_string(),
        "    )".to_string(),
        format!(r#"    CAT_FIELD_{var} = "{field_hint}"  # TODO: verify field name"#),
        format!("    # Classification scheme: {scheme}"),
        "    # Build categories automatically from unique values:".to_string(),
        format!("    _cats_{var} = []"),
        format!("    for _val in lyr_{var}.uniqueValues("),
        format!("        lyr_{var}.fields().indexFromName(CAT_FIELD_{var})"),
        "    ):".to_string(),
        format!("        _sym = QgsSymbol.defaultSymbol(lyr_{var}.geometryType())"),
        format!("        _cats_{var}.append(QgsRendererCategory(_val, _sym, str(_val)))"),
        format!("    _rend_{var} = QgsCategorizedSymbolRenderer(CAT_FIELD_{var}, _cats_{var})"),
        format!("    _rend_{var}.updateColorRamp("),
        r#"        QgsStyle.defaultStyle().colorRamp("Paired"),"#.to_string(),
        "    )".to_string(),
        format!("    lyr_{var}.setRenderer(_rend_{var})"),
        format!("    lyr_{var}.triggerRepaint()"),
        format!(r#"    print(f"  Renderer: categorized on '{{CAT_FIELD_{var}}}'")"#),
    ]
}

fn network_line_block(var: &str) -> Vec<String> {
    vec![
        "    from qgis.core import (".to_string(),
        "        QgsCategorizedSymbolRenderer, QgsRendererCategory,".to_string(),
        "        QgsLineSymbol, QgsSymbol,".to_string(),
        "    )".to_string(),
        format!(
            r#"    NET_FIELD_{var} = "route_type"  # TODO: verify field name (e.g. route_type, highway)"#
        ),
        format!("    _cats_{var} = []"),
        format!("    for _val in lyr_{var}.uniqueValues("),
        format!("        lyr_{var}.fields().indexFromName(NET_FIELD_{var})"),
        "    ):".to_string(),
        r#"        _sym = QgsLineSymbol.createSimple({"width": "0.5"})"#.to_string(),
        format!("        _cats_{var}.append(QgsRendererCategory(_val, _sym, str(_val)))"),
        format!("    _rend_{var} = QgsCategorizedSymbolRenderer(NET_FIELD_{var}, _cats_{var})"),
        format!("    lyr_{var}.setRenderer(_rend_{var})"),
        format!("    lyr_{var}.triggerRepaint()"),
        format!(r#"    print(f"  Renderer: network categorized on '{{NET_FIELD_{var}}}'")"#),
    ]
}

fn heatmap_block(var: &str) -> Vec<String> {
    vec![
        "    from qgis.core import QgsHeatmapRenderer, QgsStyle".to_string(),
        format!("    _heat_{var} = QgsHeatmapRenderer()"),
        format!("    _heat_{var}.setRadius(15)"),
        format!("    _heat_{var}.setMaximumValue(0)  # 0 = auto"),
        format!("    _heat_{var}.setColorRamp("),
        r#"        QgsStyle.defaultStyle().colorRamp("Reds"),"#.to_string(),
        "    )".to_string(),
        format!("    lyr_{var}.setRenderer(_heat_{var})"),
        format!("    lyr_{var}.triggerRepaint()"),
        r#"    print("  Renderer: heatmap density")"#.to_string(),
    ]
}

fn points_polygons_block(var: &str) -> Vec<String> {
    vec![
        "    from qgis.core import QgsSingleSymbolRenderer, QgsSymbol".to_string(),
        format!("    _sym_{var} = QgsSymbol.defaultSymbol(lyr_{var}.geometryType())"),
        format!("    lyr_{var}.setRenderer(QgsSingleSymbolRenderer(_sym_{var}))"),
        format!("    lyr_{var}.triggerRepaint()"),
        r#"    print("  Renderer: single symbol (points/polygons) — customise in Layer Properties")"#
            .to_string(),
    ]
}

/// Dispatch to the appropriate PyQGIS renderer block for a catalogue entry.
pub fn pyqgis_symbology_block(var: &str, entry: &MapEntry) -> Vec<String> {
    let stype = entry.symbology_type.to_lowercase();
    let classif = entry.classification.as_str();
    let mut lines = vec![format!(
        "    # --- Symbology: {} ---",
        entry.symbology_type
    )];

    if stype.contains("heatmap") || stype.contains("densité") {
        lines.extend(heatmap_block(var));
    } else if stype.contains("réseau") || stype.contains("network") {
        lines.extend(network_line_block(var));
    } else if (stype.contains("catégoriel") || stype.contains("catégorie"))
        && !stype.contains("choroplèthe")
    {
        lines.extend(categorized_block(var, "type", classif));
    } else if stype.contains("choroplèthe") || stype.contains("dégradé") || stype.contains("gradué")
    {
        if stype.contains("catégoriel") {
            lines.extend(categorized_block(var, "type", classif));
        } else {
            let field = if classif.is_empty() { "value" } else { classif };
            lines.extend(graduated_block(var, field, "YlOrRd", 5));
        }
    } else if stype.contains("points") || stype.contains("polygones") {
        lines.extend(points_polygons_block(var));
    } else {
        lines.extend([
            "    # TODO: configure renderer".to_string(),
            format!("    # Symbology type: {}", entry.symbology_type),
            "    # Use Layer Properties → Symbology in QGIS to configure interactively."
                .to_string(),
        ]);
    }

    lines
}

// --- ArcPy renderer blocks -------------------------------------------------

fn arcpy_graduated_block(var: &str, field_hint: &str, n_classes: u8) -> Vec<String> {
    vec![
        format!(r#"    GRAD_FIELD_{var} = "{field_hint}"  # TODO: verify field name"#),
        format!("    sym_{var} = lyr_{var}.symbology"),
        format!(r#"    sym_{var}.updateRenderer("GraduatedColorsRenderer")"#),
        format!("    sym_{var}.renderer.classificationField = GRAD_FIELD_{var}"),
        format!("    sym_{var}.renderer.breakCount = {n_classes}"),
        format!(
            r#"    # TODO: sym_{var}.renderer.colorRamp = aprx.listColorRamps("Oranges ({n_classes} Classes)")[0]"#
        ),
        format!("    lyr_{var}.symbology = sym_{var}"),
        format!(
            r#"    print(f"  Renderer: graduated on '{{GRAD_FIELD_{var}}}', {n_classes} classes")"#
        ),
    ]
}

fn arcpy_categorized_block(var: &str, field_hint: &str, classification: &str) -> Vec<String> {
    let scheme = if classification.is_empty() {
        "see catalogue"
    } else {
        classification
    };
    vec![
        format!(r#"    CAT_FIELD_{var} = "{field_hint}"  # TODO: verify field name"#),
        format!("    # Classification scheme: {scheme}"),
        format!("    sym_{var} = lyr_{var}.symbology"),
        format!(r#"    sym_{var}.updateRenderer("UniqueValueRenderer")"#),
        format!("    sym_{var}.renderer.fields = [CAT_FIELD_{var}]"),
        format!("    lyr_{var}.symbology = sym_{var}"),
        format!(r#"    print(f"  Renderer: unique values on '{{CAT_FIELD_{var}}}'")"#),
    ]
}

fn arcpy_heatmap_block(var: &str) -> Vec<String> {
    vec![
        "    # Requires ArcGIS Pro 3.x".to_string(),
        format!("    sym_{var} = lyr_{var}.symbology"),
        format!(r#"    sym_{var}.updateRenderer("HeatMapRenderer")"#),
        "    # TODO: configure radius and color scheme in Layer Properties".to_string(),
        format!("    lyr_{var}.symbology = sym_{var}"),
        r#"    print("  Renderer: heat map density")"#.to_string(),
    ]
}

fn arcpy_network_line_block(var: &str) -> Vec<String> {
    vec![
        format!(
            r#"    NET_FIELD_{var} = "route_type"  # TODO: verify field name (e.g. route_type, highway)"#
        ),
        format!("    sym_{var} = lyr_{var}.symbology"),
        format!(r#"    sym_{var}.updateRenderer("UniqueValueRenderer")"#),
        format!("    sym_{var}.renderer.fields = [NET_FIELD_{var}]"),
        format!("    lyr_{var}.symbology = sym_{var}"),
        format!(r#"    print(f"  Renderer: network unique values on '{{NET_FIELD_{var}}}'")"#),
    ]
}

fn arcpy_points_polygons_block(var: &str) -> Vec<String> {
    vec![
        format!("    sym_{var} = lyr_{var}.symbology"),
        format!(r#"    sym_{var}.updateRenderer("SimpleRenderer")"#),
        "    # TODO: customise symbol colour/size in Layer Properties".to_string(),
        format!("    lyr_{var}.symbology = sym_{var}"),
        r#"    print("  Renderer: simple symbol (points/polygons)")"#.to_string(),
    ]
}

/// Dispatch to the appropriate ArcPy renderer block for a catalogue entry.
/// Same rule order as [`pyqgis_symbology_block`].
pub fn arcpy_symbology_block(var: &str, entry: &MapEntry) -> Vec<String> {
    let stype = entry.symbology_type.to_lowercase();
    let classif = entry.classification.as_str();
    let mut lines = vec![format!(
        "    # --- Symbology: {} ---",
        entry.symbology_type
    )];

    if stype.contains("heatmap") || stype.contains("densité") {
        lines.extend(arcpy_heatmap_block(var));
    } else if stype.contains("réseau") || stype.contains("network") {
        lines.extend(arcpy_network_line_block(var));
    } else if (stype.contains("catégoriel") || stype.contains("catégorie"))
        && !stype.contains("choroplèthe")
    {
        lines.extend(arcpy_categorized_block(var, "type", classif));
    } else if stype.contains("choroplèthe") || stype.contains("dégradé") || stype.contains("gradué")
    {
        if stype.contains("catégoriel") {
            lines.extend(arcpy_categorized_block(var, "type", classif));
        } else {
            let field = if classif.is_empty() { "value" } else { classif };
            lines.extend(arcpy_graduated_block(var, field, 5));
        }
    } else if stype.contains("points") || stype.contains("polygones") {
        lines.extend(arcpy_points_polygons_block(var));
    } else {
        lines.extend([
            "    # TODO: configure renderer".to_string(),
            format!("    # Symbology type: {}", entry.symbology_type),
            "    # Use Layer Properties → Symbology in ArcGIS Pro.".to_string(),
        ]);
    }

    lines
}
