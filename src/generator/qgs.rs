//! QGIS project file (.qgs) generator.
//!
//! Emits project XML with every PostGIS layer pre-connected. Layer ids are
//! content-derived (`{table}_{first 8 hex of SHA-256 of the qualified
//! name}`): regenerating from identical input reproduces identical ids, so
//! the output is diff-friendly under version control. The password is never
//! embedded; QGIS prompts on open.

use sha2::{Digest, Sha256};

use crate::config::DbConfig;
use crate::schema::Schema;

/// Map a PostGIS geometry type to a QGIS geometry name and
/// `layerGeometryType` code.
pub fn qgs_geom_type(geom_type: &str) -> (&'static str, u8) {
    let gt = geom_type.to_uppercase();
    if gt.contains("POINT") {
        return ("Point", 0);
    }
    if gt.contains("LINE") {
        return ("Line", 1);
    }
    ("Polygon", 2)
}

/// Deterministic per-layer id: table name plus a truncated content hash
pub fn layer_id(table: &str, qualified_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(qualified_name.as_bytes());
    let hash = hasher.finalize();
    let hex = format!("{hash:x}");
    format!("{table}_{}", &hex[..8])
}

pub fn generate_qgs(schema: &Schema, db: &DbConfig) -> String {
    let mut layer_elements: Vec<String> = Vec::new();
    let mut legend_layers: Vec<String> = Vec::new();

    for layer in &schema.layers {
        let pk = layer.primary_keys.first().map(String::as_str).unwrap_or("id");
        let (geom_name, geom_code) = qgs_geom_type(&layer.geometry.geom_type);
        let id = layer_id(&layer.table, &layer.qualified_name);
        let srid = layer.geometry.srid;
        let table = &layer.table;

        let datasource = format!(
            r#"dbname='{}' host={} port={} sslmode=disable key='{pk}' srid={srid} type={geom_name} table="{}"."{table}" ({}) sql="#,
            db.dbname, db.host, db.port, layer.schema, layer.geometry.column,
        );

        layer_elements.push(format!(
            r#"    <maplayer type="vector" geometry="{geom_name}" autoRefreshEnabled="0">
      <id>{id}</id>
      <datasource>{datasource}</datasource>
      <layername>{table}</layername>
      <provider encoding="UTF-8">postgres</provider>
      <srs>
        <spatialrefsys>
          <authid>EPSG:{srid}</authid>
        </spatialrefsys>
      </srs>
      <layerGeometryType>{geom_code}</layerGeometryType>
    </maplayer>"#
        ));

        legend_layers.push(format!(
            r#"      <legendlayer name="{table}" showFeatureCount="0" checked="Qt::Checked" open="true" drawingOrder="-1">
        <filegroup open="true" hidden="false">
          <legendlayerfile isInOverview="0" visible="1" layerid="{id}"/>
        </filegroup>
      </legendlayer>"#
        ));
    }

    format!(
        r#"<!DOCTYPE qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'>
<qgis projectname="{}" version="3.28.0-Firenze">
  <projectCrs>
    <spatialrefsys>
      <authid>EPSG:4326</authid>
    </spatialrefsys>
  </projectCrs>
  <mapcanvas annotationsVisible="1" name="theMapCanvas">
    <units>degrees</units>
    <extent>
      <xmin>-180</xmin>
      <ymin>-90</ymin>
      <xmax>180</xmax>
      <ymax>90</ymax>
    </extent>
    <rotation>0</rotation>
    <destinationsrs>
      <spatialrefsys>
        <authid>EPSG:4326</authid>
      </spatialrefsys>
    </destinationsrs>
    <rendermaptile>0</rendermaptile>
  </mapcanvas>
  <projectlayers>
{}
  </projectlayers>
  <legend updateDrawingOrder="true">
{}
  </legend>
</qgis>"#,
        db.dbname,
        layer_elements.join("\n"),
        legend_layers.join("\n")
    )
}
