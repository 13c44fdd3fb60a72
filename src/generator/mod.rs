//! Script and project-file generators.
//!
//! Eight targets share one contract: layers render in schema order, an empty
//! schema still yields the fixed preamble and teardown, and the configured
//! password never appears in the output. Credentials are always emitted as a
//! runtime environment-variable lookup (or a hidden tool parameter).

pub mod arcpy;
pub mod export;
pub mod ops;
pub mod pyqgis;
pub mod pyt;
pub mod qgs;
pub mod types;
pub mod webmap;

pub use ops::Operation;

use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use crate::config::DbConfig;
use crate::layout::TemplateConfig;
use crate::schema::Schema;

/// Target platform for generated output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Pyqgis,
    Arcpy,
    Folium,
    Kepler,
    Deck,
    Export,
    Qgs,
    Pyt,
}

impl Platform {
    pub const ALL: [Platform; 8] = [
        Platform::Pyqgis,
        Platform::Arcpy,
        Platform::Folium,
        Platform::Kepler,
        Platform::Deck,
        Platform::Export,
        Platform::Qgs,
        Platform::Pyt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Pyqgis => "pyqgis",
            Platform::Arcpy => "arcpy",
            Platform::Folium => "folium",
            Platform::Kepler => "kepler",
            Platform::Deck => "deck",
            Platform::Export => "export",
            Platform::Qgs => "qgs",
            Platform::Pyt => "pyt",
        }
    }

    /// File extension for generated output
    pub fn extension(self) -> &'static str {
        match self {
            Platform::Qgs => ".qgs",
            Platform::Pyt => ".pyt",
            _ => ".py",
        }
    }

    /// Only the scripting targets accept `--op` blocks
    pub fn supports_operations(self) -> bool {
        matches!(self, Platform::Pyqgis | Platform::Arcpy)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown platform: {s}"))
    }
}

/// Per-layer operation overrides, keyed by qualified layer name
pub type PerLayerOps = HashMap<String, Vec<Operation>>;

/// Generate output for the requested platform.
///
/// `operations`, `template` and `per_layer_ops` only affect the pyqgis and
/// arcpy targets; the other six ignore them.
pub fn generate(
    platform: Platform,
    schema: &Schema,
    db: &DbConfig,
    operations: &[Operation],
    template: Option<&TemplateConfig>,
    per_layer_ops: Option<&PerLayerOps>,
) -> String {
    match platform {
        Platform::Pyqgis => {
            pyqgis::generate_pyqgis(schema, db, operations, template, per_layer_ops)
        }
        Platform::Arcpy => arcpy::generate_arcpy(schema, db, operations, template, per_layer_ops),
        Platform::Folium => webmap::generate_folium(schema, db),
        Platform::Kepler => webmap::generate_kepler(schema, db),
        Platform::Deck => webmap::generate_deck(schema, db),
        Platform::Export => export::generate_export(schema, db),
        Platform::Qgs => qgs::generate_qgs(schema, db),
        Platform::Pyt => pyt::generate_pyt(schema, db),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_per_platform() {
        assert_eq!(Platform::Pyqgis.extension(), ".py");
        assert_eq!(Platform::Qgs.extension(), ".qgs");
        assert_eq!(Platform::Pyt.extension(), ".pyt");
    }

    #[test]
    fn test_only_script_targets_support_operations() {
        let supported: Vec<Platform> = Platform::ALL
            .into_iter()
            .filter(|p| p.supports_operations())
            .collect();
        assert_eq!(supported, vec![Platform::Pyqgis, Platform::Arcpy]);
    }

    #[test]
    fn test_platform_from_str_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
        assert!("mapnik".parse::<Platform>().is_err());
    }
}
