//! # gis-codegen
//!
//! PostGIS schema extraction and GIS script generation toolkit.
//!
//! The library connects to a PostGIS database, extracts spatial layer
//! metadata (geometry columns, attribute columns, primary keys, row-count
//! estimates) and generates ready-to-run scripts or project files for eight
//! GIS targets: PyQGIS, ArcPy, Folium, Kepler.gl, pydeck, a GeoPackage
//! export script, a QGIS project file (.qgs) and an ArcGIS Python Toolbox
//! (.pyt).
//!
//! A second entry point reads a map catalogue spreadsheet and batch-generates
//! one script per catalogued map, selecting a renderer from the symbology
//! dispatch table.

pub mod catalogue;
pub mod config;
pub mod connection;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod layout;
pub mod schema;
pub mod web;

pub use config::DbConfig;
pub use connection::connect;
pub use error::{GisError, Result};
pub use extractor::extract_schema;
pub use generator::{generate, Operation, Platform};
pub use schema::{safe_var, Column, Geometry, Layer, Schema};
