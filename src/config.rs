//! Connection settings and generation defaults.
//!
//! Resolution order, highest to lowest, applied per field:
//!
//! 1. CLI flags (`--host`, `--port`, ...)
//! 2. Config file `[database]` section (TOML)
//! 3. Environment (`PGHOST`, `PGPORT`, `PGDATABASE`, `PGUSER`, `PGPASSWORD`)
//! 4. Built-in defaults
//!
//! The password has no built-in default; it must come from one of the first
//! three sources unless the caller runs in an offline mode that never
//! connects or embeds credentials.
//!
//! Config file search order: `--config FILE`, then `$GIS_CODEGEN_CONFIG`,
//! then `./gis_codegen.toml`, then `~/.config/gis_codegen/config.toml`.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{GisError, Result};
use crate::generator::Platform;

pub const FALLBACK_HOST: &str = "localhost";
pub const FALLBACK_PORT: u16 = 5432;
pub const FALLBACK_DBNAME: &str = "my_gis_db";
pub const FALLBACK_USER: &str = "postgres";

/// Resolved database connection settings
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    /// Key-value connection string for `may_postgres::connect`
    pub fn conn_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            quote_conninfo(&self.host),
            self.port,
            quote_conninfo(&self.user),
            quote_conninfo(&self.password),
            quote_conninfo(&self.dbname),
        )
    }
}

/// Single-quote a conninfo value; `\` and `'` must be backslash-escaped
fn quote_conninfo(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Connection values explicitly supplied on the command line
#[derive(Debug, Default, Clone)]
pub struct DbOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// `PG*` environment snapshot, captured once at process start
#[derive(Debug, Default, Clone)]
pub struct EnvValues {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub config_path: Option<String>,
}

impl EnvValues {
    /// Read the `PG*` variables and `GIS_CODEGEN_CONFIG` from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `GisError::Config` when `PGPORT` is set but is not a valid
    /// port number.
    pub fn capture() -> Result<EnvValues> {
        let port = match env::var("PGPORT") {
            Ok(v) if !v.trim().is_empty() => Some(v.trim().parse::<u16>().map_err(|_| {
                GisError::Config(format!("PGPORT is not a valid port number: {v}"))
            })?),
            _ => None,
        };
        Ok(EnvValues {
            host: non_empty_var("PGHOST"),
            port,
            dbname: non_empty_var("PGDATABASE"),
            user: non_empty_var("PGUSER"),
            password: non_empty_var("PGPASSWORD"),
            config_path: non_empty_var("GIS_CODEGEN_CONFIG"),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parsed `gis_codegen.toml`
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// `[defaults]` fills in generation options the CLI left unset
#[derive(Debug, Default, Deserialize)]
pub struct DefaultsSection {
    pub platform: Option<Platform>,
    pub schema_filter: Option<String>,
    pub no_row_counts: Option<bool>,
    pub output: Option<String>,
    pub save_schema: Option<String>,
}

/// Locate the config file, if any.
///
/// An explicitly named file (flag or `GIS_CODEGEN_CONFIG`) that does not
/// exist is a hard error; the auto-discovered locations are optional.
pub fn find_config_file(explicit: Option<&Path>, env: &EnvValues) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(GisError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(env_path) = &env.config_path {
        let path = PathBuf::from(env_path);
        if !path.exists() {
            return Err(GisError::Config(format!(
                "Config file from GIS_CODEGEN_CONFIG not found: {env_path}"
            )));
        }
        return Ok(Some(path));
    }

    let local = PathBuf::from("gis_codegen.toml");
    if local.exists() {
        return Ok(Some(local));
    }

    if let Some(home) = env::var_os("HOME") {
        let user_config = PathBuf::from(home)
            .join(".config")
            .join("gis_codegen")
            .join("config.toml");
        if user_config.exists() {
            return Ok(Some(user_config));
        }
    }

    Ok(None)
}

/// Parse a TOML config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| GisError::Config(format!("Cannot read config file {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| GisError::Config(format!("Invalid TOML in {}: {e}", path.display())))
}

/// Merge connection settings: CLI > config file > environment > fallback.
///
/// # Errors
///
/// Returns `GisError::Config` when no source supplies a password.
pub fn resolve_db_config(
    cli: &DbOverrides,
    file: &ConfigFile,
    env: &EnvValues,
) -> Result<DbConfig> {
    let password = cli
        .password
        .clone()
        .or_else(|| file.database.password.clone())
        .or_else(|| env.password.clone())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            GisError::Config(
                "No database password supplied. Provide one via the PGPASSWORD \
                 environment variable, the config [database] password, or --password."
                    .to_string(),
            )
        })?;

    Ok(DbConfig {
        host: cli
            .host
            .clone()
            .or_else(|| file.database.host.clone())
            .or_else(|| env.host.clone())
            .unwrap_or_else(|| FALLBACK_HOST.to_string()),
        port: cli
            .port
            .or(file.database.port)
            .or(env.port)
            .unwrap_or(FALLBACK_PORT),
        dbname: cli
            .dbname
            .clone()
            .or_else(|| file.database.dbname.clone())
            .or_else(|| env.dbname.clone())
            .unwrap_or_else(|| FALLBACK_DBNAME.to_string()),
        user: cli
            .user
            .clone()
            .or_else(|| file.database.user.clone())
            .or_else(|| env.user.clone())
            .unwrap_or_else(|| FALLBACK_USER.to_string()),
        password,
    })
}
