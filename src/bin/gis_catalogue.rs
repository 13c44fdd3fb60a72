//! gis-catalogue CLI
//!
//! Reads the map catalogue spreadsheet and generates one script or project
//! file per accepted map entry (status have/partial, Vector layers).

use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;

use gis_codegen::catalogue::{
    generate_map_arcpy, generate_map_pyqgis, generate_map_pyt, generate_map_qgs, load_catalogue,
    load_schema_lookup, MapEntry,
};
use gis_codegen::config::{self, DbConfig, EnvValues};
use gis_codegen::error::GisError;
use gis_codegen::schema::{Layer, Schema};
use gis_codegen::Operation;

/// Batch targets: one generated file per catalogue map
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CataloguePlatform {
    Pyqgis,
    Arcpy,
    Qgs,
    Pyt,
}

impl CataloguePlatform {
    fn as_str(self) -> &'static str {
        match self {
            CataloguePlatform::Pyqgis => "pyqgis",
            CataloguePlatform::Arcpy => "arcpy",
            CataloguePlatform::Qgs => "qgs",
            CataloguePlatform::Pyt => "pyt",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            CataloguePlatform::Qgs => ".qgs",
            CataloguePlatform::Pyt => ".pyt",
            _ => ".py",
        }
    }

    /// Script targets take `--op` blocks; they are also the ones whose
    /// output reads PGPASSWORD, so the password guard keys off this too.
    fn supports_operations(self) -> bool {
        matches!(self, CataloguePlatform::Pyqgis | CataloguePlatform::Arcpy)
    }
}

#[derive(Parser)]
#[command(name = "gis-catalogue")]
#[command(about = "Generate one script/project file per map from the catalogue")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the catalogue .xlsx (or .csv) file
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Directory to write generated files
    #[arg(short, long, default_value = "maps", value_name = "DIR")]
    output_dir: PathBuf,

    /// Target platform
    #[arg(short, long, value_enum, default_value_t = CataloguePlatform::Pyqgis)]
    platform: CataloguePlatform,

    /// DB host (default: PGHOST or localhost)
    #[arg(long)]
    host: Option<String>,

    /// DB port (default: PGPORT or 5432)
    #[arg(long)]
    port: Option<u16>,

    /// Database name (default: PGDATABASE or my_gis_db)
    #[arg(long)]
    dbname: Option<String>,

    /// DB user (default: PGUSER or postgres)
    #[arg(long)]
    user: Option<String>,

    /// Schema JSON from 'gis-codegen --save-schema'. Resolves field names
    /// and makes PGPASSWORD optional.
    #[arg(short, long, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Inject an operation block into every script (repeatable)
    #[arg(long = "op", value_enum, value_name = "OPERATION")]
    operations: Vec<Operation>,

    /// Print filtered maps and exit without writing files
    #[arg(long)]
    list: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    } else if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if let Err(e) = run(cli) {
        eprintln!("{} {e}", "error:".red().bold());
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), GisError> {
    let env = EnvValues::capture()?;

    let maps = load_catalogue(&cli.input)?;
    eprintln!(
        "[OK] Catalogue loaded: {} Vector have/partial maps",
        maps.len()
    );

    if cli.list {
        print_map_table(&maps);
        return Ok(());
    }

    // Optional saved schema: field-name resolution, plus host/dbname
    // backfill when the CLI and environment left them unset
    let mut schema_lookup = std::collections::HashMap::<String, Layer>::new();
    let mut snapshot: Option<Schema> = None;
    if let Some(path) = &cli.schema {
        schema_lookup = load_schema_lookup(path)?;
        eprintln!(
            "[OK] Schema loaded: {} layers from {}",
            schema_lookup.len(),
            path.display()
        );
        snapshot = Some(Schema::from_json_file(path)?);
    }

    // qgs/pyt don't embed passwords, so PGPASSWORD is not required for them
    if env.password.is_none() && cli.schema.is_none() && cli.platform.supports_operations() {
        return Err(GisError::Config(
            "PGPASSWORD is not set. Either set it or supply --schema to skip the live DB \
             requirement."
                .to_string(),
        ));
    }

    let db = DbConfig {
        host: cli
            .host
            .clone()
            .or_else(|| env.host.clone())
            .or_else(|| snapshot.as_ref().map(|s| s.host.clone()))
            .unwrap_or_else(|| config::FALLBACK_HOST.to_string()),
        port: cli.port.or(env.port).unwrap_or(config::FALLBACK_PORT),
        dbname: cli
            .dbname
            .clone()
            .or_else(|| env.dbname.clone())
            .or_else(|| snapshot.as_ref().map(|s| s.database.clone()))
            .unwrap_or_else(|| config::FALLBACK_DBNAME.to_string()),
        user: cli
            .user
            .clone()
            .or_else(|| env.user.clone())
            .unwrap_or_else(|| config::FALLBACK_USER.to_string()),
        // never embedded in output; generated scripts read PGPASSWORD
        password: String::new(),
    };

    if !cli.operations.is_empty() {
        if cli.platform.supports_operations() {
            let names: Vec<&str> = cli.operations.iter().map(|op| op.name()).collect();
            eprintln!("[OK] Operations: {}", names.join(", "));
        } else {
            eprintln!("[warn] --op is ignored for --platform {}", cli.platform.as_str());
        }
    }

    std::fs::create_dir_all(&cli.output_dir)?;

    let ext = cli.platform.extension();
    for entry in &maps {
        let short_name = if entry.short_name.is_empty() {
            "layer"
        } else {
            entry.short_name.as_str()
        };
        let map_id = if entry.map_id.is_empty() {
            "M??"
        } else {
            entry.map_id.as_str()
        };
        let filename = format!("{map_id}_{short_name}{ext}");
        let path = cli.output_dir.join(&filename);

        let layer_info = schema_lookup.get(short_name);
        let code = match cli.platform {
            CataloguePlatform::Pyqgis => {
                generate_map_pyqgis(entry, &db, &cli.operations, layer_info)
            }
            CataloguePlatform::Arcpy => generate_map_arcpy(entry, &db, &cli.operations, layer_info),
            CataloguePlatform::Qgs => generate_map_qgs(entry, &db, &cli.operations, layer_info),
            CataloguePlatform::Pyt => generate_map_pyt(entry, &db, &cli.operations, layer_info),
        };
        std::fs::write(&path, code)?;
        let enriched = if layer_info.is_some() {
            " (schema enriched)"
        } else {
            ""
        };
        eprintln!("[OK] {filename}{enriched}");
    }

    let label = if cli.platform.supports_operations() {
        "scripts"
    } else {
        "files"
    };
    eprintln!(
        "\n[DONE] {} {} {label} written to '{}/'",
        maps.len(),
        cli.platform.as_str(),
        cli.output_dir.display()
    );
    Ok(())
}

fn print_map_table(maps: &[MapEntry]) {
    println!();
    println!("  {:<5}  {:<8}  {:<40}  SYMBOLOGY", "ID", "STATUS", "SHORT_NAME");
    println!("  {}  {}  {}  ---------", "-".repeat(5), "-".repeat(8), "-".repeat(40));
    for entry in maps {
        println!(
            "  {:<5}  {:<8}  {:<40}  {}",
            entry.map_id, entry.status, entry.short_name, entry.symbology_type
        );
    }
    println!();
}
