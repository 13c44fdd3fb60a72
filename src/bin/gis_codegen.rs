//! gis-codegen CLI
//!
//! Single-command pipeline: connect to PostGIS → extract schema → generate a
//! script or project file for the chosen platform.
//!
//! Connection value priority (highest → lowest):
//!   1. CLI flags        --host, --port, --dbname, --user, --password
//!   2. Config file      gis_codegen.toml  (TOML)
//!   3. Environment      PGHOST, PGPORT, PGDATABASE, PGUSER, PGPASSWORD
//!   4. Built-in defaults

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process;

use gis_codegen::config::{self, DbOverrides, EnvValues};
use gis_codegen::error::GisError;
use gis_codegen::layout::{CompositionLayout, TemplateConfig};
use gis_codegen::{connect, extract_schema, generate, Operation, Platform, Schema};

#[derive(Parser)]
#[command(name = "gis-codegen")]
#[command(about = "Extract PostGIS schema and generate a GIS script or project file")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (overrides auto-discovery)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// DB host
    #[arg(long, help_heading = "Database connection")]
    host: Option<String>,

    /// DB port
    #[arg(long, help_heading = "Database connection")]
    port: Option<u16>,

    /// Database name
    #[arg(long, help_heading = "Database connection")]
    dbname: Option<String>,

    /// DB user
    #[arg(long, help_heading = "Database connection")]
    user: Option<String>,

    /// DB password
    #[arg(long, help_heading = "Database connection")]
    password: Option<String>,

    /// Only extract layers from this PostgreSQL schema (e.g. 'public')
    #[arg(long, value_name = "SCHEMA", help_heading = "Extraction options")]
    schema_filter: Option<String>,

    /// Skip row count estimates (faster for large databases)
    #[arg(long, help_heading = "Extraction options")]
    no_row_counts: bool,

    /// Also save the intermediate schema JSON to FILE
    #[arg(long, value_name = "FILE", help_heading = "Extraction options")]
    save_schema: Option<PathBuf>,

    /// Target platform (required unless --list-layers)
    #[arg(long, value_enum, help_heading = "Generation options")]
    platform: Option<Platform>,

    /// Only generate code for this layer (repeatable)
    #[arg(
        long = "layer",
        value_name = "SCHEMA.TABLE",
        help_heading = "Generation options"
    )]
    layers: Vec<String>,

    /// Write generated output to FILE (default: stdout)
    #[arg(short, long, value_name = "FILE", help_heading = "Generation options")]
    output: Option<PathBuf>,

    /// Add an operation block to every layer (repeatable)
    #[arg(
        long = "op",
        value_enum,
        value_name = "OPERATION",
        help_heading = "Generation options"
    )]
    operations: Vec<Operation>,

    /// TOML template file for custom code layout (preamble, imports, ...)
    #[arg(long, value_name = "FILE", help_heading = "Generation options")]
    template: Option<PathBuf>,

    /// TOML composition layout file (layer selection + per-layer operations)
    #[arg(long, value_name = "FILE", help_heading = "Generation options")]
    layout: Option<PathBuf>,

    /// Print a summary of spatial layers and exit (no output generated)
    #[arg(long)]
    list_layers: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
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

fn run(mut cli: Cli) -> Result<(), GisError> {
    let env = EnvValues::capture()?;

    let config_path = config::find_config_file(cli.config.as_deref(), &env)?;
    let file = match &config_path {
        Some(path) => {
            eprintln!("[cfg]  Using config: {}", path.display());
            config::load_config_file(path)?
        }
        None => config::ConfigFile::default(),
    };

    let overrides = DbOverrides {
        host: cli.host.clone(),
        port: cli.port,
        dbname: cli.dbname.clone(),
        user: cli.user.clone(),
        password: cli.password.clone(),
    };
    let db = config::resolve_db_config(&overrides, &file, &env)?;
    apply_defaults(&mut cli, &file);

    // Step 1: extract
    eprintln!(
        "[1/2] Connecting to {} @ {}:{} ...",
        db.dbname, db.host, db.port
    );
    let client = connect(&db)?;
    let mut schema = extract_schema(&client, &db, !cli.no_row_counts)?;
    drop(client);
    eprintln!("      Found {} spatial layer(s).", schema.layer_count);

    if cli.list_layers {
        print_layer_table(&schema);
        return Ok(());
    }

    if let Some(filter) = &cli.schema_filter {
        schema = schema.retain_schema(filter);
        eprintln!(
            "      After schema filter '{filter}': {} layer(s).",
            schema.layer_count
        );
        if schema.layers.is_empty() {
            return Err(GisError::Config(format!(
                "No layers found in schema '{filter}'. Use --list-layers to see available schemas."
            )));
        }
    }

    if !cli.layers.is_empty() {
        schema = schema.retain_layers(&cli.layers);
        if schema.layers.is_empty() {
            return Err(GisError::Config(format!(
                "No layers matched: {:?}",
                cli.layers
            )));
        }
        eprintln!("      After layer filter: {} layer(s).", schema.layer_count);
    }

    if let Some(path) = &cli.save_schema {
        std::fs::write(path, schema.to_json()?)?;
        eprintln!("      Schema saved to {}.", path.display());
    }

    let template = match &cli.template {
        Some(path) => Some(TemplateConfig::from_toml_file(path)?),
        None => None,
    };
    let layout = match &cli.layout {
        Some(path) => Some(CompositionLayout::from_toml_file(path)?),
        None => None,
    };

    // Composition layout filters and reorders the layer list
    if let Some(layout) = &layout {
        schema = layout.filter_schema(&schema);
        eprintln!("      After layout filter: {} layer(s).", schema.layer_count);
    }

    // Platform: CLI flag, else layout, else fatal
    let platform = match cli.platform.or_else(|| layout.as_ref().and_then(|l| l.platform)) {
        Some(platform) => {
            if cli.platform.is_none() {
                eprintln!("      Using platform from layout: {platform}");
            }
            platform
        }
        None => {
            return Err(GisError::Config(
                "--platform is required unless --list-layers is used.".to_string(),
            ))
        }
    };

    // Output path: CLI flag, else layout, else stdout
    let output_path = cli.output.clone().or_else(|| {
        layout
            .as_ref()
            .and_then(|l| l.output.as_ref())
            .map(PathBuf::from)
    });

    // Step 2: generate
    eprintln!("[2/2] Generating {platform} output ...");
    if !cli.operations.is_empty() {
        if platform.supports_operations() {
            let names: Vec<&str> = cli.operations.iter().map(|op| op.name()).collect();
            eprintln!("      Operations: {}", names.join(", "));
        } else {
            eprintln!("[warn] --op flags are ignored for {platform}.");
        }
    }

    let per_layer_ops = layout.as_ref().map(|l| l.per_layer_ops());
    let code = generate(
        platform,
        &schema,
        &db,
        &cli.operations,
        template.as_ref(),
        per_layer_ops.as_ref(),
    );

    match output_path {
        Some(path) => {
            std::fs::write(&path, &code)?;
            eprintln!("[OK]  Written to {}", path.display());
        }
        None => println!("{code}"),
    }

    Ok(())
}

/// Config `[defaults]` fills in CLI options that were not set explicitly.
fn apply_defaults(cli: &mut Cli, file: &config::ConfigFile) {
    let defaults = &file.defaults;
    if cli.platform.is_none() {
        cli.platform = defaults.platform;
    }
    if cli.schema_filter.is_none() {
        cli.schema_filter = defaults.schema_filter.clone();
    }
    if !cli.no_row_counts {
        cli.no_row_counts = defaults.no_row_counts.unwrap_or(false);
    }
    if cli.output.is_none() {
        cli.output = defaults.output.as_ref().map(PathBuf::from);
    }
    if cli.save_schema.is_none() {
        cli.save_schema = defaults.save_schema.as_ref().map(PathBuf::from);
    }
}

fn print_layer_table(schema: &Schema) {
    let col_w = schema
        .layers
        .iter()
        .map(|l| l.qualified_name.len())
        .max()
        .unwrap_or(20);

    println!();
    println!(
        "  {:<col_w$}  {:<20}  {:<6}  ROWS (est.)",
        "LAYER", "GEOM TYPE", "SRID"
    );
    println!(
        "  {}  {}  {}  ----------",
        "-".repeat(col_w),
        "-".repeat(20),
        "-".repeat(6)
    );
    for layer in &schema.layers {
        println!(
            "  {:<col_w$}  {:<20}  {:<6}  {}",
            layer.qualified_name,
            layer.geometry.geom_type,
            layer.geometry.srid,
            layer.row_count_label()
        );
    }
    println!(
        "\n  {} layer(s) in {}\n",
        schema.layer_count, schema.database
    );
}
