//! gis-ui: web form front end for the GIS script generator.
//!
//! Serves the connection form on `/` and handles one generation request at a
//! time; the pipeline is one-shot and holds no state across requests.

use clap::Parser;
use colored::Colorize;
use std::process;

use gis_codegen::web;

#[derive(Parser)]
#[command(name = "gis-ui")]
#[command(about = "Web form for the GIS script generator")]
#[command(version = "0.1.0")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: String,

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

    // One request at a time; the extraction pipeline is blocking by design
    may::config().set_workers(1);

    println!("GIS Script Generator UI running at http://{}/", cli.bind);
    if let Err(e) = web::run(&cli.bind) {
        eprintln!("{} {e}", "error:".red().bold());
        process::exit(1);
    }
}
