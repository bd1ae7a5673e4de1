//! Map analysis tool.
//!
//! Loads named maps, uploads files on top of them and prints one JSON line
//! per event: which regions each upload falls in, which uploads each map
//! covers.

mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geovisor::catalog::{CatalogEntry, MapCatalog};
use geovisor::config::Config;
use geovisor::formats::{self, SourceFile};
use geovisor::Workspace;

use crate::report::{emit, Output, Summary};

#[derive(Parser, Debug)]
#[command(name = "analyze")]
#[command(about = "Check KML, KMZ and GeoJSON maps against each other")]
struct Args {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a single file and describe what it contains
    Inspect {
        file: PathBuf,

        /// Print the parsed collection as GeoJSON instead of a summary
        #[arg(long)]
        geojson: bool,
    },

    /// Load named maps, then upload files and report overlaps
    Run {
        /// TOML file listing named maps
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Extra named map, as NAME=PATH
        #[arg(long = "map", value_parser = parse_named_map)]
        maps: Vec<(String, PathBuf)>,

        /// Hide a loaded map before the uploads are checked
        #[arg(long)]
        hide: Vec<String>,

        /// Files to upload, in order
        files: Vec<PathBuf>,
    },
}

fn parse_named_map(s: &str) -> std::result::Result<(String, PathBuf), String> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{}'", s))?;
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{}'", s));
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Inspect { file, geojson } => inspect(file, geojson),
        Command::Run {
            config,
            maps,
            hide,
            files,
        } => run(config, maps, hide, files),
    }
}

fn inspect(path: PathBuf, geojson: bool) -> Result<()> {
    let file = SourceFile::read(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let parsed = match formats::route(&file.name, &file.bytes) {
        Ok(parsed) => parsed,
        Err(e) => {
            emit(&Output::Failed {
                name: &file.name,
                error: e.to_string(),
            })?;
            return Ok(());
        }
    };

    if geojson {
        println!("{}", parsed.collection.to_geojson_string()?);
    } else {
        emit(&Output::Summary(Summary::new(&file.name, &parsed)))?;
    }
    Ok(())
}

fn run(
    config: Option<PathBuf>,
    maps: Vec<(String, PathBuf)>,
    hide: Vec<String>,
    files: Vec<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => Config::load_from_file(&path)?,
        None => Config::default(),
    };

    let mut entries = MapCatalog::from_config(&config)?.entries().to_vec();
    for (name, path) in maps {
        entries.push(CatalogEntry::new(name, path));
    }
    let catalog = MapCatalog::new(entries);

    let mut workspace = Workspace::new();

    for entry in catalog.entries() {
        match catalog.load_into(&entry.name, &mut workspace) {
            Ok(loaded) => emit(&Output::Loaded {
                name: &entry.name,
                loaded: &loaded,
            })?,
            Err(e) => {
                // user-facing message for library errors, full chain otherwise
                let error = match e.downcast_ref::<geovisor::Error>() {
                    Some(err) => err.to_string(),
                    None => format!("{:#}", e),
                };
                emit(&Output::Failed {
                    name: &entry.name,
                    error,
                })?;
            }
        }
    }

    for name in &hide {
        match workspace.find(name) {
            Some(id) => {
                workspace.set_visible(id, false)?;
                emit(&Output::Hidden { name })?;
            }
            None => warn!("Cannot hide '{}': no such layer", name),
        }
    }

    let mut uploads = Vec::with_capacity(files.len());
    for path in &files {
        let file = SourceFile::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        uploads.push(file);
    }

    info!("Parsing {} uploads", uploads.len());
    let results = formats::parse_many(&uploads);

    for (file, result) in uploads.iter().zip(results) {
        let outcome = result.and_then(|parsed| workspace.upload_parsed(&file.name, parsed.collection));
        match outcome {
            Ok(loaded) => emit(&Output::Loaded {
                name: &file.name,
                loaded: &loaded,
            })?,
            Err(e) => emit(&Output::Failed {
                name: &file.name,
                error: e.to_string(),
            })?,
        }
    }

    for layer in workspace.layers().iter() {
        emit(&Output::Layer(layer.summary()))?;
    }

    info!("{} layers loaded", workspace.layers().len());
    Ok(())
}
