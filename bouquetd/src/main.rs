//! bouquetd: administration tool for persisted bouquets.
//!
//! Loads the bouquet registry from the settings database, runs one command as
//! an administrator, saves what changed and exits.

use std::path::PathBuf;

use bouquet_protocol::{property, AccessLevel, BouquetId, PropertyError};
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use bouquetd::bouquet::{Bouquet, BouquetSubsystem, Bouquets, DeleteOutcome, OfflineCollaborators};
use bouquetd::config::{ConfigFile, SystemBouquet};
use bouquetd::database::Database;
use bouquetd::logging;

const DEFAULT_DATABASE: &str = "bouquetd.db";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_RETENTION_DAYS: u64 = 7;

/// bouquetd - Manage broadcast bouquets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'f', long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory where log files are stored
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Number of days to keep log files
    #[arg(long)]
    log_retention_days: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all bouquets
    List,
    /// Show every property of a bouquet
    Show { uuid: String },
    /// Create a bouquet for a source
    Create {
        #[arg(long)]
        source: String,
        #[arg(long)]
        name: String,
    },
    /// Set a property, e.g. `set <uuid> maptoch on`
    Set {
        uuid: String,
        property: String,
        value: String,
    },
    /// Delete a bouquet (shielded bouquets are only emptied)
    Delete { uuid: String },
}

fn parse_id(text: &str) -> Result<BouquetId, Box<dyn std::error::Error>> {
    text.parse::<BouquetId>()
        .map_err(|_| format!("Invalid bouquet uuid: {}", text).into())
}

fn print_summary(bq: &Bouquet) {
    println!(
        "{}  {:<24} {:<32} services={} enabled={}{}",
        bq.id(),
        bq.source(),
        bq.title(),
        bq.services().len() + bq.pending_services().len(),
        bq.flags().enabled,
        if bq.is_shielded() { " shielded" } else { "" }
    );
}

fn print_properties(bq: &Bouquet) {
    println!("uuid: {}", bq.id());
    for def in property::BOUQUET_PROPERTIES {
        if def.opts.hidden {
            continue;
        }
        match bq.render_property(def.id) {
            Ok(text) => println!("{:<16} {}", format!("{}:", def.caption), text),
            Err(e) => warn!("{}", e),
        }
    }
    if !bq.pending_services().is_empty() {
        println!("{:<16} {}", "Unresolved:", bq.pending_services().len());
    }
}

fn ensure_system_bouquets(registry: &mut Bouquets, system: &[SystemBouquet]) {
    for entry in system {
        if registry.ensure_system(&entry.source, &entry.name).is_none() {
            warn!("Bouquet: cannot create system bouquet for {:?}", entry.source);
        }
    }
}

fn run(
    command: Command,
    registry: &mut Bouquets,
    db: &Database,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut collab = OfflineCollaborators;

    match command {
        Command::List => {
            for bq in registry.list(AccessLevel::Admin)? {
                print_summary(bq);
            }
        }
        Command::Show { uuid } => {
            let id = parse_id(&uuid)?;
            let bq = registry
                .get(id)
                .ok_or_else(|| format!("Bouquet not found: {}", id))?;
            print_properties(bq);
        }
        Command::Create { source, name } => {
            if registry.get_by_source(&source).is_some() {
                return Err(format!("A bouquet for {} already exists", source).into());
            }
            let bq = registry
                .find_by_source(&source, true, Some(&name))
                .ok_or("Bouquet name must not be empty")?;
            println!("{}", bq.id());
        }
        Command::Set {
            uuid,
            property: prop,
            value,
        } => {
            let id = parse_id(&uuid)?;
            let def = property::lookup(&prop).ok_or(PropertyError::Unknown(prop.clone()))?;
            let value = def.kind.parse(def.id, &value)?;
            let changed =
                registry.write_property(AccessLevel::Admin, id, def.id, value, &mut collab, db)?;
            if !changed {
                info!("{}: {} unchanged", id, def.id);
            }
        }
        Command::Delete { uuid } => {
            let id = parse_id(&uuid)?;
            match registry.delete(AccessLevel::Admin, id, db)? {
                DeleteOutcome::Removed => info!("Bouquet {} deleted", id),
                DeleteOutcome::Emptied => info!("Bouquet {} is shielded, services cleared", id),
            }
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Explicit path > auto-detect > default
    let file_config = match ConfigFile::locate(args.config.as_deref()) {
        Some(path) => {
            let config = ConfigFile::load(&path)?;
            eprintln!("Loaded config from: {}", path.display());
            config
        }
        None => ConfigFile::default(),
    };

    // Command line takes precedence
    let log_dir = args
        .log_dir
        .or_else(|| file_config.logging.log_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
    let log_retention_days = args
        .log_retention_days
        .or(file_config.logging.retention_days)
        .unwrap_or(DEFAULT_RETENTION_DAYS);
    let _log_guard = logging::init_logging(
        &log_dir,
        log_retention_days,
        args.verbose,
        file_config.logging.level.as_deref(),
    )?;

    let db_path = args
        .database
        .or_else(|| file_config.database.path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

    info!("Opening database: {:?}", db_path);
    let db = match Database::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let subsystem = BouquetSubsystem::new();
    let result = {
        let mut registry = subsystem.lock();
        registry.init(&db)?;
        ensure_system_bouquets(&mut registry, &file_config.bouquet.system);

        let result = run(args.command, &mut registry, &db);
        match registry.save_dirty(&db) {
            Ok(0) => {}
            Ok(n) => info!("Saved {} bouquets", n),
            Err(e) => error!("Failed to save bouquets: {}", e),
        }
        result
    };
    subsystem.shutdown();

    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}
