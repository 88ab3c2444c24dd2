//! pwstore CLI — `pwstore` command.
//!
//! Every invocation names one record and one operation on it:
//!
//! ```text
//! pwstore github add
//! pwstore github update user alice
//! pwstore github get user
//! pwstore github alias gh
//! ```

mod clipboard;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pwstore::{
    Cipher, GpgEngine, GitEngine, LogReporter, RecordService, Settings, SharedReporter,
    VersionedStore,
};

type Service = RecordService<GpgEngine, GitEngine>;

// ── CLI structure ─────────────────────────────────────────────────────────────

/// pwstore — a command-line password manager.
///
/// Records are gpg-encrypted JSON maps kept in a git repository.
#[derive(Parser, Debug)]
#[command(
    name = "pwstore",
    about = "A command-line password manager backed by gpg and git",
    version,
    long_about = "pwstore — a command-line password manager\n\nEach record is a set of key/value fields encrypted with gpg for $PWSTORE_KEY\nand stored in a git repository at $PWSTORE_DIR (or the platform data directory).\nEvery change is committed."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Record to operate on (for `search`, the text to look for)
    record: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the keys in a record
    List,

    /// Create a new record
    Add,

    /// Delete KEY from a record
    Delete { key: String },

    /// Retrieve a KEY value from a record
    Get { key: String },

    /// Update a record's KEY with VALUE
    Update { key: String, value: String },

    /// Decrypt a record and print it
    Select,

    /// Delete an entire record from the disk
    Drop,

    /// Create a link named ALIAS to the record
    Alias { alias: String },

    /// Find records whose name contains RECORD
    Search,

    /// Show recent commits in the store
    History {
        /// Maximum number of commits to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Copy a KEY value to the system clipboard
    Copy { key: String },
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn open_service(settings: &Settings) -> Result<Service> {
    let reporter: SharedReporter = LogReporter::shared();
    let engine_home = settings
        .engine_home()
        .context("GNUPGHOME could not be found")?;
    let cipher = Cipher::new(GpgEngine::new(engine_home));
    let store = VersionedStore::new(settings.store_dir(), GitEngine::new(), reporter.clone());
    RecordService::open(cipher, store, settings.recipient().cloned(), reporter)
        .with_context(|| format!("failed to open store at {}", settings.store_dir().display()))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;
    let service = open_service(&settings)?;
    let record = cli.record.as_str();

    match cli.command {
        Commands::List => cmd_list(&service, record),
        Commands::Add => cmd_add(&service, record),
        Commands::Delete { key } => cmd_delete(&service, record, &key),
        Commands::Get { key } => cmd_get(&service, record, &key),
        Commands::Update { key, value } => cmd_update(&service, record, &key, &value),
        Commands::Select => cmd_select(&service, record),
        Commands::Drop => cmd_drop(&service, record),
        Commands::Alias { alias } => cmd_alias(&service, record, &alias),
        Commands::Search => cmd_search(&service, record),
        Commands::History { limit } => cmd_history(&service, limit),
        Commands::Copy { key } => cmd_copy(&service, record, &key),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_list(service: &Service, record: &str) -> Result<()> {
    for key in service.list(record)? {
        println!("{key}");
    }
    Ok(())
}

fn cmd_add(service: &Service, record: &str) -> Result<()> {
    let commit = service.create(record)?;
    log::info!("created {record} in commit {}", commit.short());
    Ok(())
}

fn cmd_delete(service: &Service, record: &str, key: &str) -> Result<()> {
    let commit = service.delete(record, key)?;
    log::info!("removed {key} from {record} in commit {}", commit.short());
    Ok(())
}

fn cmd_get(service: &Service, record: &str, key: &str) -> Result<()> {
    let value = service.get(record, key)?;
    println!("{}", value.as_str());
    Ok(())
}

fn cmd_update(service: &Service, record: &str, key: &str, value: &str) -> Result<()> {
    let commit = service.update(record, key, value)?;
    log::info!("updated {key} in {record} in commit {}", commit.short());
    Ok(())
}

fn cmd_select(service: &Service, record: &str) -> Result<()> {
    let pretty = service.select(record)?;
    println!("{}", pretty.as_str());
    Ok(())
}

fn cmd_drop(service: &Service, record: &str) -> Result<()> {
    let commit = service.drop_record(record)?;
    log::info!("dropped {record} in commit {}", commit.short());
    Ok(())
}

fn cmd_alias(service: &Service, record: &str, alias: &str) -> Result<()> {
    let commit = service.alias(record, alias)?;
    log::info!("aliased {alias} -> {record} in commit {}", commit.short());
    Ok(())
}

fn cmd_search(service: &Service, fragment: &str) -> Result<()> {
    for name in service.search(fragment)? {
        println!("{name}");
    }
    Ok(())
}

fn cmd_history(service: &Service, limit: usize) -> Result<()> {
    for commit in service.history(limit)? {
        println!(
            "{}  {}  {}",
            commit.id.short(),
            commit.time.format("%Y-%m-%d %H:%M:%S UTC"),
            commit.summary
        );
    }
    Ok(())
}

fn cmd_copy(service: &Service, record: &str, key: &str) -> Result<()> {
    let value = service.get(record, key)?;
    clipboard::copy(value.as_str())
}
