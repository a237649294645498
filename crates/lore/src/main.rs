//! Command-line interface for the `lore` note search tool.

use std::{
    env, fs,
    io::{self, BufRead},
    process::ExitCode,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL_CONDENSED};
use lore_config::{CONFIG_FILENAME, Config};
use lore_index::{
    CacheManager, CancelFlag, InitOutcome, SearchOptions, Snapshot, search_index, shared_index,
};
use lore_query::parse;
use lore_sync::{ChangeListener, SyncManager, VaultWatcher};

#[derive(Parser)]
#[command(name = "lore")]
#[command(about = "Full-text search over a markdown note vault")]
/// Top-level CLI options.
struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    command: Commands,
}

#[derive(Subcommand)]
/// Supported `lore` subcommands.
enum Commands {
    /// Initialize a vault configuration in the current directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Build or refresh the search index
    Update {
        /// Force a full rebuild, ignoring the persisted snapshot
        #[arg(long)]
        full: bool,
    },

    /// Search the vault
    Search {
        /// The query string
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Watch the vault and keep the index up to date
    Watch,

    /// Show vault configuration and index state
    Status,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => cmd_init(force),
        Commands::Update { full } => cmd_update(full),
        Commands::Search { query, limit, json } => cmd_search(&query.join(" "), limit, json),
        Commands::Watch => cmd_watch(),
        Commands::Status => cmd_status(),
    }
}

/// Default configuration template with commented settings.
const CONFIG_TEMPLATE: &str = include_str!("../templates/config.toml");

/// Implements the `lore init` command.
fn cmd_init(force: bool) -> ExitCode {
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("error: could not determine current directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config_path = cwd.join(CONFIG_FILENAME);
    if config_path.exists() && !force {
        eprintln!("error: {} already exists", config_path.display());
        eprintln!("use --force to overwrite");
        return ExitCode::FAILURE;
    }

    if let Err(e) = fs::write(&config_path, CONFIG_TEMPLATE) {
        eprintln!("error: failed to write {}: {e}", config_path.display());
        return ExitCode::FAILURE;
    }

    println!("wrote {}", config_path.display());
    ExitCode::SUCCESS
}

/// Loads configuration, reporting the standard error message when no vault
/// is configured anywhere above the current directory.
fn load_config() -> Option<Config> {
    let cwd = env::current_dir().ok()?;
    match Config::discover(&cwd) {
        Ok(Some(config)) => Some(config),
        Ok(None) => {
            eprintln!("error: no {CONFIG_FILENAME} found; run `lore init` in your vault");
            None
        }
        Err(e) => {
            eprintln!("error: {e}");
            None
        }
    }
}

/// Implements the `lore update` command.
fn cmd_update(full: bool) -> ExitCode {
    let Some(config) = load_config() else {
        return ExitCode::FAILURE;
    };

    let cache = CacheManager::new(&config);
    let cancel = CancelFlag::new();

    let result = if full {
        cache.initialize(&cancel).and_then(|(mut index, _)| {
            let stats = cache.rebuild(&mut index, &cancel)?;
            cache.persist(&index);
            Ok((index, InitOutcome::Rebuilt(stats)))
        })
    } else {
        cache.initialize(&cancel)
    };

    match result {
        Ok((index, outcome)) => {
            let count = index.doc_count().unwrap_or(0);
            match outcome {
                InitOutcome::LoadedSnapshot => {
                    println!("index up to date ({count} notes, loaded from snapshot)");
                }
                InitOutcome::Rebuilt(stats) => {
                    println!(
                        "indexed {} notes ({} skipped)",
                        stats.files_indexed, stats.files_skipped
                    );
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Implements the `lore search` command.
fn cmd_search(raw_query: &str, limit: Option<usize>, json: bool) -> ExitCode {
    let Some(config) = load_config() else {
        return ExitCode::FAILURE;
    };

    let cache = CacheManager::new(&config);
    let (index, _) = match cache.initialize(&CancelFlag::new()) {
        Ok(ready) => ready,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let query = parse(raw_query);
    let mut options = SearchOptions::from_settings(&config.search);
    if let Some(limit) = limit {
        options.limit = limit;
    }

    let hits = match search_index(&index, &query, &options) {
        Ok(hits) => hits,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&hits) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("error: failed to serialize results: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    if hits.is_empty() {
        println!("no results");
        return ExitCode::SUCCESS;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(["Score", "Path", "Title", "Excerpt"]);
    for hit in &hits {
        table.add_row([
            format!("{:.2}", hit.score),
            hit.path.clone(),
            hit.title.clone(),
            hit.excerpt.clone(),
        ]);
    }
    println!("{table}");

    ExitCode::SUCCESS
}

/// Prints change notifications while watching.
struct PrintListener;

impl ChangeListener for PrintListener {
    fn on_batch_indexed(&self, paths: &[String]) {
        println!("indexed {} note(s)", paths.len());
    }

    fn on_removed(&self, paths: &[String]) {
        for path in paths {
            println!("removed {path}");
        }
    }
}

/// Implements the `lore watch` command.
fn cmd_watch() -> ExitCode {
    let Some(config) = load_config() else {
        return ExitCode::FAILURE;
    };

    let cache = Arc::new(CacheManager::new(&config));
    let (index, outcome) = match cache.initialize(&CancelFlag::new()) {
        Ok(ready) => ready,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let InitOutcome::Rebuilt(stats) = outcome {
        println!("indexed {} notes", stats.files_indexed);
    }

    let shared = shared_index();
    match shared.write() {
        Ok(mut guard) => *guard = Some(index),
        Err(_) => {
            eprintln!("error: index lock poisoned");
            return ExitCode::FAILURE;
        }
    }

    let manager = Arc::new(SyncManager::new(
        &config,
        shared,
        Arc::clone(&cache),
        Box::new(PrintListener),
    ));

    let _watcher = match VaultWatcher::start(&config, Arc::clone(&manager)) {
        Ok(watcher) => watcher,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "watching {} - press Enter to stop",
        config.vault.root.display()
    );

    // Block until the user ends the session, then shut the pipeline down
    // (cancels timers, drops pending updates, attempts a final persist).
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok();

    manager.shutdown();
    ExitCode::SUCCESS
}

/// Implements the `lore status` command.
fn cmd_status() -> ExitCode {
    let Some(config) = load_config() else {
        return ExitCode::FAILURE;
    };

    println!("vault: {}", config.vault.root.display());
    println!("include: {}", config.vault.include.join(", "));
    if !config.vault.exclude.is_empty() {
        println!("exclude: {}", config.vault.exclude.join(", "));
    }

    let live_count = live_note_count(&config);
    println!("notes on disk: {live_count}");

    let index_dir = config.index_dir();
    if !config.cache.persist {
        println!("index: persistence disabled");
        return ExitCode::SUCCESS;
    }

    match Snapshot::load(&index_dir) {
        Ok(Some(snapshot)) => {
            println!(
                "index: {} notes (snapshot v{})",
                snapshot.doc_count, snapshot.schema_version
            );
        }
        Ok(None) => println!("index: not built yet (run `lore update`)"),
        Err(_) => println!("index: snapshot unreadable (next update will rebuild)"),
    }

    ExitCode::SUCCESS
}

/// Counts trackable notes on disk, treating config errors as zero.
fn live_note_count(config: &Config) -> usize {
    config
        .compile_patterns()
        .ok()
        .and_then(|patterns| lore_index::discover_notes(&config.vault.root, &patterns).ok())
        .map(|notes| notes.len())
        .unwrap_or(0)
}
