//! # File Vault CLI (`vault`)
//!
//! Upload, browse, preview, export, and delete files kept in the local
//! `man` database.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vault init` | Create or upgrade the database schema |
//! | `vault upload <PATH>...` | Store files (directories are walked) |
//! | `vault list` | Show files, filtered by category and search term |
//! | `vault show <ID>` | Preview a file's details |
//! | `vault export <ID>` | Write a file's original bytes back to disk |
//! | `vault delete <ID>` | Remove a file |
//! | `vault stats` | Storage summary |
//!
//! ## Examples
//!
//! ```bash
//! vault upload ~/Pictures/holiday ./report.pdf
//! vault list --category picture --search beach --view list
//! vault export 12 --out ./restored.png
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use file_vault::app::{ingest_notice, notice, App};
use file_vault::config::{self, Config};
use file_vault::gate::ReadyStore;
use file_vault::models::Category;
use file_vault::progress::ProgressMode;
use file_vault::sqlite_store::SqliteStore;
use file_vault::store::StoreError;
use file_vault::view::{format_file_size, icon_for, CategoryFilter, PreviewKind, ViewMode};
use file_vault::{logging, migrate};

/// File Vault CLI: a local-first file manager backed by an embedded
/// database.
#[derive(Parser)]
#[command(
    name = "vault",
    about = "File Vault — store, categorize, search, preview, and export files locally",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults apply when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/vault.toml")]
    config: PathBuf,

    /// Show debug logs on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database, or upgrade its schema. Idempotent.
    Init,

    /// Store one or more files.
    ///
    /// Each file is read and stored independently; a file that fails does
    /// not stop the others.
    Upload {
        /// Files or directories to upload.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Progress output on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a terminal.
        #[arg(long)]
        progress: Option<ProgressMode>,
    },

    /// List stored files.
    List {
        /// `all`, `picture`, `video`, `large`, or `file`.
        #[arg(long, default_value = "all")]
        category: CategoryFilter,

        /// Only files whose name contains this text (case-insensitive).
        #[arg(long, default_value = "")]
        search: String,

        /// Layout: `grid` or `list`.
        #[arg(long, default_value = "grid")]
        view: ViewMode,

        /// Print the rendered view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a file's details.
    Show {
        id: i64,
    },

    /// Write a file's original content to disk.
    Export {
        id: i64,

        /// Destination file or directory. Defaults to the stored name in the
        /// current directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete a file.
    Delete {
        id: i64,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Show file count and storage used.
    Stats,
}

async fn open_app(cfg: &Config) -> Result<App<ReadyStore<SqliteStore>>> {
    let open_cfg = cfg.clone();
    let store = ReadyStore::spawn(
        move || async move { SqliteStore::open(&open_cfg).await },
        cfg.store.ready_timeout(),
    );
    App::start(Arc::new(store))
        .await
        .map_err(|e| anyhow!(notice(&e)))
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::init(&cfg).await.map_err(|e| {
                anyhow!(notice(&StoreError::Unavailable(format!("{:#}", e))))
            })?;
            println!("Database initialized at {}", cfg.db.path.display());
        }
        Commands::Upload { paths, progress } => {
            let mut app = open_app(&cfg).await?;
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let reporter = mode.reporter();
            let mut selection = paths;
            let report = app
                .upload(&mut selection, &cfg.ingest, reporter.as_ref())
                .await?;

            println!("upload");
            println!("  selected: {}", report.total());
            println!("  stored: {}", report.stored.len());
            for rec in &report.stored {
                println!(
                    "    #{} {} ({}, {})",
                    rec.id,
                    rec.name,
                    rec.category,
                    format_file_size(rec.size)
                );
            }
            println!("  failed: {}", report.failures.len());
            for failure in &report.failures {
                println!("    {}", ingest_notice(&failure.error));
            }
            println!("  storage: {}", app.summary());
        }
        Commands::List {
            category,
            search,
            view,
            json,
        } => {
            let mut app = open_app(&cfg).await?;
            app.set_category(category);
            app.set_search(search);
            app.set_view(view);
            let rendered = app.render();
            if json {
                println!("{}", serde_json::to_string_pretty(&rendered)?);
            } else {
                print!("{}", rendered.to_text());
                println!();
                println!("{}", app.summary());
            }
        }
        Commands::Show { id } => {
            let app = open_app(&cfg).await?;
            let preview = app
                .preview(id)
                .await
                .map_err(|e| anyhow!(notice(&e)))?
                .ok_or_else(|| anyhow!("No file with id {}", id))?;
            let rec = &preview.record;
            let created = rec
                .created_local()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| rec.date.clone());

            println!("{} {}", icon_for(rec.category), rec.name);
            println!("  id:        {}", rec.id);
            println!(
                "  type:      {}",
                if rec.mime_type.is_empty() {
                    "unknown"
                } else {
                    rec.mime_type.as_str()
                }
            );
            println!("  category:  {}", rec.category);
            println!("  size:      {}", format_file_size(rec.size));
            println!("  date:      {}", created);
            match preview.kind {
                PreviewKind::Image => println!("  preview:   image"),
                PreviewKind::Video => println!("  preview:   video"),
                PreviewKind::Download => println!(
                    "  preview:   not available, use `vault export {}` to download",
                    rec.id
                ),
            }
        }
        Commands::Export { id, out } => {
            let app = open_app(&cfg).await?;
            let dest = out.unwrap_or_else(|| PathBuf::from("."));
            match app.export(id, &dest).await? {
                Some(path) => println!("Exported #{} to {}", id, path.display()),
                None => return Err(anyhow!("No file with id {}", id)),
            }
        }
        Commands::Delete { id, yes } => {
            let mut app = open_app(&cfg).await?;
            let name = app.catalog().get(id).map(|r| r.name.clone());
            if let Some(name) = &name {
                if !yes && !confirm(&format!("Delete '{}' (#{})?", name, id))? {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            let removed = app
                .delete(id)
                .await
                .map_err(|e| anyhow!(notice(&e)))?;
            if removed {
                println!("Deleted #{}", id);
            } else {
                println!("Nothing to delete: no file with id {}", id);
            }
        }
        Commands::Stats => {
            let app = open_app(&cfg).await?;
            let summary = app.summary();
            println!("File Vault — Storage");
            println!("====================");
            println!();
            println!("  Database:  {}", cfg.db.path.display());
            println!("  Files:     {}", summary.file_count);
            println!("  Used:      {}", format_file_size(summary.total_bytes));
            println!();
            println!("  {:<12} {:>6} {:>12}", "CATEGORY", "FILES", "SIZE");
            println!("  {}", "-".repeat(32));
            for category in Category::ALL {
                let totals = summary.per_category.get(&category).copied().unwrap_or_default();
                println!(
                    "  {:<12} {:>6} {:>12}",
                    category.as_str(),
                    totals.file_count,
                    format_file_size(totals.total_bytes)
                );
            }
            println!();
        }
    }

    Ok(())
}
