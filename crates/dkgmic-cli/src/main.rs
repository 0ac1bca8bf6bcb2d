//! dkgmic - digiKam G'MIC filter database editor
//!
//! Lists, edits, imports and exports the filter hierarchy used by the
//! G'MIC batch queue tool.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dkgmic")]
#[command(author, version, about = "digiKam G'MIC filter database editor")]
#[command(long_about = "
Edits the hierarchy of G'MIC filters shown by the digiKam batch queue tool.

Paths are slash-separated titles below the root folder; an empty path is
the root folder itself.

Examples:
  dkgmic list                                 # Show the whole hierarchy
  dkgmic list --filter sharp                  # Only rows matching 'sharp'
  dkgmic add-folder '' Portrait               # Folder under the root folder
  dkgmic add-filter Portrait Soft --cmd blur='fx_blur 2' --cmd glow='fx_glow 10'
  dkgmic rename Portrait/Soft 'Soft glow'
  dkgmic chain 'Portrait/Soft glow'           # Print the chained command
  dkgmic import shared.xml
  dkgmic --db /tmp/filters.xml export backup.xml
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Filter database (default: <data dir>/digikam/gmicfilters.xml)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write log output to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the filter hierarchy
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Add a folder
    #[command(name = "add-folder")]
    AddFolder(AddFolderArgs),

    /// Add a filter made of chained G'MIC commands
    #[command(name = "add-filter")]
    AddFilter(AddFilterArgs),

    /// Add a separator
    #[command(name = "add-separator")]
    AddSeparator(AddSeparatorArgs),

    /// Remove a filter, folder or separator
    #[command(visible_alias = "rm")]
    Remove(PathArgs),

    /// Change the title of a filter or folder
    Rename(RenameArgs),

    /// Change the description of a filter
    Comment(CommentArgs),

    /// Import another database as a new folder
    Import(ImportArgs),

    /// Export the whole hierarchy
    Export(ExportArgs),

    /// Print the chained command of a filter
    Chain(ChainArgs),

    /// Show details of an entry
    Show(PathArgs),

    /// Print or set the current selection path
    Current(CurrentArgs),
}

#[derive(Args)]
struct ListArgs {
    /// Show only rows whose title contains this text, and their folders
    #[arg(short, long)]
    filter: Option<String>,

    /// Show chained commands next to filters
    #[arg(short, long)]
    commands: bool,
}

#[derive(Args)]
struct PathArgs {
    /// Entry path
    path: String,
}

#[derive(Args)]
struct AddFolderArgs {
    /// Parent path
    parent: String,

    /// Folder title
    title: String,
}

#[derive(Args)]
struct AddFilterArgs {
    /// Parent path
    parent: String,

    /// Filter title
    title: String,

    /// Chained command as name=command, in order
    #[arg(long = "cmd", required = true)]
    commands: Vec<String>,

    /// Description
    #[arg(short, long, default_value = "")]
    desc: String,
}

#[derive(Args)]
struct AddSeparatorArgs {
    /// Parent path
    parent: String,
}

#[derive(Args)]
struct RenameArgs {
    /// Entry path
    path: String,

    /// New title
    title: String,
}

#[derive(Args)]
struct CommentArgs {
    /// Filter path
    path: String,

    /// New description
    text: String,
}

#[derive(Args)]
struct ImportArgs {
    /// Database to import
    input: PathBuf,

    /// Title of the created folder (default: "Imported Filters <date>")
    #[arg(short, long)]
    title: Option<String>,
}

#[derive(Args)]
struct ExportArgs {
    /// Output file
    output: PathBuf,
}

#[derive(Args)]
struct ChainArgs {
    /// Filter path
    path: String,

    /// Also list the chained sub-filters
    #[arg(short, long)]
    list: bool,
}

#[derive(Args)]
struct CurrentArgs {
    /// New current path
    path: Option<String>,
}

/// Sets up tracing. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("Invalid log file: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let db = match cli.db {
        Some(db) => db,
        None => dkgmic_filters::default_database_path().context("Cannot locate the user data directory")?,
    };
    let mut manager = commands::open_manager(&db)?;

    match cli.command {
        Commands::List(args) => commands::list::run(args, &mut manager),
        Commands::AddFolder(args) => commands::edit::run_add_folder(args, &mut manager),
        Commands::AddFilter(args) => commands::edit::run_add_filter(args, &mut manager),
        Commands::AddSeparator(args) => commands::edit::run_add_separator(args, &mut manager),
        Commands::Remove(args) => commands::edit::run_remove(args, &mut manager),
        Commands::Rename(args) => commands::edit::run_rename(args, &mut manager),
        Commands::Comment(args) => commands::edit::run_comment(args, &mut manager),
        Commands::Import(args) => commands::transfer::run_import(args, &mut manager),
        Commands::Export(args) => commands::transfer::run_export(args, &manager),
        Commands::Chain(args) => commands::show::run_chain(args, &manager),
        Commands::Show(args) => commands::show::run_show(args, &manager),
        Commands::Current(args) => commands::show::run_current(args, &mut manager),
    }
}
