use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use lifelog_store::{BackingStore, LocalData, RedbStore, SqliteStore};

mod commands;
mod config;

use commands::BackendInfo;
use config::{Backend, CliConfig};

/// lifelog: inspect and edit a lifelog database from the command line.
///
/// Reads `lifelog.toml` from the working directory when present. Set
/// `LIFELOG_LOG` (e.g. `LIFELOG_LOG=debug`) to see store activity.
#[derive(Parser)]
#[command(name = "lifelog", version, about, long_about = None)]
struct Cli {
    /// Database file. Overrides `path` from the config file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file to use instead of `./lifelog.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show backend, file and per-slot statistics.
    Status,

    /// Print a collection as JSON.
    List {
        /// Collection key, e.g. `todos` or `monthlyGoals`, or `settings`.
        collection: String,
    },

    /// Add, complete or remove todos.
    Todo {
        #[command(subcommand)]
        action: TodoAction,
    },

    /// Migrate legacy goal records now and report what changed.
    Migrate,

    /// Show settings, or change them with `settings set`.
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Subcommand)]
enum TodoAction {
    /// Create a todo.
    Add {
        /// Todo text.
        text: String,
    },
    /// Mark a todo completed.
    Done {
        /// Todo id.
        id: String,
    },
    /// Delete a todo.
    Rm {
        /// Todo id.
        id: String,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Change one or more settings.
    Set {
        #[arg(long)]
        dark_mode: Option<bool>,

        #[arg(long)]
        theme_color: Option<String>,

        /// Push notifications.
        #[arg(long)]
        push: Option<bool>,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env("LIFELOG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> commands::Result {
    let config = CliConfig::load(cli.config.as_deref())?.with_db(cli.db);
    let path = config.path.display().to_string();

    match config.backend {
        Backend::Sqlite => {
            let store = SqliteStore::open_with_config(&config.path, config.sqlite.clone())?;
            let data = LocalData::builder(store)
                .migration_config(config.migration.into())
                .build();
            let info = BackendInfo {
                backend: config.backend.name(),
                path,
                size: data.store().file_size()?,
                journal: Some(data.store().journal_mode()?),
            };
            execute(&data, &info, cli.command)
        }
        Backend::Redb => {
            let store = RedbStore::open(&config.path)?;
            let data = LocalData::builder(store)
                .migration_config(config.migration.into())
                .build();
            let info = BackendInfo {
                backend: config.backend.name(),
                path,
                size: std::fs::metadata(&config.path).map_or(0, |m| m.len()),
                journal: None,
            };
            execute(&data, &info, cli.command)
        }
    }
}

fn execute<S: BackingStore>(
    data: &LocalData<S>,
    info: &BackendInfo,
    command: Commands,
) -> commands::Result {
    match command {
        Commands::Status => commands::status(data, info),
        Commands::List { collection } => commands::list(data, &collection),
        Commands::Todo { action } => match action {
            TodoAction::Add { text } => commands::todo_add(data, &text),
            TodoAction::Done { id } => commands::todo_done(data, &id),
            TodoAction::Rm { id } => commands::todo_rm(data, &id),
        },
        Commands::Migrate => commands::migrate(data),
        Commands::Settings { action: None } => commands::settings_show(data),
        Commands::Settings {
            action:
                Some(SettingsAction::Set {
                    dark_mode,
                    theme_color,
                    push,
                }),
        } => commands::settings_set(data, dark_mode, theme_color, push),
    }
}
