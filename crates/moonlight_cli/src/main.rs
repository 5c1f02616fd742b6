//! Moonlight CLI
//!
//! Command-line tools for Moonlight collections and the application
//! registry.
//!
//! # Commands
//!
//! - `configure`, `settings` - Server address and collection logging
//! - `create-user`, `delete-user`, `users` - User management
//! - `create-database`, `delete-database`, `databases` - Collection catalog
//! - `push`, `all`, `get`, `update`, `delete`, `drop`, `count`, `contains`,
//!   `length` - Record operations
//! - `apply` - Apply a Moonfile
//! - `serve` - Run the HTTP server

mod commands;
mod error;
mod logging;
mod moonfile;

use clap::{Parser, Subcommand};
use commands::{Context, Format};
use error::CliResult;
use moonlight_core::{LogLevel, Permission};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Moonlight JSON document store tools.
#[derive(Parser)]
#[command(name = "moonlight")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Application root (holds config.json, databases/ and logs/)
    #[arg(global = true, short, long)]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Milliseconds to wait for a busy collection or registry lock
    #[arg(global = true, long, value_name = "MS", default_value_t = 5000)]
    lock_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the server address and collection log levels
    Configure {
        /// Bind host
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(long)]
        port: Option<u16>,

        /// Comma-separated log levels (info, success, warning, error); empty disables logs
        #[arg(long, value_delimiter = ',')]
        loggers: Option<Vec<String>>,

        /// Reset to defaults first
        #[arg(long)]
        reset: bool,
    },

    /// Show the current settings
    Settings,

    /// Register a user
    CreateUser {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Permissions (viewer, editor, administrator)
        #[arg(long, default_value = "viewer")]
        permissions: Permission,
    },

    /// Remove a user
    DeleteUser {
        /// Login name
        username: String,
    },

    /// List users
    Users {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Create and register a collection
    CreateDatabase {
        /// Collection name
        name: String,

        /// Recorded author
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Drop a registered collection
    DeleteDatabase {
        /// Collection name
        name: String,
    },

    /// List registered collections
    Databases {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Insert a record
    Push {
        /// Collection name
        db: String,
        /// Record as a JSON object
        record: String,
    },

    /// Print every record
    All {
        /// Collection name
        db: String,
    },

    /// Print records matching a query
    Get {
        /// Collection name
        db: String,
        /// Query as a JSON object
        query: String,
    },

    /// Update the record(s) carrying the patch's id
    Update {
        /// Collection name
        db: String,
        /// Patch as a JSON object including the id
        patch: String,
    },

    /// Delete a record by id
    Delete {
        /// Collection name
        db: String,
        /// Record id
        id: String,
    },

    /// Remove a collection's files
    Drop {
        /// Collection name
        db: String,
    },

    /// Count records with a field equal to a value
    Count {
        /// Collection name
        db: String,
        /// Field name
        key: String,
        /// Value (JSON, or a plain string)
        value: String,
    },

    /// Check whether any record has a field equal to a value
    Contains {
        /// Collection name
        db: String,
        /// Field name
        key: String,
        /// Value (JSON, or a plain string)
        value: String,
    },

    /// Print the number of records
    Length {
        /// Collection name
        db: String,
    },

    /// Apply a Moonfile
    Apply {
        /// Moonfile path (relative to the root)
        #[arg(short, long, default_value = moonfile::MOONFILE)]
        moonfile: PathBuf,

        /// Skip lines with errors instead of aborting
        #[arg(long)]
        force: bool,
    },

    /// Run the HTTP server
    Serve,

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let root = match cli.root.clone() {
        Some(root) => root,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    // Initialize logging
    let _guard = logging::init(&root.join("logs"), cli.verbose);

    let ctx = Context::new(root).with_lock_timeout(Duration::from_millis(cli.lock_timeout));
    match run(&ctx, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, command: Commands) -> CliResult<()> {
    let output = match command {
        Commands::Configure {
            host,
            port,
            loggers,
            reset,
        } => {
            let loggers = loggers
                .map(|names| parse_levels(&names))
                .transpose()?;
            commands::settings::run(
                ctx,
                commands::settings::ConfigureArgs {
                    host,
                    port,
                    loggers,
                    reset,
                },
            )?
        }
        Commands::Settings => commands::settings::show(ctx)?,
        Commands::CreateUser {
            username,
            password,
            permissions,
        } => commands::users::create(ctx, &username, &password, permissions)?,
        Commands::DeleteUser { username } => commands::users::delete(ctx, &username)?,
        Commands::Users { format } => commands::users::list(ctx, format)?,
        Commands::CreateDatabase { name, author } => {
            commands::databases::create(ctx, &name, author.as_deref())?
        }
        Commands::DeleteDatabase { name } => commands::databases::delete(ctx, &name)?,
        Commands::Databases { format } => commands::databases::list(ctx, format)?,
        Commands::Push { db, record } => commands::data::push(ctx, &db, &record)?,
        Commands::All { db } => commands::data::all(ctx, &db)?,
        Commands::Get { db, query } => commands::data::get(ctx, &db, &query)?,
        Commands::Update { db, patch } => commands::data::update(ctx, &db, &patch)?,
        Commands::Delete { db, id } => commands::data::delete(ctx, &db, &id)?,
        Commands::Drop { db } => commands::data::drop_collection(ctx, &db)?,
        Commands::Count { db, key, value } => commands::data::count(ctx, &db, &key, &value)?,
        Commands::Contains { db, key, value } => {
            commands::data::contains(ctx, &db, &key, &value)?
        }
        Commands::Length { db } => commands::data::length(ctx, &db)?,
        Commands::Apply { moonfile, force } => {
            let path = ctx.root().join(moonfile);
            commands::apply::run(ctx, &path, force)?
        }
        Commands::Serve => {
            commands::serve::run(ctx)?;
            return Ok(());
        }
        Commands::Version => format!(
            "Moonlight CLI v{}\nMoonlight Core v{}",
            env!("CARGO_PKG_VERSION"),
            moonlight_core::VERSION
        ),
    };

    println!("{output}");
    Ok(())
}

fn parse_levels(names: &[String]) -> CliResult<Vec<LogLevel>> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| name.parse().map_err(error::CliError::InvalidArgument))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_commands() {
        let cli = Cli::try_parse_from([
            "moonlight",
            "--root",
            "/srv/moon",
            "create-user",
            "-u",
            "root",
            "-p",
            "pw",
            "--permissions",
            "admin",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/srv/moon")));
        assert!(matches!(
            cli.command,
            Commands::CreateUser {
                permissions: Permission::Administrator,
                ..
            }
        ));

        assert_eq!(cli.lock_timeout, 5000);

        let cli = Cli::try_parse_from([
            "moonlight", "count", "users", "age", "30", "-v", "--lock-timeout", "250",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.lock_timeout, 250);
        assert!(matches!(cli.command, Commands::Count { .. }));
    }

    #[test]
    fn parses_levels() {
        let levels = parse_levels(&["info".into(), " Error".into(), String::new()]).unwrap();
        assert_eq!(levels, vec![LogLevel::Info, LogLevel::Error]);
        assert!(parse_levels(&["trace".into()]).is_err());
    }
}
