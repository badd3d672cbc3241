use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use tab_warden::{SessionKind, SessionStore, SqliteKvStore, clean_domain, full_domain};

#[derive(Parser)]
#[command(name = "tab-warden")]
#[command(version)]
#[command(about = "Inspect and manage saved browser sessions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the session database (defaults to ~/.tab-warden/store.db)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored sessions
    List {
        /// Collection to list (manual, auto, closed)
        #[arg(default_value = "manual")]
        kind: String,
    },
    /// Delete one session by id
    Delete {
        session_id: String,
        /// Collection the session lives in (manual, auto, closed)
        #[arg(long, default_value = "manual")]
        kind: String,
    },
    /// Rename a manually saved session
    Rename { session_id: String, new_name: String },
    /// Empty a whole collection
    Clear {
        /// Collection to clear (manual, auto, closed)
        kind: String,
    },
    /// Show the grouping key a URL resolves to
    Domain { url: String },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive("warn".parse().expect("valid log directive"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn open_store(db: Option<&str>) -> Result<SessionStore> {
    let kv = match db {
        Some(path) => SqliteKvStore::new(path)?,
        None => SqliteKvStore::default_location()?,
    };
    Ok(SessionStore::new(Arc::new(kv)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli).await;
    if let Err(e) = result {
        error!(error = %e, "command failed");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::List { kind } => {
            let kind: SessionKind = kind.parse()?;
            let store = open_store(cli.db.as_deref())?;
            let sessions = store.list(kind).await.context("failed to list sessions")?;
            if sessions.is_empty() {
                println!("no {} sessions", kind);
                return Ok(());
            }
            for session in sessions {
                println!(
                    "{}  {}  ({} tabs, {} groups)",
                    session.id, session.name, session.tab_count, session.group_count
                );
            }
        }
        Commands::Delete { session_id, kind } => {
            let kind: SessionKind = kind.parse()?;
            let store = open_store(cli.db.as_deref())?;
            store.delete(&session_id, kind).await?;
            println!("deleted {}", session_id);
        }
        Commands::Rename {
            session_id,
            new_name,
        } => {
            let store = open_store(cli.db.as_deref())?;
            store.rename(&session_id, &new_name).await?;
            println!("renamed {}", session_id);
        }
        Commands::Clear { kind } => {
            let kind: SessionKind = kind.parse()?;
            let store = open_store(cli.db.as_deref())?;
            store.clear(kind).await?;
            println!("cleared {} sessions", kind);
        }
        Commands::Domain { url } => {
            println!("domain key: {}", clean_domain(&url));
            println!("full host:  {}", full_domain(&url));
        }
    }
    Ok(())
}
