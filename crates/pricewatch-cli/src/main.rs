mod collect;
mod db;
mod verify;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricewatch-cli")]
#[command(about = "pricewatch command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Scrape stores and commit what they list
    Collect {
        /// Restrict the run to one store (by slug)
        #[arg(long)]
        store: Option<String>,

        /// Print the stores that would be scraped without creating runs
        #[arg(long)]
        dry_run: bool,
    },
    /// Check that ingested data looks complete
    Verify {
        /// Restrict verification to one store (by slug)
        #[arg(long)]
        store: Option<String>,

        /// How far back a price update still counts as recent
        #[arg(long, default_value_t = pricewatch_ingest::DEFAULT_WINDOW_MINUTES)]
        window_minutes: i32,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check the database connection
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Load stores from the registry and the fallback categories
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("pricewatch-cli: run with --help to list commands");
        return Ok(());
    };

    let config = pricewatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = pricewatch_db::connect_pool_from_config(&config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_ping(&pool).await,
            DbCommands::Migrate => db::run_migrate(&pool).await,
            DbCommands::Seed => db::run_seed(&pool, &config).await,
        },
        Commands::Collect { store, dry_run } => {
            collect::run_collect(&pool, &config, store.as_deref(), dry_run).await
        }
        Commands::Verify {
            store,
            window_minutes,
            json,
        } => verify::run_verify(&pool, store.as_deref(), window_minutes, json).await,
    }
}

#[cfg(test)]
mod tests;
