//! Schema management for the RepairDesk database.
//!
//! Run with: cargo run --bin migration -- up

use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use repairdesk_api::{config, db, migrator::Migrator};

#[derive(Parser)]
#[command(name = "migration", about = "Apply or roll back RepairDesk schema migrations", version)]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: MigrationCommand,
}

#[derive(Subcommand)]
enum MigrationCommand {
    /// Apply pending migrations
    Up {
        #[arg(long, help = "Apply at most this many migrations")]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1, help = "Number of migrations to roll back")]
        steps: u32,
    },
    /// Print applied and pending migrations
    Status,
    /// Drop every table and reapply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let url = cli.database_url.unwrap_or_else(|| cfg.database_url.clone());
    info!("Connecting to database: {}", url);
    let pool = db::establish_connection(&url).await?;

    match cli.command {
        MigrationCommand::Up { steps } => {
            Migrator::up(&pool, steps).await?;
            info!("Migrations applied");
        }
        MigrationCommand::Down { steps } => {
            Migrator::down(&pool, Some(steps)).await?;
            info!(steps, "Migrations rolled back");
        }
        MigrationCommand::Status => {
            Migrator::status(&pool).await?;
        }
        MigrationCommand::Fresh => {
            Migrator::fresh(&pool).await?;
            info!("Database rebuilt from scratch");
        }
    }

    db::close_pool(pool).await?;
    Ok(())
}
