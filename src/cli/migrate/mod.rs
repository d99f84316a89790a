//! Migrate command - applies or reverts the PostgreSQL schema

use clap::Args;
use tracing::info;

use crate::config::StorageBackend;
use crate::infrastructure::storage::{connect_pool, Migrator, PostgresMigrator};

/// Arguments for the migrate command
#[derive(Args, Clone)]
pub struct MigrateArgs {
    /// Revert the latest applied migration instead of applying pending ones
    #[arg(long, conflicts_with = "status")]
    pub revert: bool,

    /// Only print the current schema version
    #[arg(long)]
    pub status: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    if config.storage.backend != StorageBackend::Postgres {
        anyhow::bail!("Migrations require the postgres storage backend (set APP__STORAGE__BACKEND=postgres)");
    }

    let pool = connect_pool(&config.storage.postgres).await?;
    let migrator = PostgresMigrator::new(pool);

    if args.revert {
        migrator.revert().await?;
        info!("Reverted latest migration");
    } else if !args.status {
        migrator.run().await?;
        info!("Migrations applied");
    }

    match migrator.version().await? {
        Some(version) => println!("Schema version: {}", version),
        None => println!("Schema version: none"),
    }

    Ok(())
}
