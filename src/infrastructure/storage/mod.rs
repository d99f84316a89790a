//! Storage infrastructure - backend selection, pooling and migrations

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{StorageFactory, UserStores};
pub use migrations::{run_migrations, user_migrations, Migration, Migrator, PostgresMigrator};
pub use postgres::{connect_pool, is_unique_violation};
