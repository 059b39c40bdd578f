//! Storage infrastructure - PostgreSQL connection pooling and schema migrations

pub mod migrations;
mod postgres;

pub use migrations::{run_migrations, schema_migrations, Migration, Migrator, PostgresMigrator};
pub use postgres::{connect_pool, count_from_db, count_to_db, ping, PostgresConfig};
