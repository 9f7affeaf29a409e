// Sendq Infrastructure - SQLite Adapter
// Implements: StateStore (one serialized record per installation)

mod connection;
mod error;
mod migration;
mod state_store;

pub use connection::{create_pool, database_url};
pub use error::map_sqlx_error;
pub use migration::run_migrations;
pub use state_store::{SqliteStateStore, DEFAULT_RECORD_KEY};
