pub mod config;
pub mod db;
pub mod progression;
pub mod server;

pub use config::AppConfig;
pub use progression::auth::{AuthGate, AuthedServer};
pub use progression::service::{ProgressionService, RoundService};
pub use progression::storage::{InMemorySyncStorage, SeaOrmSyncStorage, SyncStorage};
