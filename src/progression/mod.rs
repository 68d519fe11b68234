pub mod auth;
pub mod error;
pub mod service;
pub mod storage;
pub mod types;
pub mod validation;


pub use auth::{AuthError, AuthGate, AuthedServer};
pub use error::SyncError;
pub use service::{ProgressionService, RoundService};
pub use storage::{SyncStorage, SyncStorageTxn};
pub use types::*;
