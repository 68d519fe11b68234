pub mod auth;
pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod logging;
pub mod routes;

#[cfg(test)]
mod tests;

pub use bootstrap::run_server;
pub use error::ApiError;
pub use routes::{AppContext, ProgressionApiServer};
