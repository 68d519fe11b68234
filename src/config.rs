use std::net::SocketAddr;

/// Runtime configuration assembled by the binaries and handed to bootstrap.
///
/// Owned by the caller; components receive only the pieces they need.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,
    /// SeaORM-compatible Postgres URL.
    pub database_url: String,
    /// Upper bound on pooled database connections.
    pub max_connections: u32,
    /// Honor `X-Forwarded-For` from a fronting proxy when recording caller IPs.
    pub trust_proxy: bool,
    /// XP multiplier advertised to connected game servers via the info endpoint.
    pub xp_multiplier: f64,
    /// When set, submissions whose total-XP gain exceeds this value are
    /// flagged in the log for out-of-band review. Never rejects.
    pub xp_anomaly_threshold: Option<i64>,
}
