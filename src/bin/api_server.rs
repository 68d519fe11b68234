use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use progression_api::config::AppConfig;
use progression_api::server::run_server;

const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Parser)]
#[command(name = "api_server")]
#[command(about = "Launch the progression synchronization API", long_about = None)]
struct Args {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "SERVER_BIND", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// SeaORM-compatible Postgres URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Upper bound on pooled database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    db_max_connections: u32,

    /// Trust X-Forwarded-For from a fronting proxy when recording caller IPs
    #[arg(long, env = "TRUST_PROXY", default_value_t = false)]
    trust_proxy: bool,

    /// XP multiplier advertised to connected game servers
    #[arg(long, env = "XP_MULT", default_value_t = 1.0)]
    xp_multiplier: f64,

    /// Flag (never reject) submissions whose XP gain exceeds this value
    #[arg(long, env = "XP_ANOMALY_THRESHOLD")]
    xp_anomaly_threshold: Option<i64>,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "SERVER_LOG_JSON", default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(args.json);

    run_server(AppConfig {
        bind: args.bind,
        database_url: args.database_url,
        max_connections: args.db_max_connections,
        trust_proxy: args.trust_proxy,
        xp_multiplier: args.xp_multiplier,
        xp_anomaly_threshold: args.xp_anomaly_threshold,
    })
    .await
}

fn load_dotenv() {
    let manifest_env = env!("CARGO_MANIFEST_DIR");
    let manifest_env_path = PathBuf::from(manifest_env).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }
}
