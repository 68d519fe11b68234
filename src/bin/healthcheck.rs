use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

/// Container health probe: exits 0 when the local API answers its root
/// endpoint within the timeout, 1 otherwise.
#[derive(Debug, Parser)]
#[command(name = "healthcheck")]
#[command(about = "Probe the local progression API", long_about = None)]
struct Args {
    /// Port the API listens on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Probe timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let url = format!("http://127.0.0.1:{}/", args.port);

    let Ok(client) = reqwest::Client::builder()
        .timeout(Duration::from_millis(args.timeout_ms))
        .build()
    else {
        return ExitCode::FAILURE;
    };

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
