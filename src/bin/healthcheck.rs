//! Container health probe.
//!
//! Requests the gateway's health path and reports through the exit code:
//! 0 healthy (or no health path configured), 1 connection failure,
//! 2 any status other than 200.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

#[derive(Parser)]
#[command(name = "healthcheck")]
#[command(about = "Probe the gateway health endpoint", long_about = None)]
struct Cli {
    /// Host to probe; defaults to APP_HOST, then localhost.
    #[arg(long)]
    host: Option<String>,

    /// Port to probe; defaults to APP_PORT, then 80.
    #[arg(long)]
    port: Option<u16>,

    /// Health path; defaults to HEALTHCHECKER_PATH, then HEALTHCHECK_PATH.
    #[arg(long)]
    path: Option<String>,

    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(path) = cli
        .path
        .or_else(|| env("HEALTHCHECKER_PATH"))
        .or_else(|| env("HEALTHCHECK_PATH"))
    else {
        return ExitCode::SUCCESS;
    };
    let host = cli
        .host
        .or_else(|| env("APP_HOST"))
        .unwrap_or_else(|| "localhost".to_string());
    let port = cli
        .port
        .or_else(|| env("APP_PORT").and_then(|p| p.parse().ok()))
        .unwrap_or(80);
    let scheme = if env("SSL_KEY_PATH").is_some() { "https" } else { "http" };
    let url = format!("{}://{}:{}{}", scheme, host, port, path);

    // The gateway's certificate is usually issued for its public name.
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout_secs))
        .danger_accept_invalid_certs(true)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("healthcheck: {}", e);
            return ExitCode::from(1);
        }
    };

    match client.get(&url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => ExitCode::SUCCESS,
        Ok(response) => {
            eprintln!("healthcheck: {} answered {}", url, response.status());
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("healthcheck: {}", e);
            ExitCode::from(1)
        }
    }
}
