//! rentcache - Query a vehicle rental API from the terminal
//!
//! Fetches one resource through the cached API client and prints it as JSON.
//! Each run builds a fresh in-memory cache and makes a single request, so the
//! CLI never sees a cache hit from an earlier run. Use `--verbose` to watch the
//! client's cache logging within a run.

use clap::Parser;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rentcache::cache::SystemClock;
use rentcache::cli::{Cli, ClientConfig, Command};
use rentcache::data::{time_until_expiry, token_expiry, RentalClient};

/// Installs a stderr log subscriber, honouring `RUST_LOG` when set
fn init_logging(verbose: bool) {
    let fallback = if verbose { "rentcache=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Prints a value as pretty JSON on stdout
fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints when the configured token expires
fn print_token_status(token: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let token = token.ok_or("No token configured (use --token or RENTAL_API_TOKEN)")?;
    let expiry = token_expiry(token)?;
    match time_until_expiry(token, &SystemClock) {
        Some(remaining) => println!(
            "Token valid until {} ({}s remaining)",
            expiry.to_rfc3339(),
            remaining.as_secs()
        ),
        None => println!("Token expired at {}", expiry.to_rfc3339()),
    }
    Ok(())
}

/// Runs one command against the API
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_cli(&cli)?;
    debug!(base_url = %config.base_url, ttl_secs = config.cache.default_ttl.as_secs(), "Starting");

    let client = RentalClient::from_config(&config);

    match &cli.command {
        Command::Vehicles => print_json(&client.list_vehicles().await?)?,
        Command::Vehicle { id } => print_json(&client.get_vehicle(id).await?)?,
        Command::Mechanics => print_json(&client.list_mechanics().await?)?,
        Command::Mechanic { id } => print_json(&client.get_mechanic(id).await?)?,
        Command::Bookings => print_json(&client.list_bookings().await?)?,
        Command::Profile => print_json(&client.get_profile().await?)?,
        Command::TokenStatus => print_token_status(config.token.as_deref())?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
