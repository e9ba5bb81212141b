//! Command-line interface parsing for rentcache
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a validated `ClientConfig` for the rental API client.

use clap::{Parser, Subcommand};
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

use crate::cache::CacheConfig;

/// Default API location for a locally running rental backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The base URL is not an absolute http(s) URL
    #[error("Invalid base URL: '{0}'. Expected an absolute http:// or https:// URL")]
    InvalidBaseUrl(String),

    /// The cache TTL is zero
    #[error("Invalid cache TTL: must be at least 1 second")]
    InvalidTtl,
}

/// rentcache - Query a vehicle rental API through an in-memory TTL cache
#[derive(Parser, Debug)]
#[command(name = "rentcache")]
#[command(about = "Vehicle rental API client with response caching")]
#[command(version)]
pub struct Cli {
    /// Base URL of the rental REST API
    #[arg(long, env = "RENTAL_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "RENTAL_API_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Lifetime of cached responses in seconds
    #[arg(long, default_value_t = 300, global = true)]
    pub ttl_secs: u64,

    /// Log cache hits, misses and requests
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Resources that can be fetched
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all vehicles
    Vehicles,
    /// Show one vehicle
    Vehicle { id: String },
    /// List all mechanics
    Mechanics,
    /// Show one mechanic
    Mechanic { id: String },
    /// List bookings
    Bookings,
    /// Show the signed-in user's profile
    Profile,
    /// Report when the configured token expires
    TokenStatus,
}

/// Configuration derived from CLI arguments for building a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL without a trailing slash
    pub base_url: String,
    /// Bearer token, if one was supplied
    pub token: Option<String>,
    /// Cache settings
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            cache: CacheConfig::default(),
        }
    }
}

/// Validates a base URL argument.
///
/// # Returns
/// * `Ok(String)` with any trailing slash removed
/// * `Err(CliError::InvalidBaseUrl)` if the URL is relative or not http(s)
pub fn parse_base_url(s: &str) -> Result<String, CliError> {
    let url = Url::parse(s).map_err(|_| CliError::InvalidBaseUrl(s.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(s.trim_end_matches('/').to_string()),
        _ => Err(CliError::InvalidBaseUrl(s.to_string())),
    }
}

impl ClientConfig {
    /// Creates a ClientConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ClientConfig)` with validated settings
    /// * `Err(CliError)` if the base URL or TTL is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.ttl_secs == 0 {
            return Err(CliError::InvalidTtl);
        }

        Ok(ClientConfig {
            base_url: parse_base_url(&cli.base_url)?,
            // An empty env var means "no token"
            token: cli.token.clone().filter(|t| !t.trim().is_empty()),
            cache: CacheConfig {
                default_ttl: Duration::from_secs(cli.ttl_secs),
            },
        })
    }
}
