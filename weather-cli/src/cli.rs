use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};
use weather_core::{Config, MemoryCache, WeatherLookup, provider_from_config};

use crate::{rate_limit::IpRateLimiter, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Cached weather lookup service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve `GET /{city}/` over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "WEATHER_BIND", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        /// Requests allowed per client IP per minute.
        #[arg(long, env = "WEATHER_RATE_LIMIT", default_value = "10")]
        rate_limit: NonZeroU32,
    },

    /// Look up one city and print the result as JSON.
    Show {
        /// City or free-form location, e.g. "São Paulo".
        city: String,
    },

    /// Store the Visual Crossing API key in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind, rate_limit } => {
                let lookup = build_lookup()?;
                server::serve(bind, lookup, IpRateLimiter::per_minute(rate_limit)).await
            }
            Command::Show { city } => {
                let lookup = build_lookup()?;

                match lookup.lookup(&city).await {
                    Ok(found) => {
                        let json = serde_json::to_string_pretty(&found.summary)
                            .context("Failed to serialize weather summary")?;
                        println!("{json}");
                        Ok(())
                    }
                    Err(err) => {
                        let json = serde_json::to_string_pretty(&err.body())
                            .context("Failed to serialize error body")?;
                        eprintln!("{json}");
                        bail!("Lookup for '{city}' failed with status {}", err.status_code())
                    }
                }
            }
            Command::Configure => configure(),
        }
    }
}

fn build_lookup() -> anyhow::Result<WeatherLookup> {
    let config = Config::load()?;
    let provider = provider_from_config(&config);
    Ok(WeatherLookup::new(Arc::new(MemoryCache::new()), provider))
}

fn configure() -> anyhow::Result<()> {
    // File values only: an environment key must not end up persisted.
    let mut config = Config::load_file()?;

    let api_key = Password::new("Visual Crossing API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["weather", "serve"]).expect("valid args");

        match cli.command {
            Command::Serve { bind, rate_limit } => {
                assert_eq!(bind, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
                assert_eq!(rate_limit.get(), 10);
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "weather",
            "serve",
            "--bind",
            "127.0.0.1:9000",
            "--rate-limit",
            "30",
        ])
        .expect("valid args");

        let Command::Serve { bind, rate_limit } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(bind.port(), 9000);
        assert_eq!(rate_limit.get(), 30);
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        assert!(Cli::try_parse_from(["weather", "serve", "--rate-limit", "0"]).is_err());
    }

    #[test]
    fn show_takes_city_with_spaces() {
        let cli = Cli::try_parse_from(["weather", "show", "São Paulo"]).expect("valid args");
        let Command::Show { city } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(city, "São Paulo");
    }
}
