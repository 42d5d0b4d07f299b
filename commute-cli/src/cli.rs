use anyhow::Context;
use clap::{Parser, Subcommand};
use commute_core::{CommuteAdvisor, CommuteRequest, Config, Coordinate, Departure};
use inquire::{CustomType, Text};

use crate::report;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "commute", version, about = "Weather-aware departure advice")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score departures around a planned trip and suggest the best one.
    Advise {
        /// Home location as LAT,LON.
        #[arg(long, allow_hyphen_values = true)]
        home: Coordinate,

        /// Office location as LAT,LON.
        #[arg(long, allow_hyphen_values = true)]
        office: Coordinate,

        /// Planned departure (ISO 8601) or "leave now"; if absent, means now.
        #[arg(long)]
        at: Option<Departure>,

        /// Expected trip duration in minutes (currently informational).
        #[arg(long, default_value_t = commute_core::model::DEFAULT_DURATION_MINUTES)]
        duration: u32,

        /// Print the raw JSON response instead of a report.
        #[arg(long)]
        json: bool,
    },

    /// Interactively edit provider, timeout and cache settings.
    Configure,

    /// Print the effective configuration.
    Config,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Advise { home, office, at, duration, json } => {
                let config = Config::load()?;
                let advisor = CommuteAdvisor::from_config(&config)?;

                let request = CommuteRequest::new(home, office)
                    .departing(at.unwrap_or_default())
                    .with_duration(duration);

                let recommendation = advisor.advise(&request).await?;

                if json {
                    let out = serde_json::to_string_pretty(&recommendation)
                        .context("Failed to serialize recommendation")?;
                    println!("{out}");
                } else {
                    print!("{}", report::Report(&recommendation));
                }
            }
            Command::Configure => configure()?,
            Command::Config => {
                let config = Config::load()?;
                println!("# {}", Config::config_file_path()?.display());
                print!("{}", config.to_toml_string()?);
            }
        }

        Ok(())
    }
}

fn configure() -> anyhow::Result<()> {
    let current = Config::load()?;

    let weather_url = Text::new("Forecast endpoint:")
        .with_default(&current.weather_url)
        .prompt()?;
    let air_quality_url = Text::new("Air-quality endpoint:")
        .with_default(&current.air_quality_url)
        .prompt()?;
    let request_timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(current.request_timeout_secs)
        .prompt()?;
    let retry_attempts = CustomType::<u32>::new("Retries after a failed request:")
        .with_default(current.retry_attempts)
        .prompt()?;
    let cache_ttl_secs = CustomType::<u64>::new("Forecast cache lifetime (seconds):")
        .with_default(current.cache_ttl_secs)
        .prompt()?;

    let updated = Config {
        weather_url,
        air_quality_url,
        request_timeout_secs,
        retry_attempts,
        cache_ttl_secs,
        ..current
    };
    updated.validate()?;
    updated.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
