use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use cityweather_core::{
    Advisor, AggregationResult, Aggregator, Config, Credential, FixedDelay, NoDelay, ProviderId,
    RateLimiter, RunStatus, UnitSelection, client_from_config,
};
use inquire::{Password, PasswordDisplayMode, Select};

use crate::{advice, table};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather for a list of cities")]
pub struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and default units in the config file.
    Configure,

    /// Show current weather for one or more locations.
    Show(FetchArgs),

    /// Show current weather, then an AI condition summary and advisories.
    ///
    /// Uses OpenAI when OPENAI_API_KEY is set, then a local Ollama, then
    /// Ollama cloud when OLLAMA_API_KEY is set. Falls back to sample text.
    Advise {
        #[command(flatten)]
        fetch: FetchArgs,

        /// Comma-separated use cases, e.g. "running, travel".
        #[arg(long, default_value = "")]
        use_case: String,
    },

    /// Print the config file location.
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Location names; defaults to the configured list (ten US cities).
    pub locations: Vec<String>,

    /// f (imperial), m (metric) or s (scientific).
    #[arg(short, long)]
    pub units: Option<UnitSelection>,

    /// Use built-in sample data instead of calling the API.
    #[arg(long)]
    pub sample: bool,

    /// Pause between requests, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show(fetch) => show(fetch).await,
            Command::Advise { fetch, use_case } => advise(fetch, &use_case).await,
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let has_key = cfg.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
    let prompt = if has_key {
        "Weatherstack API key (leave empty to keep the current one):"
    } else {
        "Weatherstack API key:"
    };

    let api_key = Password::new(prompt)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    if !api_key.trim().is_empty() {
        cfg.set_api_key(api_key.trim().to_string());
    } else if !has_key {
        return Err(anyhow!("An API key is required. Get one at https://weatherstack.com/"));
    }

    let current = cfg.unit_selection().unwrap_or_default();
    let cursor = UnitSelection::all().iter().position(|u| *u == current).unwrap_or(0);
    let units = Select::new("Default units:", UnitSelection::all().to_vec())
        .with_starting_cursor(cursor)
        .prompt()
        .context("Failed to read unit selection")?;
    cfg.units = Some(units.to_string());

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

/// Load config, pick provider and limiter, and run one aggregation.
async fn fetch(args: FetchArgs) -> anyhow::Result<(AggregationResult, ProviderId)> {
    let FetchArgs { locations, units, sample, delay_ms } = args;
    let cfg = Config::load()?;

    let provider = if sample { ProviderId::Sample } else { cfg.provider_id()? };
    let selection = match units {
        Some(u) => u,
        None => cfg.unit_selection()?,
    };
    let locations = if locations.is_empty() { cfg.locations() } else { locations };

    // The sample provider ignores the key, but the aggregator still insists on one.
    let credential = if provider.is_remote() {
        cfg.credential()
    } else {
        Some(Credential::new(ProviderId::Sample.as_str()))
    };

    let limiter: Box<dyn RateLimiter> = if provider.is_remote() {
        let delay = delay_ms.map(Duration::from_millis).unwrap_or_else(|| cfg.delay());
        Box::new(FixedDelay::new(delay))
    } else {
        Box::new(NoDelay)
    };

    let aggregator = Aggregator::new(client_from_config(provider, &cfg)?, limiter);
    let result = aggregator.run(&locations, selection, credential.as_ref()).await;

    Ok((result, provider))
}

/// Print the table and status lines. A failed run becomes an error.
fn report(result: &AggregationResult, provider: ProviderId) -> anyhow::Result<()> {
    print!("{}", table::render(result));

    if result.status == RunStatus::Failed {
        for failure in &result.failures {
            eprintln!("  - {failure}");
        }
        return Err(anyhow!(result.summary()));
    }

    if !result.records.is_empty() {
        println!();
    }
    println!("{}", result.summary());
    if !provider.is_remote() {
        println!("(sample data, API skipped)");
    }
    if !result.failures.is_empty() {
        println!("{} location(s) failed:", result.failures.len());
        for failure in &result.failures {
            println!("  - {failure}");
        }
    }

    Ok(())
}

async fn show(args: FetchArgs) -> anyhow::Result<()> {
    let (result, provider) = fetch(args).await?;
    report(&result, provider)
}

async fn advise(args: FetchArgs, use_case: &str) -> anyhow::Result<()> {
    let (result, provider) = fetch(args).await?;
    report(&result, provider)?;

    let advisor = Advisor::from_env()?;
    let insights = advisor.advise(&result.records, &result.units, use_case).await?;

    println!();
    print!("{}", advice::render(&insights));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_parses_locations_and_units() {
        let cli = Cli::parse_from(["cityweather", "show", "Boston", "San Jose", "--units", "m"]);

        match cli.command {
            Command::Show(FetchArgs { locations, units, sample, delay_ms }) => {
                assert_eq!(locations, vec!["Boston".to_string(), "San Jose".to_string()]);
                assert_eq!(units, Some(UnitSelection::Metric));
                assert!(!sample);
                assert_eq!(delay_ms, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_rejects_unknown_units() {
        let err = Cli::try_parse_from(["cityweather", "show", "--units", "kelvin"]).unwrap_err();
        assert!(err.to_string().contains("Unknown unit selection"));
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["cityweather", "show", "--sample", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Show(FetchArgs { sample: true, .. })));
    }

    #[test]
    fn advise_takes_use_cases_and_fetch_flags() {
        let cli = Cli::parse_from([
            "cityweather",
            "advise",
            "Boston",
            "--sample",
            "--use-case",
            "running, travel",
        ]);

        match cli.command {
            Command::Advise { fetch, use_case } => {
                assert_eq!(fetch.locations, vec!["Boston".to_string()]);
                assert!(fetch.sample);
                assert_eq!(use_case, "running, travel");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn advise_use_case_defaults_to_empty() {
        let cli = Cli::parse_from(["cityweather", "advise"]);
        assert!(matches!(cli.command, Command::Advise { ref use_case, .. } if use_case.is_empty()));
    }
}
