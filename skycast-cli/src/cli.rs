use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Select, Text};
use skycast_core::{
    CachedLocation, Config, Coordinate, FixedLocation, LocationSource, NoGeolocation,
    OpenWeatherClient, UnitSystem, WeatherController, WeatherOrchestrator, WeatherSnapshot,
};
use std::sync::Arc;

use crate::{repl, terminal};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Current weather in your terminal")]
pub struct Cli {
    /// Defaults to `interactive` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure API key, default units and default place.
    Configure,

    /// Show current weather for a place name.
    Show {
        /// City or place name.
        place: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show current weather for a coordinate.
    At {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Interactive session: search, toggle units, use current location.
    Interactive {
        /// Device latitude; overrides the configured home position.
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Device longitude; overrides the configured home position.
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
    },
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Unit system: metric or imperial. Defaults to the configured one.
    #[arg(long)]
    units: Option<UnitSystem>,

    /// Print the snapshot as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Interactive {
            lat: None,
            lon: None,
        }) {
            Command::Configure => configure(),
            Command::Show { place, output } => {
                let config = Config::load()?;
                let orchestrator = build_orchestrator(&config, output.units)?;
                let snapshot = orchestrator
                    .load_by_name(&place)
                    .await
                    .map_err(|e| anyhow!(e.user_message()))?;
                print_snapshot(&snapshot, output.json)
            }
            Command::At { lat, lon, output } => {
                let config = Config::load()?;
                let orchestrator = build_orchestrator(&config, output.units)?;
                let unit = orchestrator.active_unit();
                let snapshot = orchestrator
                    .load_by_coordinate(Coordinate::new(lat, lon), unit, None)
                    .await
                    .map_err(|e| anyhow!(e.user_message()))?;
                print_snapshot(&snapshot, output.json)
            }
            Command::Interactive { lat, lon } => {
                let config = Config::load()?;
                let orchestrator = Arc::new(build_orchestrator(&config, None)?);
                let device = match (lat, lon) {
                    (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
                    _ => config.home,
                };
                let location = location_source(device);

                let mut controller = WeatherController::new(
                    orchestrator,
                    location,
                    terminal::TerminalPresenter::default(),
                );
                repl::run(&mut controller).await
            }
        }
    }
}

fn build_orchestrator(
    config: &Config,
    units: Option<UnitSystem>,
) -> anyhow::Result<WeatherOrchestrator> {
    let client = Arc::new(OpenWeatherClient::from_config(config)?);
    let mut config = config.clone();
    if let Some(units) = units {
        config.units = units;
    }
    tracing::debug!(
        units = %config.units,
        default_place = %config.default_place,
        "Building orchestrator"
    );
    Ok(WeatherOrchestrator::new(client.clone(), client).with_config(&config))
}

fn location_source(device: Option<Coordinate>) -> Arc<dyn LocationSource> {
    match device {
        Some(coordinate) => Arc::new(CachedLocation::new(FixedLocation(coordinate))),
        None => Arc::new(NoGeolocation),
    }
}

fn print_snapshot(snapshot: &WeatherSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
        println!("{out}");
    } else {
        print!("{}", terminal::render_snapshot(snapshot));
    }
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = Text::new("OpenWeatherMap API key:")
        .with_default(config.api_key.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    let units = Select::new("Default units:", vec![UnitSystem::Metric, UnitSystem::Imperial])
        .with_starting_cursor(match config.units {
            UnitSystem::Metric => 0,
            UnitSystem::Imperial => 1,
        })
        .prompt()
        .context("Failed to read units")?;

    let default_place = Text::new("Place to show when location is unavailable:")
        .with_default(&config.default_place)
        .prompt()
        .context("Failed to read default place")?;

    config.api_key = Some(api_key.to_string());
    config.units = units;
    if !default_place.trim().is_empty() {
        config.default_place = default_place.trim().to_string();
    }
    config.save_to(&path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}
