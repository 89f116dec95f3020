use anyhow::bail;
use clap::{Parser, Subcommand};
use skycast_core::{
    Config, Coordinate, CoordinateEvent, CurrentWeather, DailySampleSeries, FetchController,
    FetchState, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Point weather with a 5-day outlook")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional default coordinate.
    Configure,

    /// Show weather for a coordinate. Both values are decimal strings to
    /// 6 places, exactly as the map picker hands them over.
    Show {
        /// Latitude, e.g. "39.933400".
        lat: Option<String>,
        /// Longitude, e.g. "32.859700".
        lon: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon } => show(lat, lon).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key);

    let wants_default = inquire::Confirm::new("Set a default coordinate?")
        .with_default(false)
        .prompt()?;
    if wants_default {
        let lat = inquire::Text::new("Latitude:")
            .with_placeholder("39.933400")
            .prompt()?;
        let lon = inquire::Text::new("Longitude:")
            .with_placeholder("32.859700")
            .prompt()?;
        let event = CoordinateEvent { lat, lon };
        match event.coordinate() {
            Some(coordinate) => config.set_default_coordinate(coordinate),
            None => bail!("Coordinates must be decimal numbers in range, e.g. 39.933400 32.859700."),
        }
    }

    config.save()?;
    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(lat: Option<String>, lon: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let controller = FetchController::new(provider);

    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            let event = CoordinateEvent { lat, lon };
            if event.coordinate().is_none() {
                bail!(
                    "Coordinates must be decimal numbers in range.\n\
                     Hint: `skycast show 39.933400 32.859700`."
                );
            }
            controller.handle_map_event(&event).await;
        }
        (None, None) => {
            let coordinate = config.default_coordinate().unwrap_or(Coordinate::ANKARA);
            controller.request_fetch(coordinate).await;
        }
        _ => bail!("Either give both LAT and LON, or neither."),
    }

    match controller.state() {
        FetchState::Succeeded(current, series) => {
            print_weather(&current, &series);
            Ok(())
        }
        FetchState::Failed(err) => bail!("{err}"),
        _ => bail!("fetch did not settle"),
    }
}

fn print_weather(current: &CurrentWeather, series: &DailySampleSeries) {
    println!(
        "{}  {:.0}°C  {}",
        current.location_name, current.temperature_c, current.condition_text
    );
    println!("({})", current.coordinate);
    println!();

    println!("5-day outlook:");
    for sample in series.samples() {
        let day = sample
            .local_time()
            .map(|t| t.format("%a %d %b %H:%M").to_string())
            .unwrap_or_else(|| "-".to_owned());
        println!("  {day}  {:>4.0}°C  {}", sample.temperature_c, sample.condition_text);
    }

    println!();
    println!("updated {}", chrono::Local::now().format("%H:%M"));
}
