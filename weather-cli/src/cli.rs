use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use weather_core::{
    Comparison, Config, CurrentConditions, HistoryCache, JsonFileStore, Lookup, ProviderId, Units,
    UnitsSetting, WatchlistStore, WeatherAlert, WeatherService,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show current weather and a daily forecast for a location.
    Show {
        /// Location name, e.g. "London".
        location: String,
    },

    /// List recently searched locations, most recent first.
    History {
        /// Forget all recent searches.
        #[arg(long)]
        clear: bool,
    },

    /// Manage the watchlist.
    Watch {
        #[command(subcommand)]
        action: WatchAction,
    },

    /// Compare current weather side by side; defaults to the watchlist.
    Compare {
        /// Locations to compare instead of the watchlist.
        locations: Vec<String>,
    },

    /// Show or switch the display units.
    Units {
        /// Switch between metric and imperial.
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum WatchAction {
    /// Add a location to the watchlist.
    Add { location: String },
    /// Remove a location from the watchlist.
    Remove { location: String },
    /// List watched locations.
    List,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure { provider } => configure(&mut config, &provider)?,
            Command::Show { location } => {
                let service = WeatherService::from_config(&config)?;
                let lookup = service.fetch_current_and_forecast(&location).await?;
                print_lookup(&lookup, service.units().get());
            }
            Command::History { clear } => {
                let history = HistoryCache::load(state_store()?, config.history_limit)?;
                if clear {
                    history.clear()?;
                    println!("History cleared.");
                } else if history.recent().is_empty() {
                    println!("No recent searches.");
                } else {
                    for (i, location) in history.recent().iter().enumerate() {
                        println!("{:>2}. {location}", i + 1);
                    }
                }
            }
            Command::Watch { action } => {
                let watchlist = WatchlistStore::load(state_store()?)?;
                match action {
                    WatchAction::Add { location } => {
                        if watchlist.add(&location)? {
                            println!("{} added to watchlist.", location.trim());
                        } else {
                            println!("{} is already on the watchlist.", location.trim());
                        }
                    }
                    WatchAction::Remove { location } => {
                        if watchlist.remove(&location)? {
                            println!("{} removed from watchlist.", location.trim());
                        } else {
                            println!("{} is not on the watchlist.", location.trim());
                        }
                    }
                    WatchAction::List => {
                        let watched = watchlist.list();
                        if watched.is_empty() {
                            println!("Your watchlist is empty.");
                        }
                        for location in watched {
                            println!("- {location}");
                        }
                    }
                }
            }
            Command::Compare { locations } => {
                let service = WeatherService::from_config(&config)?;
                let results = if locations.is_empty() {
                    if service.watchlist().list().is_empty() {
                        println!("Your watchlist is empty.");
                        return Ok(());
                    }
                    service.compare_watchlist().await
                } else {
                    service.compare(locations.as_slice()).await
                };
                print_comparison(&results, service.units().get());
            }
            Command::Units { toggle } => {
                let setting = UnitsSetting::new(config.units);
                if toggle {
                    config.units = setting.toggle();
                    config.save()?;
                }
                let units = setting.get();
                println!(
                    "Units: {units} ({}, {})",
                    units.temperature_label(),
                    units.speed_label()
                );
            }
        }

        Ok(())
    }
}

fn state_store() -> anyhow::Result<Arc<JsonFileStore>> {
    Ok(Arc::new(JsonFileStore::new(Config::state_dir()?)))
}

fn configure(config: &mut Config, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key);

    let make_default = config.default_provider_id().ok() != Some(id)
        && inquire::Confirm::new(&format!("Use {id} as the default provider?"))
            .with_default(true)
            .prompt()
            .context("Failed to read answer")?;
    if make_default {
        config.set_default_provider(id);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn temperature(current: f64, native: Units, display: Units) -> String {
    format!(
        "{:.1}{}",
        display.convert_temperature(current, native),
        display.temperature_label()
    )
}

fn print_lookup(lookup: &Lookup, units: Units) {
    let current = &lookup.current;

    if current.country.is_empty() {
        println!("{}", current.location_name);
    } else {
        println!("{}, {}", current.location_name, current.country);
    }
    println!(
        "  {}  {}",
        temperature(current.temperature, current.native_units, units),
        current.condition
    );
    println!(
        "  Humidity: {}%  Wind: {:.1} {}  Pressure: {} hPa  Clouds: {}%",
        current.humidity_pct,
        units.convert_speed(current.wind_speed, current.native_units),
        units.speed_label(),
        current.pressure_hpa,
        current.cloud_pct
    );

    if let Some(alert) = lookup.alert {
        println!("  {}", describe_alert(alert, current, units));
    }

    match &lookup.forecast {
        Ok(days) if days.is_empty() => {}
        Ok(days) => {
            println!();
            println!("Forecast:");
            for day in days {
                println!(
                    "  {}  {:>8}  {}",
                    day.date,
                    temperature(day.temperature, day.native_units, units),
                    day.condition
                );
            }
        }
        Err(e) => eprintln!("warning: could not load forecast: {e}"),
    }

    if let Some(e) = &lookup.history_error {
        eprintln!("warning: {e}");
    }
}

fn describe_alert(alert: WeatherAlert, current: &CurrentConditions, units: Units) -> String {
    match alert {
        WeatherAlert::Heat(t) => {
            format!("Hot weather alert: {}", temperature(t, current.native_units, units))
        }
        WeatherAlert::Cold(t) => {
            format!("Cold weather alert: {}", temperature(t, current.native_units, units))
        }
        WeatherAlert::Storm => "Storm alert".to_string(),
    }
}

fn print_comparison(results: &[Comparison], units: Units) {
    for entry in results {
        match &entry.result {
            Ok(current) => println!(
                "{:<20} {:>8}  {}",
                current.location_name,
                temperature(current.temperature, current.native_units, units),
                current.condition
            ),
            Err(e) => println!("{:<20} error: {e}", entry.location),
        }
    }
}
