//! Command line tool for the Davis WeatherLink v2 API.
//!
//! Credentials come from `--key`/`--secret`, the `WEATHERLINK_API_KEY` /
//! `WEATHERLINK_API_SECRET` environment variables, or a `.weatherlinkrc` file.
//! Responses are printed as pretty JSON, e.g.
//!
//! ```text
//! weatherlink stations | jq -r '.stations[].station_id'
//! weatherlink current --station 123 | jq -r '.sensors[].data[].wind_dir'
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use weatherlink::{Client, Endpoint};

#[derive(Parser, Debug)]
#[command(name = "weatherlink", version)]
#[command(about = "Command line tool for the Davis WeatherLink v2 API")]
struct Cli {
    /// API key
    #[arg(long, global = true)]
    key: Option<String>,

    /// API secret
    #[arg(long, global = true)]
    secret: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    /// Display verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stations
    Stations {
        /// Station ids (comma separated); all stations when omitted
        #[arg(long = "id", value_delimiter = ',')]
        ids: Vec<u64>,
    },
    /// Display sensor data
    Sensors {
        /// Sensor ids (comma separated); all sensors when omitted
        #[arg(long = "id", value_delimiter = ',')]
        ids: Vec<u64>,
    },
    /// Current weather
    Current {
        /// Numeric station id
        #[arg(long)]
        station: u64,
    },
    /// Historic weather
    ///
    /// Provide a start and end time in RFC3339 format with a span no greater than 24 hours.
    Historic {
        /// Numeric station id
        #[arg(long)]
        station: u64,
        /// Start time (RFC3339)
        #[arg(long)]
        start: DateTime<Utc>,
        /// End time (RFC3339)
        #[arg(long)]
        end: DateTime<Utc>,
    },
    /// Download the sensor catalog
    SensorCatalog {
        /// Path to save the catalog to
        #[arg(long, default_value = "./sensor-catalog.json")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    let verify = if cli.insecure { Some(false) } else { None };
    let client = Client::load(cli.key, cli.secret, verify)
        .context("failed to configure WeatherLink client")?
        .with_progress(true);

    run(&client, cli.command)
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(client: &Client, command: Command) -> Result<()> {
    let endpoint = match command {
        Command::Stations { ids } => Endpoint::Stations(ids),
        Command::Sensors { ids } => Endpoint::Sensors(ids),
        Command::Current { station } => Endpoint::Current(station),
        Command::Historic {
            station,
            start,
            end,
        } => Endpoint::Historic {
            station,
            start,
            end,
        },
        Command::SensorCatalog { path } => {
            let saved = client
                .sensor_catalog(&path)
                .with_context(|| format!("failed to save sensor catalog to {}", path.display()))?;
            println!("{}", saved.display());
            return Ok(());
        }
    };

    let value = client.fetch_json(&endpoint)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
