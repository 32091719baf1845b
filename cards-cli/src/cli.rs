use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use cards_core::{
    App, Config, Entity, FetchGateway, FileStore, HttpGateway, KeyValueStore, RatesPayload,
    Registry, StoreError,
};
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use tracing::{debug, warn};

use crate::display;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cards", version, about = "Weather forecast and exchange-rate cards")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to an alternative configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every tracked entity and show its card.
    Show {
        /// Print cards as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Track a new currency base or forecast city and show its card.
    Add {
        /// Currency code, or WOEID with `--forecast`. Prompts when omitted.
        key: Option<String>,

        /// Treat KEY as a forecast location id.
        #[arg(long)]
        forecast: bool,

        /// Display name for a forecast location.
        #[arg(long, requires = "forecast")]
        label: Option<String>,
    },

    /// Stop tracking an entity.
    Remove {
        key: String,
    },

    /// List tracked entities without fetching anything.
    List,

    /// Show cards and refresh them periodically until interrupted.
    Watch {
        /// Seconds between refreshes.
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },

    /// Interactively set endpoints and timeout.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from_path(path)?,
            None => Config::load()?,
        };
        debug!(?config, "loaded config");

        match self.command {
            Command::Configure => configure(config, self.config.as_deref()),
            Command::List => {
                let registry = Registry::load(open_store(&config)?);
                display::print_entities(registry.entities());
                Ok(())
            }
            Command::Show { json } => {
                let mut app = build_app(&config)?;
                app.start().await;
                if json {
                    display::print_json(app.state())
                } else {
                    display::print_cards(app.state());
                    Ok(())
                }
            }
            Command::Add {
                key,
                forecast,
                label,
            } => {
                let mut app = build_app(&config)?;
                let entity = match (key, forecast) {
                    (Some(key), true) => Entity::forecast(key, label),
                    (None, true) => bail!("A forecast location needs a KEY (its WOEID)."),
                    (Some(key), false) => Entity::rates(key.to_uppercase()),
                    (None, false) => {
                        let known = RatesPayload::known_currencies();
                        let available: Vec<String> = known
                            .into_iter()
                            .filter(|code| !app.registry().contains(code))
                            .collect();
                        if available.is_empty() {
                            bail!("Every known currency is already tracked.");
                        }
                        let code = Select::new("Currency to add:", available)
                            .prompt()
                            .context("Currency selection cancelled")?;
                        Entity::rates(code)
                    }
                };

                let key = entity.key.clone();
                app.add_and_refresh(entity)
                    .await
                    .context("Failed to save tracked entities")?;
                if !display::print_card(app.state(), &key) {
                    println!("No data for {key} right now; showing fallback data.");
                    display::print_cards(app.state());
                }
                Ok(())
            }
            Command::Remove { key } => {
                let mut app = build_app(&config)?;
                if app.remove(&key).context("Failed to save tracked entities")? {
                    println!("Stopped tracking {key}.");
                } else {
                    println!("{key} is not tracked.");
                }
                Ok(())
            }
            Command::Watch { interval } => {
                let mut app = build_app(&config)?;
                app.start().await;
                display::print_cards(app.state());

                let period = Duration::from_secs(interval.max(1));
                watch(&mut app, period, interrupted()).await;
                Ok(())
            }
        }
    }
}

/// Refreshes and reprints every `period` until `shutdown` resolves. Shutdown
/// also cuts short a refresh that is still waiting on the network.
async fn watch<G, S>(app: &mut App<G, S>, period: Duration, shutdown: impl Future<Output = ()>)
where
    G: FetchGateway,
    S: KeyValueStore,
{
    tokio::pin!(shutdown);
    loop {
        let refreshed = tokio::select! {
            _ = &mut shutdown => None,
            report = async {
                tokio::time::sleep(period).await;
                app.refresh_all().await
            } => Some(report),
        };
        let Some(report) = refreshed else {
            debug!("watch interrupted");
            break;
        };
        debug!(?report, "refreshed");
        println!();
        display::print_cards(app.state());
    }
}

/// Resolves on Ctrl-C. Without a usable signal handler it never resolves.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn build_app(config: &Config) -> anyhow::Result<App<HttpGateway, FileStore>> {
    let gateway = HttpGateway::from_config(config).context("Failed to build HTTP client")?;
    let registry = Registry::load(open_store(config)?);
    Ok(App::new(gateway, registry))
}

/// Opens the store file. A corrupt file is treated as empty and replaced on
/// the next write.
fn open_store(config: &Config) -> anyhow::Result<FileStore> {
    let path = config.resolved_store_path()?;
    match FileStore::open(&path) {
        Ok(store) => Ok(store),
        Err(err @ StoreError::Corrupt { .. }) => {
            warn!(error = %err, "ignoring corrupt store file");
            Ok(FileStore::fresh(path))
        }
        Err(err) => Err(err.into()),
    }
}

fn configure(current: Config, path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let forecast_base_url = Text::new("Forecast API base URL:")
        .with_default(&current.forecast_base_url)
        .prompt()?;
    let rates_base_url = Text::new("Exchange-rate API base URL:")
        .with_default(&current.rates_base_url)
        .prompt()?;
    let timeout = Text::new("Request timeout in seconds (0 = none):")
        .with_default(&current.request_timeout_secs.to_string())
        .prompt()?;
    let request_timeout_secs = timeout
        .trim()
        .parse()
        .with_context(|| format!("Not a number of seconds: {timeout}"))?;

    let config = Config {
        forecast_base_url,
        rates_base_url,
        request_timeout_secs,
        ..current
    };

    let saved_to = match path {
        Some(path) => {
            config.save_to_path(path)?;
            path.to_path_buf()
        }
        None => config.save()?,
    };
    println!("Saved configuration to {}", saved_to.display());
    Ok(())
}
