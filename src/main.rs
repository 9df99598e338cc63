use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use hn_feed::api::{HnClient, HnQuery, Story};
use hn_feed::cli::{Cli, Commands, ConfigArgs, ConfigCommands, ConfigFormat, OutputFormat};
use hn_feed::feed::FeedLoader;
use hn_feed::settings::{self, Settings};
use hn_feed::stream::{self, StorySink, StreamOptions};
use hn_feed::{logging, output};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = settings::config_dir(cli.config_dir.as_ref());

    if let Some(Commands::Config(config_args)) = &cli.command {
        return handle_config_command(config_args, config_dir.as_deref());
    }

    let _log_guard = config_dir.as_deref().and_then(|dir| {
        match logging::init(dir, cli.verbose) {
            Ok(guard) => {
                if cli.verbose {
                    eprintln!("Logging to {}", settings::log_path(dir).display());
                }
                Some(guard)
            }
            Err(e) => {
                eprintln!("Logging disabled: {e:#}");
                None
            }
        }
    });

    let settings = effective_settings(&cli, config_dir.as_deref())?;
    run_feed(&cli, &settings).await
}

fn load_settings(config_dir: Option<&Path>) -> Settings {
    config_dir
        .map(|dir| {
            let path = settings::settings_path(dir);
            Settings::load(&path).unwrap_or_else(|e| {
                eprintln!("Warning: {:#}", e);
                Settings::default()
            })
        })
        .unwrap_or_default()
}

fn effective_settings(cli: &Cli, config_dir: Option<&Path>) -> Result<Settings> {
    let mut settings = load_settings(config_dir);
    if let Some(increment) = cli.increment {
        settings.feed.increment = increment;
    }
    if let Some(batch_size) = cli.batch_size {
        settings.feed.batch_size = batch_size;
    }
    settings.validate().context("Invalid command line overrides")?;
    Ok(settings)
}

fn handle_config_command(args: &ConfigArgs, config_dir: Option<&Path>) -> Result<()> {
    match &args.command {
        ConfigCommands::Path => match config_dir {
            Some(dir) => println!("{}", settings::settings_path(dir).display()),
            None => eprintln!("Could not determine config directory"),
        },
        ConfigCommands::Init { force } => {
            let dir = config_dir.context("Could not determine config directory")?;
            let path = settings::settings_path(dir);
            Settings::init(&path, *force)?;
            println!("Wrote {}", path.display());
        }
        ConfigCommands::Show { format } => {
            let settings = match config_dir {
                Some(dir) => Settings::load(&settings::settings_path(dir))?,
                None => Settings::default(),
            };
            match format {
                ConfigFormat::Toml => {
                    let toml = toml::to_string_pretty(&settings)
                        .context("Failed to serialize settings")?;
                    println!("{}", toml);
                }
                ConfigFormat::Json => {
                    let json = serde_json::to_string_pretty(&settings)
                        .context("Failed to serialize settings to JSON")?;
                    println!("{}", json);
                }
            }
        }
    }
    Ok(())
}

/// Prints stories to stdout, reporting retries on stderr.
struct StdoutSink {
    format: OutputFormat,
}

impl StorySink<Story> for StdoutSink {
    fn emit(&mut self, stories: &[Story], first_rank: usize) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Text => {
                output::render_text(stories, first_rank, Utc::now().timestamp())
            }
            OutputFormat::Json => {
                output::render_json(stories, first_rank).context("Failed to serialize stories")?
            }
        };
        println!("{}", rendered);
        Ok(())
    }

    fn retrying(&mut self, message: &str) {
        eprintln!("{message} Retrying...");
    }
}

async fn run_feed(cli: &Cli, settings: &Settings) -> Result<()> {
    let client = HnClient::with_endpoints(
        settings.api.base_url.as_str(),
        settings.api.search_url.as_str(),
        settings.timeout(),
    );
    let mut query = HnQuery::new(cli.feed);
    if let Some(term) = &cli.search {
        query = query.with_search(term.as_str());
    }
    tracing::info!(query = %query.label(), pacing = ?settings.pacing(), "starting feed");

    let mut loader = FeedLoader::new(client, settings.pacing());
    let mut sink = StdoutSink { format: cli.format };
    let options = StreamOptions {
        limit: cli.limit,
        retries: cli.retries,
    };
    let result = stream::stream_feed(&mut loader, query, options, &mut sink).await;

    for entry in &loader.tasks.log {
        tracing::debug!("{}", entry.message);
    }
    let shown = result?;
    tracing::info!(shown, "feed finished");
    if cli.verbose {
        eprintln!("{}", output::render_status(&loader.view()));
    }
    Ok(())
}
