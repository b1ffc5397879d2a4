use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use postrank::display;
use postrank::domain::{RatingResult, WorkItem};
use postrank::gateway::DispatchGateway;
use postrank::rating::{
    AnthropicProvider, GeminiProvider, MockProvider, MockReply, ModelRouter, RatingProvider, build_prompt,
};
use postrank::scheduler::MAX_BATCH_SIZE;
use postrank::settings::ConfigStore;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

/// Score every dry-run item gets
const DRY_RUN_SCORE: i64 = 5;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("postrank")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("postrank.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Rate { input, dry_run } => handle_rate_command(input.as_deref(), *dry_run, config).await,
        Commands::Prompt { input } => handle_prompt_command(input.as_deref(), config),
        Commands::Config => handle_config_command(config),
    }
}

/// Read JSON lines of `{"id", "text"}`, skipping empty lines and blank posts
fn read_items(input: Option<&Path>) -> Result<Vec<WorkItem>> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            fs::File::open(path).context(format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut items = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let item: WorkItem =
            serde_json::from_str(&line).context(format!("Invalid work item on line {}", index + 1))?;
        if item.is_blank() {
            warn!("Skipping post {} with empty text", item.id);
            continue;
        }
        items.push(item);
    }
    Ok(items)
}

fn build_provider(config: &Config, dry_run: bool) -> Result<Arc<dyn RatingProvider>> {
    if dry_run {
        info!("Dry run: using mock provider");
        return Ok(Arc::new(
            MockProvider::new(Vec::new()).with_fallback(MockReply::Uniform(DRY_RUN_SCORE)),
        ));
    }

    let gemini = GeminiProvider::new(config.gemini_config()).context("Failed to create Gemini provider")?;
    let anthropic =
        AnthropicProvider::new(config.anthropic_config()).context("Failed to create Anthropic provider")?;
    Ok(Arc::new(ModelRouter::new(Arc::new(gemini), Arc::new(anthropic))))
}

async fn handle_rate_command(input: Option<&Path>, dry_run: bool, config: &Config) -> Result<()> {
    let items = read_items(input)?;
    info!("Rating {} posts (dry run: {})", items.len(), dry_run);
    if items.is_empty() {
        println!("{}", "No posts to rate".yellow());
        return Ok(());
    }

    let mut rating_config = config.rating_config();
    if !rating_config.has_credential() {
        if !dry_run {
            bail!(
                "No API key configured: set {} or {}, or rating.api_key in the config file",
                config::API_KEY_ENV,
                config.provider_kind().key_env_var()
            );
        }
        rating_config.credential = "dry-run".to_string();
    }

    let provider = build_provider(config, dry_run)?;
    let gateway = DispatchGateway::new(provider, ConfigStore::new(rating_config), config.gateway_options())
        .context("Failed to start rating pipeline")?;
    let mut connection = gateway.connect();

    let mut outstanding: HashSet<String> = items.iter().map(|item| item.id.clone()).collect();
    let accepted = gateway.submit(connection.id, items);
    info!("Gateway accepted {} posts", accepted);

    while !outstanding.is_empty() {
        tokio::select! {
            batch = connection.ratings.recv() => {
                let Some(batch) = batch else {
                    bail!("Rating channel closed with {} posts outstanding", outstanding.len());
                };
                for result in batch {
                    if result.rating.is_terminal() {
                        outstanding.remove(&result.id);
                        print_result(&result, config);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted with {} posts outstanding", outstanding.len());
                println!("{} {} posts left unrated", "Interrupted:".red(), outstanding.len());
                break;
            }
        }
    }

    gateway.disconnect(connection.id);
    Ok(())
}

fn print_result(result: &RatingResult, config: &Config) {
    if display::is_hidden(&result.rating, config.display.hide_low_rank) {
        info!("Hiding {} rated {}", result.id, display::rank_label(&result.rating));
        return;
    }
    println!(
        "{}\t{}",
        result.id,
        display::paint(&result.rating, config.display.colorful_ranks)
    );
}

fn handle_prompt_command(input: Option<&Path>, config: &Config) -> Result<()> {
    let items = read_items(input)?;
    let batch: Vec<WorkItem> = items.into_iter().take(MAX_BATCH_SIZE).collect();
    if batch.is_empty() {
        println!("{}", "No posts to build a prompt from".yellow());
        return Ok(());
    }
    println!("{}", build_prompt(&batch, &config.rating.criteria));
    Ok(())
}

fn handle_config_command(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(&config.masked()).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
