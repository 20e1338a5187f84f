mod api;
mod commands;
mod gateway;

use anyhow::Context as _;
use api::ApiState;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zapbot_channels::{BridgeChannel, CloudChannel};
use zapbot_core::{
    config::{self, shellexpand, Config},
    context::Context,
    traits::{Channel, Provider},
};
use zapbot_providers::OpenAiProvider;
use zapbot_stats::StatsEngine;

#[derive(Parser)]
#[command(
    name = "zapbot",
    version,
    about = "WhatsApp group bot: AI answers, group statistics and chat commands"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot: channels, HTTP API and statistics.
    Start,
    /// Check configuration, provider and channel readiness.
    Status,
    /// Send a one-shot question to the AI provider.
    Ask {
        /// The question to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Print a statistics report from the stored snapshots.
    Stats {
        /// Group id, e.g. 120363000000000000@g.us.
        group_id: String,
        /// geral, ranking, atividade or palavras.
        #[arg(default_value = "geral")]
        kind: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    let log_dir = matches!(cli.command, Commands::Start)
        .then(|| PathBuf::from(shellexpand(&cfg.bot.data_dir)).join("logs"));
    let _log_guard = init_tracing(&cfg.bot.log_level, log_dir)?;

    match cli.command {
        Commands::Start => start(cfg).await?,
        Commands::Status => status(&cli.config, &cfg).await?,
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: zapbot ask <message>");
            }

            let provider = build_provider(&cfg);
            if !provider.is_available().await {
                anyhow::bail!(
                    "provider '{}' is not available. Is OPENAI_API_KEY set?",
                    provider.name()
                );
            }

            let response = provider.complete(&Context::new(&message.join(" "))).await?;
            println!("{}", response.text);
        }
        Commands::Stats { group_id, kind } => {
            let stats = StatsEngine::open(&cfg.stats).await;
            let report = match kind.to_lowercase().as_str() {
                "geral" => stats.general_report(&group_id),
                "ranking" => stats.ranking_report(&group_id),
                "atividade" => stats.activity_report(&group_id),
                "palavras" => stats.word_report(&group_id),
                other => anyhow::bail!(
                    "unknown report '{other}', expected geral, ranking, atividade or palavras"
                ),
            };
            println!("{report}");
        }
    }

    Ok(())
}

/// Console logging, plus a daily-rolling file under `log_dir` when given.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str, log_dir: Option<PathBuf>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, "zapbot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn start(cfg: Config) -> anyhow::Result<()> {
    let provider = build_provider(&cfg);
    if !provider.is_available().await {
        anyhow::bail!("provider '{}' is not available", provider.name());
    }

    let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
    let mut api_state = ApiState::default();

    if let Some(cloud) = cfg.channel.cloud.as_ref().filter(|c| c.enabled) {
        if cloud.token.is_empty() || cloud.phone_number_id.is_empty() {
            anyhow::bail!(
                "Cloud API is enabled but token or phone_number_id is empty. \
                 Set them in config.toml or WHATSAPP_TOKEN / PHONE_NUMBER_ID env vars."
            );
        }
        let channel = Arc::new(CloudChannel::new(cloud.clone()));
        channels.insert("cloud".to_string(), channel.clone());
        api_state.cloud = Some(channel);
    }

    if let Some(bridge) = cfg.channel.bridge.as_ref().filter(|b| b.enabled) {
        if bridge.callback_url.is_empty() {
            anyhow::bail!(
                "Bridge is enabled but callback_url is empty. \
                 Set it in config.toml or BRIDGE_CALLBACK_URL env var."
            );
        }
        let channel = Arc::new(BridgeChannel::new(bridge.clone()));
        channels.insert("bridge".to_string(), channel.clone());
        api_state.bridge = Some(channel);
    }

    if channels.is_empty() {
        anyhow::bail!("No channels enabled. Enable at least one channel in config.toml.");
    }

    let stats = StatsEngine::open(&cfg.stats).await;

    println!("zapbot: starting...");
    let gw = Arc::new(gateway::Gateway::new(
        Arc::from(provider),
        channels,
        stats,
        &cfg,
        api_state,
    ));
    gw.run().await
}

async fn status(config_path: &str, cfg: &Config) -> anyhow::Result<()> {
    println!("zapbot: status check\n");
    println!("Config: {config_path}");
    println!("Stats dir: {}", shellexpand(&cfg.stats.data_dir));
    println!(
        "Limits: {} msgs / {}s per user, max {} chars",
        cfg.limits.rate_limit_max, cfg.limits.rate_limit_window_secs, cfg.limits.max_message_length
    );
    println!();

    let provider = build_provider(cfg);
    println!(
        "  {} ({}): {}",
        provider.name(),
        cfg.provider.openai.model,
        if provider.is_available().await {
            "available"
        } else {
            "unavailable"
        }
    );

    match &cfg.channel.cloud {
        Some(c) => println!(
            "  cloud: {}",
            if c.enabled && !c.token.is_empty() && !c.phone_number_id.is_empty() {
                "configured"
            } else if c.enabled {
                "enabled but missing token or phone_number_id"
            } else {
                "disabled"
            }
        ),
        None => println!("  cloud: not configured"),
    }
    match &cfg.channel.bridge {
        Some(b) => println!(
            "  bridge: {}",
            if b.enabled && !b.callback_url.is_empty() {
                "configured"
            } else if b.enabled {
                "enabled but missing callback_url"
            } else {
                "disabled"
            }
        ),
        None => println!("  bridge: not configured"),
    }
    println!();

    let stats = StatsEngine::open(&cfg.stats).await;
    println!("Groups with statistics: {}", stats.group_count());
    for id in stats.group_ids() {
        if let Some(g) = stats.snapshot(&id) {
            println!("  {id} ({}): {} msgs", g.group_name, g.total_messages);
        }
    }
    Ok(())
}

/// Build the configured provider.
fn build_provider(cfg: &Config) -> Box<dyn Provider> {
    Box::new(OpenAiProvider::from_config(&cfg.provider.openai))
}
