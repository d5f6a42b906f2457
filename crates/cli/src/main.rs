use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use spread_bot_core::{AppConfig, ConfigLoader, LoggingConfig};
use spread_bot_orchestrator::{log_summary, render_summary, CycleOrchestrator};
use spread_bot_paper::PaperBroker;
use spread_bot_scheduler::{SystemClock, TriggerRule, TriggerScheduler};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spread-bot")]
#[command(about = "Weekly put credit spread bot", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, env = "BOT_CONFIG", default_value = "config/Config.toml")]
    config: String,
    /// Overlay `<stem>.<profile>.toml` on top of the config file
    #[arg(short, long, global = true, env = "BOT_PROFILE")]
    profile: Option<String>,
    /// Build orders without submitting them
    #[arg(long, global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler daemon until SIGINT or SIGTERM
    Run,
    /// Run a single cycle now and print the execution summary
    Once {
        /// Symbols to trade instead of the configured list (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        symbols: Vec<String>,
    },
    /// Print the next trigger instant
    NextTrigger {
        /// Reference instant in RFC 3339 (defaults to now)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Run => {
            run_daemon(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Once { symbols } => run_once(&config, symbols).await,
        Commands::NextTrigger { from, json } => {
            let rule = TriggerRule::from_config(&config.schedule)?;
            let now = from.unwrap_or_else(Utc::now);
            println!("{}", describe_next_trigger(&rule, now, json)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.profile {
        Some(profile) => ConfigLoader::load_with_profile(&cli.config, profile)?,
        None => ConfigLoader::load(&cli.config)?,
    };
    if cli.dry_run {
        config.execution.dry_run = true;
    }
    Ok(config)
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr unless a
/// file path is configured.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("invalid log level '{}'", logging.level))?,
    };

    if let Some(path) = &logging.file_path {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {path}"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn build_orchestrator(config: &AppConfig) -> Result<CycleOrchestrator> {
    let broker = Arc::new(PaperBroker::new(config.paper.clone()));
    CycleOrchestrator::new(broker, config).context("failed to build cycle orchestrator")
}

async fn run_daemon(config: &AppConfig) -> Result<()> {
    let orchestrator = Arc::new(build_orchestrator(config)?);
    let rule = TriggerRule::from_config(&config.schedule)?;
    let poll_interval = Duration::from_secs(config.schedule.poll_interval_secs);

    let mut scheduler = TriggerScheduler::new(rule, orchestrator, Arc::new(SystemClock), poll_interval)?
        .with_run_on_start(config.schedule.run_on_start);
    let handle = scheduler.handle();

    info!(
        symbols = ?config.strategy.symbols,
        dry_run = config.execution.dry_run,
        next_trigger = %scheduler.state().next_trigger,
        "Starting spread bot daemon"
    );

    let task = tokio::spawn(async move {
        scheduler.run().await;
        scheduler
    });

    let signal = shutdown_signal().await;
    handle.stop();
    let scheduler = task.await.context("scheduler task failed")?;

    info!(cycles_run = scheduler.state().cycles_run, "Spread bot daemon stopped");
    signal
}

/// Waits for SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown");
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl+C")?;
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl+C")?;
        info!("Received Ctrl+C, initiating graceful shutdown");
    }

    Ok(())
}

async fn run_once(config: &AppConfig, symbols: Vec<String>) -> Result<ExitCode> {
    let orchestrator = build_orchestrator(config)?;
    let symbols = if symbols.is_empty() {
        orchestrator.symbols().to_vec()
    } else {
        symbols
    };

    let summary = orchestrator.run_cycle(&symbols).await;
    log_summary(&summary);
    print!("{}", render_summary(&summary));

    if summary.failure_count > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn describe_next_trigger(rule: &TriggerRule, now: DateTime<Utc>, json: bool) -> Result<String> {
    let next = rule.next_after(now)?;
    let local = next.with_timezone(&rule.timezone);
    let text = if json {
        serde_json::json!({
            "execution_day": rule.day.to_string(),
            "next_trigger": next.to_rfc3339(),
            "local": local.to_rfc3339(),
            "timezone": rule.timezone.to_string(),
        })
        .to_string()
    } else {
        format!(
            "Next trigger: {} ({} {})",
            next.format("%Y-%m-%d %H:%M:%S UTC"),
            local.format("%A %Y-%m-%d %H:%M"),
            rule.timezone
        )
    };
    Ok(text)
}
