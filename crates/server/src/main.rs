mod bootstrap;
mod health;

use anyhow::Result;
use scout_core::config::{AppConfig, LoadOptions};
use scout_telegram::BotRunner;
use tracing::{info, warn};

fn init_logging(config: &AppConfig) {
    use scout_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::for_bot())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    if app.config.server.health_enabled {
        health::spawn(
            &app.config.server.bind_address,
            app.config.server.health_check_port,
            app.health_state(),
        )
        .await?;
    }

    let bot_username = match BotRunner::fetch_username(&app.bot).await {
        Ok(username) => Some(username),
        Err(error) => {
            warn!(
                event_name = "system.server.bot_identity_unknown",
                correlation_id = "bootstrap",
                error = %error,
                "could not fetch bot username; accepting commands addressed to any bot"
            );
            None
        }
    };

    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bot_username = bot_username.as_deref().unwrap_or("unknown"),
        "scout-bot started"
    );

    BotRunner::new(app.bot.clone(), app.bot_state(bot_username)).run(wait_for_shutdown()).await;

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        active_runs = app.runner.active_runs(),
        "scout-bot stopping"
    );

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => info!(event_name = "system.signal", signal = "SIGTERM"),
                _ = sigint.recv() => info!(event_name = "system.signal", signal = "SIGINT"),
            }
        }
        (Err(error), _) | (_, Err(error)) => {
            warn!(
                event_name = "system.signal.unavailable",
                error = %error,
                "could not register unix signal handlers, waiting for ctrl-c"
            );
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(event_name = "system.signal.unavailable", error = %error, "ctrl-c listener failed");
    }
}
