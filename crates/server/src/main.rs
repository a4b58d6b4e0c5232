//! Intake Bot entry point

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use intake_bot_agent::EngineConfig;
use intake_bot_config::{load_settings, BotMode, Settings};
use intake_bot_server::{
    build_capabilities, build_dispatcher, create_router, init_metrics, register_commands,
    run_polling, AppState,
};
use intake_bot_transport::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Priority: env vars > config/{env}.toml > config/default.toml > defaults
    let env = std::env::var("INTAKE_BOT_ENV").ok();
    let config = load_settings(env.as_deref())?;

    init_tracing(&config);

    tracing::info!("Starting Intake Bot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        mode = ?config.bot.mode,
        "Configuration loaded"
    );

    let metrics_handle = init_metrics()?;

    let telegram = Arc::new(TelegramClient::new(&config.bot.api_base, &config.bot.token));
    let caps = build_capabilities(&config, telegram.clone()).await?;
    let engine_config = EngineConfig::from_settings(&config);
    if engine_config.operator_chat.is_none() {
        tracing::warn!("No operator chat configured, lead notifications are disabled");
    }
    let dispatcher = Arc::new(build_dispatcher(caps, engine_config));

    if let Err(e) = register_commands(&telegram).await {
        tracing::warn!(error = %e, "Failed to register bot commands");
    }

    let state = AppState::new(dispatcher.clone(), telegram.clone())
        .with_webhook_secret(config.bot.webhook_secret.clone())
        .with_metrics(metrics_handle);

    // health and metrics are served in both modes
    let app = create_router(state, &config.bot.webhook_path);
    let polling = match config.bot.mode {
        BotMode::Polling => Some(tokio::spawn(run_polling(
            telegram,
            dispatcher,
            config.bot.poll_timeout_secs,
            shutdown_signal(),
        ))),
        BotMode::Webhook => None,
    };

    serve(&config, app).await?;
    if let Some(polling) = polling {
        polling.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn serve(config: &Settings, app: axum::Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("intake_bot={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
