//! calbot-backend entry point.

use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{Level, info};

use calbot_core::{SignalHandler, TracingConfig, init_tracing};
use calbot_server::{
    AgentClient, AppState, BackendArgs, ServerError, ServerResult, connect_store, create_app,
};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    let args = BackendArgs::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: BackendArgs) -> ServerResult<()> {
    let mut tracing_config = TracingConfig::service().with_format(args.log_format);
    if args.debug {
        tracing_config = tracing_config.with_level(Level::DEBUG);
    }
    init_tracing(tracing_config)?;

    let config = args.resolve()?;
    let store = connect_store(&config.store).await?;
    let agent = AgentClient::new(&config.agent_url, config.agent_timeout)?;
    info!(agent = %agent.run_url(), "agent relay configured");

    let app = create_app(AppState::new(store, agent), config.request_timeout);

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|e| ServerError::bind(config.bind.to_string(), e))?;
    info!(addr = %config.bind, "calbot backend listening");

    let signals = SignalHandler::new();
    signals.spawn_listener();

    axum::serve(listener, app)
        .with_graceful_shutdown(signals.shutdown().wait())
        .await?;

    info!("calbot backend stopped");
    Ok(())
}
