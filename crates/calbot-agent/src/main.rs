//! calbot-agent entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{Level, info};

use calbot_agent::{
    Agent, AgentArgs, AgentResult, BackendTools, ConversationMemory, OpenAiReasoner, create_app,
};
use calbot_core::{SignalHandler, TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = AgentArgs::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: AgentArgs) -> AgentResult<()> {
    let mut tracing_config = TracingConfig::service().with_format(args.log_format);
    if args.debug {
        tracing_config = tracing_config.with_level(Level::DEBUG);
    }
    init_tracing(tracing_config)?;

    let config = args.resolve()?;
    let reasoner = OpenAiReasoner::new(config.openai.clone())?;
    let tools = BackendTools::new(&config.backend_url)?;
    let agent = Agent::new(Arc::new(reasoner), tools)
        .with_max_steps(config.max_steps)
        .with_memory(ConversationMemory::new(config.memory));
    info!(model = %config.openai.model, backend = %config.backend_url, "agent configured");

    let listener = TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "calbot agent listening");

    let signals = SignalHandler::new();
    signals.spawn_listener();

    axum::serve(listener, create_app(Arc::new(agent)))
        .with_graceful_shutdown(signals.shutdown().wait())
        .await?;

    info!("calbot agent stopped");
    Ok(())
}
