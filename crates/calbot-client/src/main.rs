//! calbot CLI entry point.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;

use calbot_client::cli::{Cli, Command};
use calbot_client::error::ClientResult;
use calbot_client::{BackendClient, commands, run_chat};
use calbot_core::{TracingConfig, init_tracing};
use calbot_protocol::{CreateEventRequest, EventDetailsQuery};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let client = BackendClient::new(&cli.backend_url, Duration::from_secs(cli.timeout))?;

    let output = match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let stdin = BufReader::new(tokio::io::stdin());
            return run_chat(&client, stdin, &mut std::io::stdout()).await;
        }
        Command::Availability { range, slot_minutes } => {
            commands::availability(&client, &range.join(" "), slot_minutes, cli.json).await?
        }
        Command::Events { range, start, end } => {
            let query = match (range, start, end) {
                (Some(range), _, _) => EventDetailsQuery::range(range),
                (None, Some(start), Some(end)) => EventDetailsQuery::between(start, end),
                _ => EventDetailsQuery::default(),
            };
            commands::events(&client, query, cli.json).await?
        }
        Command::Book {
            title,
            start,
            duration,
            description,
        } => {
            let mut request = CreateEventRequest::new(title, start, duration);
            request.description = description;
            commands::book(&client, request, cli.json).await?
        }
        Command::Ask { prompt } => commands::ask(&client, &prompt.join(" "), cli.json).await?,
        Command::Health => commands::health(&client).await?,
    };

    println!("{output}");
    Ok(())
}
