//! arbiter - an automated Magic: The Gathering judge
//!
//! Interactive rules assistant that drives a deterministic rules engine and a
//! card-search service through a tool-augmented reasoning loop.

mod agent;
mod config;
mod engine;
mod llm;
mod prompt;
mod search;
mod tools;
mod transcript;

use agent::{Agent, Session, TurnEvent};
use config::Config;
use engine::Judge;
use llm::{LlmService, LoggingService, OpenAiService};
use search::{CardSearch, LibrarianClient, UnconfiguredSearch};
use std::io::Write as _;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tools::{
    ApplyActionTool, CheckBoardStateTool, SearchCardsTool, ToolRegistry, ValidateMoveTool,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays clean for the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arbiter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(OpenAiService::new(
        config.api_key.clone(),
        config.model.clone(),
        &config.base_url,
        config.llm_timeout,
    ))));

    let judge = Arc::new(Judge::new());

    let librarian: Arc<dyn CardSearch> = match &config.librarian_url {
        Some(url) => Arc::new(LibrarianClient::new(url, config.tool_timeout)),
        None => {
            tracing::warn!("LIBRARIAN_URL not set; card search will report itself unavailable");
            Arc::new(UnconfiguredSearch)
        }
    };

    let mut registry = ToolRegistry::new(config.tool_timeout);
    registry.register(Arc::new(ValidateMoveTool::new(judge.clone())));
    registry.register(Arc::new(CheckBoardStateTool::new(judge.clone())));
    registry.register(Arc::new(ApplyActionTool::new(judge.clone())));
    registry.register(Arc::new(SearchCardsTool::new(librarian)));

    let agent = Agent::new(
        llm,
        Arc::new(registry),
        prompt::SYSTEM_PROMPT,
        config.max_tool_cycles,
    );

    tracing::info!(model = %config.model, max_tool_cycles = config.max_tool_cycles, "judge ready");
    println!("The Judge is in session. Describe your play or paste a game state JSON.");
    println!("Type q, quit, or exit to leave.");

    repl(agent).await
}

/// Line-oriented read loop. Each non-empty line is one turn; a failed turn is
/// reported and the session keeps going.
async fn repl(agent: Agent) -> Result<(), Box<dyn std::error::Error>> {
    use tokio::io::AsyncBufReadExt;

    let mut session = Session::new();
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("User: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "q" | "quit" | "exit") {
            println!("Court is adjourned.");
            break;
        }

        run_one_turn(&agent, &mut session, input).await;
    }

    if !session.transcript().is_empty() {
        tracing::info!(
            session = %session.id(),
            messages = session.transcript().len(),
            "session closed"
        );
    }

    Ok(())
}

/// Drives a single turn, printing tool activity as it happens. Ctrl-C during
/// the turn cancels it without ending the session.
async fn run_one_turn(agent: &Agent, session: &mut Session, input: &str) {
    let cancel = CancellationToken::new();
    let mut events = agent.subscribe();

    let turn = agent.run_turn(session, input, &cancel);
    tokio::pin!(turn);

    let result = loop {
        tokio::select! {
            result = &mut turn => break result,
            event = events.recv() => {
                if let Ok(event) = event {
                    print_event(&event);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("[cancelling turn]");
                cancel.cancel();
            }
        }
    };

    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }

    match result {
        Ok(answer) => println!("Judge: {answer}"),
        Err(e) => println!("[turn failed] {e}"),
    }
}

fn print_event(event: &TurnEvent) {
    match event {
        TurnEvent::ToolInvoked { name, arguments } => {
            println!("  [consulting {name}] {arguments}");
        }
        TurnEvent::ToolSettled { name, ok } => {
            if *ok {
                println!("  [{name} answered]");
            } else {
                println!("  [{name} failed]");
            }
        }
    }
}
