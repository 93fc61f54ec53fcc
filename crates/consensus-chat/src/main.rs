use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use consensus_chat::agents::AgentFactory;
use consensus_chat::config::{check_endpoint, ChatConfig};
use consensus_chat::render::ProgressPrinter;
use coordination::{AgentDirectory, ChatSession};

/// Ask several personas the same question until a judge says they agree.
#[derive(Parser, Debug)]
#[command(name = "consensus-chat", version)]
struct Cli {
    /// Prompt to debate. Reads prompts from stdin when omitted.
    prompt: Option<String>,

    /// TOML config file ([endpoint], [debate], [[agents]]).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the round cap.
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Print the final conversation as JSON on exit.
    #[arg(long)]
    json: bool,

    /// Probe the endpoint and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ChatConfig::load(cli.config.as_deref())?;
    if let Some(max_rounds) = cli.max_rounds {
        config.debate.max_rounds = max_rounds;
    }
    info!(
        url = %config.endpoint.url,
        judge = %config.endpoint.judge_model,
        agents = config.directory.len(),
        max_rounds = config.debate.max_rounds,
        "Consensus chat starting"
    );

    if cli.check {
        let url = &config.endpoint.url;
        if check_endpoint(url, config.endpoint.api_key.as_deref()).await {
            println!("Endpoint reachable: {url}");
            return Ok(());
        }
        bail!("Endpoint unreachable: {url}");
    }

    let factory = AgentFactory::new(&config)?;
    let session = factory.build_session();

    match cli.prompt {
        Some(prompt) => run_prompt(&session, &config.directory, &prompt).await?,
        None => interactive(&session, &config.directory).await?,
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&*session.snapshot())?);
    }
    Ok(())
}

/// Submit one prompt, printing progress as the store publishes it.
async fn run_prompt(session: &ChatSession, directory: &AgentDirectory, prompt: &str) -> Result<()> {
    let mut rx = session.subscribe();
    let mut printer = ProgressPrinter::new();
    let mut stdout = std::io::stdout();

    let submit = session.submit(prompt);
    tokio::pin!(submit);

    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome?,
            Ok(()) = rx.changed() => {
                let snapshot = rx.borrow_and_update().clone();
                printer.advance(&snapshot, directory, &mut stdout)?;
            }
        }
    };
    printer.advance(&session.snapshot(), directory, &mut stdout)?;

    info!(turn = %outcome.turn_id, status = %outcome.status, "Debate complete");
    Ok(())
}

async fn interactive(session: &ChatSession, directory: &AgentDirectory) -> Result<()> {
    println!("Consensus chat. /clear resets the conversation, /quit exits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("Conversation cleared.");
            }
            prompt => run_prompt(session, directory, prompt).await?,
        }
    }
    Ok(())
}
