//! Finch - agent preview for a finance workspace
//!
//! Thin terminal surface over the chat orchestration core: one-shot prompt
//! mode, or a minimal interactive loop with `/new`, `/cancel` and `/quit`.

use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use finch::chat::{ChatService, ChatStatus, ChatStore, MessageRole, StoreError};
use finch::config::{Settings, API_TOKEN_VAR};
use finch::transport::SseTransport;
use finch::view::{AgentIdentity, AppPage, ViewCoordinator};
use finch::EnvTokenProvider;

/// Finch - P&L dashboard plus chat agent preview
#[derive(Parser, Debug)]
#[command(name = "finch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Send a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Chat backend base URL (overrides FINCH_API_URL)
    #[arg(long, env = "FINCH_API_URL")]
    api_url: Option<String>,

    /// Print the dashboard dataset as JSON and exit
    #[arg(long)]
    dashboard: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long)]
    debug: bool,

    /// Enable verbose logging (equivalent to RUST_LOG=trace)
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if args.dashboard {
        let data = finch::DashboardData::sample();
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let settings = Settings::with_api_url(args.api_url.clone());
    let transport = Arc::new(SseTransport::new(settings.api_url.clone())?);
    let auth = Arc::new(EnvTokenProvider::new(API_TOKEN_VAR));
    let store = Arc::new(ChatStore::new());
    let service = Arc::new(ChatService::new(store, auth, transport));
    let mut coordinator = ViewCoordinator::new(
        service,
        AgentIdentity {
            name: "Finance Agent".into(),
            description: Some("Ask about metrics & drivers".into()),
            logo: None,
        },
    );
    coordinator.show(AppPage::Chat);

    if let Some(prompt) = args.prompt {
        send_and_print(&coordinator, &prompt, None).await;
        return Ok(());
    }

    run_repl(&coordinator).await
}

type StdinLines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

/// Minimal interactive loop.
async fn run_repl(coordinator: &ViewCoordinator) -> anyhow::Result<()> {
    println!(
        "{} - {}",
        coordinator.agent().name,
        coordinator
            .agent()
            .description
            .as_deref()
            .unwrap_or("chat agent")
    );
    println!("Commands: /new  /cancel  /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => {}
            "/quit" | "/q" => break,
            "/new" => {
                coordinator.new_chat().await;
                println!("(new conversation)");
            }
            "/cancel" => coordinator.cancel_stream().await,
            text => send_and_print(coordinator, text, Some(&mut lines)).await,
        }
    }
    Ok(())
}

/// Send one message and print the streamed reply until it settles.
///
/// With `input` present, a `/cancel` line typed mid-stream aborts the reply.
async fn send_and_print(
    coordinator: &ViewCoordinator,
    text: &str,
    mut input: Option<&mut StdinLines>,
) {
    // Subscribe first so no snapshot from this send is missed.
    let mut rx = coordinator.store().subscribe();

    if let Err(e) = coordinator.send_message(text, vec![]).await {
        eprintln!("{e}");
        return;
    }

    let mut printed = 0usize;
    loop {
        let recv = match &mut input {
            Some(lines) => {
                tokio::select! {
                    recv = rx.recv() => recv,
                    line = lines.next_line() => {
                        if matches!(line, Ok(Some(ref l)) if l.trim() == "/cancel") {
                            coordinator.cancel_stream().await;
                        }
                        continue;
                    }
                }
            }
            None => rx.recv().await,
        };
        let state = match recv {
            Ok(state) => state,
            Err(StoreError::Lagged(_)) => coordinator.store().snapshot(),
            Err(StoreError::Closed) => return,
        };

        if let Some(msg) = state
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
        {
            if msg.content.len() > printed {
                print!("{}", &msg.content[printed..]);
                let _ = std::io::stdout().flush();
                printed = msg.content.len();
            }
        }

        match state.status {
            ChatStatus::Idle => {
                println!();
                return;
            }
            ChatStatus::Error => {
                match &state.error {
                    Some(error) => eprintln!("\nerror: {error}"),
                    None => eprintln!("\nerror"),
                }
                coordinator.clear_error();
                return;
            }
            ChatStatus::Sending | ChatStatus::Streaming => {}
        }
    }
}
