mod config;
mod console;

use careline_core::{Clock, SystemClock};
use careline_handoff::{ActionOutcome, ChatController};
use careline_relay::{HttpBotResponder, HttpSessionService};
use careline_session::{ChatStateStore, FileStorage, SavedMode};
use clap::{Parser, Subcommand};
use config::CarelineConfig;
use console::{format_message, format_notice, resolve_action, Input, HELP};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "careline", about = "CareLine support chat console")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "careline.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat {
        /// Authenticated user id (overrides config and CARELINE_USER_ID)
        #[arg(long)]
        user: Option<String>,
    },
    /// Show the stored conversation
    Status,
    /// Delete the stored conversation
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with the transcript.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CarelineConfig::load(&cli.config).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let storage = Arc::new(FileStorage::new(config.state_dir()).await?);
    let store = ChatStateStore::new(storage, clock.clone(), config.handoff.storage_key.clone())
        .with_ttl(config.handoff.snapshot_ttl());

    match cli.command {
        Commands::Chat { user } => {
            let user_id = user.or_else(|| config.user_id.clone());
            run_chat(config, store, clock, user_id).await?;
        }
        Commands::Status => match store.load().await {
            Some(snapshot) => {
                let mode = match &snapshot.mode {
                    SavedMode::Bot => "assistant".to_string(),
                    SavedMode::Connecting => "connecting".to_string(),
                    SavedMode::Agent {
                        session_id,
                        agent_name,
                    } => format!("agent {agent_name} (session {session_id})"),
                };
                println!("Mode: {mode}");
                println!("Messages: {}", snapshot.messages.len());
                for message in &snapshot.messages {
                    println!("{}", format_message(message));
                }
            }
            None => println!("No stored conversation."),
        },
        Commands::Reset => {
            store.clear().await?;
            println!("Stored conversation deleted.");
        }
    }

    Ok(())
}

async fn run_chat(
    config: CarelineConfig,
    store: ChatStateStore,
    clock: Arc<dyn Clock>,
    user_id: Option<String>,
) -> anyhow::Result<()> {
    let sessions = Arc::new(HttpSessionService::new(&config.relay)?);
    let bot = Arc::new(HttpBotResponder::new(&config.bot)?);

    info!(authenticated = user_id.is_some(), "Starting chat");
    let mut chat = ChatController::mount(config.handoff, sessions, bot, store, clock, user_id).await;

    println!("CareLine support chat. Type /help for commands.");
    let mut shown = 0;
    render(&mut chat, &mut shown);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Input::parse(&line) {
                    Input::Say(text) => chat.send_message(&text).await,
                    Input::Agent => chat.request_agent().await,
                    Input::End => chat.end_session().await,
                    Input::Action(arg) => match resolve_action(&arg, &chat.messages()) {
                        Some(action) => {
                            if let ActionOutcome::Navigate(route) = chat.dispatch_action(action).await {
                                println!("  -> open {route}");
                            }
                        }
                        None => println!("  No quick-action matches '{arg}'."),
                    },
                    Input::Login(user) => {
                        chat.set_user(Some(user));
                        println!("  Logged in.");
                    }
                    Input::Logout => {
                        chat.set_user(None);
                        println!("  Logged out.");
                    }
                    Input::Clear => {
                        chat.clear_history().await;
                        shown = 0;
                    }
                    Input::Help => println!("{HELP}"),
                    Input::Quit => break,
                    Input::Unknown(cmd) => println!("  Unknown command '{cmd}'. Type /help."),
                }
            }
            event = chat.next_poll_event() => {
                chat.apply_poll_event(event).await;
            }
        }
        render(&mut chat, &mut shown);
    }

    chat.shutdown();
    Ok(())
}

/// Print messages added since the last call, then pending notices.
fn render(chat: &mut ChatController, shown: &mut usize) {
    let messages = chat.messages();
    for message in messages.iter().skip(*shown) {
        println!("{}", format_message(message));
    }
    *shown = messages.len();
    for notice in chat.drain_notices() {
        println!("{}", format_notice(&notice));
    }
}
