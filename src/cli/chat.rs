use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::init_tracing;
use crate::client::models::{ChatState, Route, lock};
use crate::client::surface::TerminalSurface;
use crate::client::timestamp::{TimestampKey, format_timestamp, now_ms};
use crate::client::{
    ChatError, ClientConfig, HttpBackend, Navigator, Orchestrator, RevealEngine, RevealState,
};

/// Prints where the web client would navigate to.
#[derive(Default)]
struct TerminalNavigator {
    signed_out: AtomicBool,
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        match route {
            Route::Home => println!("Started a new conversation"),
            Route::Chat(id) => eprintln!("Conversation {}", id),
            Route::NotFound => println!("Conversation not found"),
            Route::Login => {
                println!("Session expired. Create a new one with `iguana user --email <EMAIL>`");
                self.signed_out.store(true, Ordering::SeqCst);
            }
        }
    }
}

const HELP: &str = "/regen  reveal the last response again
/retry  send the last failed prompt again
/history  list conversations
/open ID  open a conversation
/new  start a new conversation
/clear  delete all conversations
/quit  exit
Ctrl-C while a response is printing stops it";

pub async fn run(chat_id: Option<String>) -> Result<()> {
    init_tracing(&format!("{}=warn", env!("CARGO_CRATE_NAME")));

    let config = ClientConfig::default();
    let backend = Arc::new(HttpBackend::new(&config)?);
    if !backend.has_session() {
        return Err(anyhow!(
            "Missing env var IGUANA_SESSION_TOKEN. Create one with `iguana user --email <EMAIL>`"
        ));
    }

    let navigator = Arc::new(TerminalNavigator::default());
    let surface = Arc::new(TerminalSurface::new());
    let chat = ChatState::shared();
    let engine = RevealEngine::new(chat.clone(), &surface, config.reveal_period);
    let mut orchestrator = Orchestrator::new(backend, navigator.clone(), chat, engine);

    let user = orchestrator.restore_session().await?;
    println!(
        "Logged in as {}. Type /help for commands.",
        user.name.as_deref().unwrap_or(&user.email)
    );

    if let Some(chat_id) = chat_id {
        open_conversation(&mut orchestrator, &chat_id).await;
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        if navigator.signed_out.load(Ordering::SeqCst) {
            break;
        }

        let line = match rl.readline(">>> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/help", _) => println!("{}", HELP),
            ("/new", _) => orchestrator.new_chat(),
            ("/clear", _) => report(orchestrator.clear_all().await),
            ("/history", _) => match orchestrator.refresh_history().await {
                Ok(()) => print_history(&orchestrator),
                Err(err) => println!("Error: {}", err),
            },
            ("/open", id) if !id.trim().is_empty() => {
                open_conversation(&mut orchestrator, id.trim()).await;
            }
            ("/regen", _) => {
                if orchestrator.regenerate() {
                    wait_for_reveal(&mut orchestrator).await;
                } else {
                    println!("Nothing to regenerate");
                }
            }
            ("/retry", _) => {
                let result = orchestrator.retry().await;
                finish_submit(&mut orchestrator, result).await;
            }
            _ => {
                let result = orchestrator.submit(line).await;
                finish_submit(&mut orchestrator, result).await;
            }
        }
    }

    orchestrator.stop();
    Ok(())
}

async fn finish_submit(orchestrator: &mut Orchestrator, result: Result<String, ChatError>) {
    match result {
        Ok(_) => wait_for_reveal(orchestrator).await,
        Err(err) if err.is_retryable() => println!("Error: {}. Type /retry to try again", err),
        // Navigation already told the user what happened
        Err(ChatError::AuthExpired | ChatError::NotFound) => {}
        Err(err) => println!("Error: {}", err),
    }
}

// Blocks the prompt until the reveal is done or Ctrl-C stops it
async fn wait_for_reveal(orchestrator: &mut Orchestrator) {
    let mut reveal = orchestrator.watch_reveal();
    tokio::select! {
        _ = reveal.wait_for(|state| *state != RevealState::Revealing) => {}
        _ = tokio::signal::ctrl_c() => {
            orchestrator.stop();
            println!("[stopped]");
        }
    }
}

async fn open_conversation(orchestrator: &mut Orchestrator, chat_id: &str) {
    match orchestrator.open(chat_id).await {
        Ok(()) => print_conversation(orchestrator),
        Err(ChatError::AuthExpired | ChatError::NotFound) => {}
        Err(err) => println!("Error: {}", err),
    }
}

fn report(result: Result<(), ChatError>) {
    if let Err(err) = result {
        println!("Error: {}", err);
    }
}

fn print_history(orchestrator: &Orchestrator) {
    let now = now_ms();
    let chat = lock(orchestrator.chat());
    if chat.history.is_empty() {
        println!("No conversations yet");
    }
    for entry in chat.history.iter() {
        println!(
            "{} {}  {}  ({})",
            if entry.active { "*" } else { " " },
            entry.chat_id,
            entry.prompt.trim(),
            format_timestamp(Some(TimestampKey::Text(&entry.chat_id)), now)
        );
    }
}

fn print_conversation(orchestrator: &Orchestrator) {
    let now = now_ms();
    let chat = lock(orchestrator.chat());
    for message in chat.messages.iter() {
        println!(
            "[{}] >>> {}\n{}\n",
            format_timestamp(Some(message.id.timestamp_key()), now),
            message.prompt,
            message.content
        );
    }
}
