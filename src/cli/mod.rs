use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod init;
pub mod job;
pub mod migrate;
pub mod serve;
pub mod user;

use job::JobId;

#[derive(Subcommand)]
enum Command {
    /// Create the database
    Init {
        #[arg(long, action, default_value = "false")]
        db: bool,
    },
    /// Migrate the db schema
    Migrate {
        #[arg(long, action, default_value = "false")]
        db: bool,
    },
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "5000")]
        port: String,
    },
    /// Create a user if needed and print a new session token
    User {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Start an interactive chat against a running server
    Chat {
        /// Continue an existing conversation
        #[arg(long)]
        chat_id: Option<String>,
    },
    /// Run a periodic job
    Job {
        #[arg(long, value_enum)]
        id: JobId,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Init { db }) => {
            init::run(db).await?;
        }
        Some(Command::Migrate { db }) => {
            migrate::run(db).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::User { email, name }) => {
            user::run(&email, name.as_deref()).await?;
        }
        Some(Command::Chat { chat_id }) => {
            chat::run(chat_id).await?;
        }
        Some(Command::Job { id }) => {
            job::run(id).await?;
        }
        None => {}
    }

    Ok(())
}
