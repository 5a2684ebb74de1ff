pub mod chat;

use clap::{Parser, Subcommand};

pub use chat::ChatArgs;

#[derive(Debug, Parser)]
#[command(name = "patientcare-assistant")]
#[command(about = "Clinical assistant dialogue orchestrator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat on a conversation thread
    Chat(ChatArgs),
}
