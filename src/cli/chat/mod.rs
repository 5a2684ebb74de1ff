//! Chat command - interactive conversation loop on a single thread

use std::io::{self, BufRead, Write};

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::ThreadId;
use crate::infrastructure::logging;

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Conversation thread to resume or start
    #[arg(long, default_value = "default")]
    pub thread: String,
}

/// Run the interactive chat loop
pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let engine = crate::create_engine(&config).await?;
    let thread = ThreadId::new(args.thread)?;

    info!("Chat started on thread '{}'", thread);
    println!("Patient-care assistant. Type 'exit' to quit.");

    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let outcome = engine.process_turn(&thread, line).await?;
        for reply in &outcome.replies {
            println!("assistant> {}", reply);
        }
    }

    Ok(())
}
