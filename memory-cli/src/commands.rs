//! Command dispatch. Results are printed to stdout as pretty JSON.

use anyhow::{Context, Result};
use memory::{ConversationMemory, MemoryConfig, MemoryFilter, SearchOptions};
use serde::Serialize;

use crate::chat::run_chat;
use crate::cli::{Cli, Commands};

/// Loads config, connects and runs one command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = MemoryConfig::from_env().context(
        "Load config from .env (AZURE_COSMOS_DB_*, AZURE_OPENAI_* variables)",
    )?;
    let memory = ConversationMemory::from_config(&config).context("Connect to memory services")?;

    match cli.command {
        Commands::Chat {
            user,
            thread,
            history,
        } => {
            run_chat(
                &memory,
                config.llm.system_prompt.as_deref(),
                user,
                thread,
                history,
            )
            .await
        }
        Commands::Recent {
            k,
            user,
            thread,
            details,
        } => {
            let filter = filter(user, thread);
            print_json(&memory.recent(k, &filter, details).await?)
        }
        Commands::Search {
            query,
            k,
            user,
            thread,
            details,
            score,
        } => {
            let options = SearchOptions {
                detailed: details,
                with_score: score,
            };
            print_json(&memory.search(&query, k, &filter(user, thread), options).await?)
        }
        Commands::Thread { id, details } => {
            print_json(&memory.all_for_thread(&id, details).await?)
        }
        Commands::User { id, details } => print_json(&memory.all_for_user(&id, details).await?),
        Commands::Get { id } => match memory.get(&id).await? {
            Some(doc) => print_json(&doc),
            None => anyhow::bail!("No document with id {}", id),
        },
        Commands::Summary { thread, details } => match memory.summary(&thread, details).await? {
            Some(summary) => print_json(&summary),
            None => anyhow::bail!("No summary for thread {}", thread),
        },
        Commands::Summarize { thread, write } => {
            let summary = memory
                .summarize_thread(&thread, write)
                .await
                .with_context(|| format!("Summarize thread {}", thread))?;
            print_json(&summary)
        }
        Commands::Delete { id } => {
            memory.delete(&id).await?;
            println!("Deleted {}", id);
            Ok(())
        }
    }
}

fn filter(user: Option<String>, thread: Option<String>) -> MemoryFilter {
    MemoryFilter {
        user_id: user,
        thread_id: thread,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
