//! Interactive chat loop over a local buffer that is written to the store on exit.

use anyhow::Result;
use llm_client::CompletionOptions;
use memory::{ConversationMemory, LocalBuffer, Message, ThreadKey};
use prompt::DEFAULT_CHAT_SYSTEM_MESSAGE;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

/// Role recorded for model replies.
pub const AGENT_ROLE: &str = "agent";

/// `quit`, `exit`, `bye` and `q` (any case) end the session.
pub fn is_exit_command(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "quit" | "exit" | "bye" | "q"
    )
}

/// System message for chat: `LLM_SYSTEM_PROMPT` when configured, else the default.
pub fn chat_system_message(configured: Option<&str>) -> &str {
    configured
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_CHAT_SYSTEM_MESSAGE)
}

/// Runs the loop until an exit command or end of input, then flushes the buffer.
pub async fn run_chat(
    memory: &ConversationMemory,
    system_prompt: Option<&str>,
    user: Option<String>,
    thread: Option<String>,
    history: usize,
) -> Result<()> {
    let system_message = chat_system_message(system_prompt);
    let user_id = user.unwrap_or_else(|| {
        let id = Uuid::new_v4().to_string();
        println!("Generated user id: {}", id);
        id
    });
    let thread_id = thread.unwrap_or_else(|| {
        let id = Uuid::new_v4().to_string();
        println!("Generated thread id: {}", id);
        id
    });
    let key = ThreadKey::new(user_id, thread_id)?;

    let summary = match memory.summary(key.thread_id(), false).await {
        Ok(Some(s)) => {
            println!("Loaded previous conversation summary.");
            Some(s.summary)
        }
        Ok(None) => {
            println!("Starting a new conversation.");
            None
        }
        Err(e) => {
            warn!(error = %e, "could not load thread summary");
            None
        }
    };
    println!("Type 'quit', 'exit' or 'bye' to end.\n");

    let llm = memory.llm();
    let mut buffer = LocalBuffer::new();
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if is_exit_command(input) {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let messages = prompt::chat_messages(
            Some(system_message),
            summary.as_deref(),
            buffer.peek(&key, Some(history)),
            input,
        );
        match llm.complete(messages, &CompletionOptions::default()).await {
            Ok(reply) => {
                println!("\nAssistant: {}\n", reply);
                buffer.push(&key, vec![Message::user(input), Message::new(AGENT_ROLE, reply)])?;
            }
            Err(e) => {
                warn!(error = %e, "chat completion failed");
                println!("\nError: {:#}. Try again or type 'quit' to exit.\n", e);
            }
        }
    }

    println!("Saving conversation...");
    let report = memory.flush(&mut buffer, &key).await;
    info!(
        user_id = %key.user_id(),
        thread_id = %key.thread_id(),
        persisted = report.persisted,
        failed = report.failed.len(),
        "step: chat session saved"
    );
    if report.failed.is_empty() {
        println!("Saved {} turn(s).", report.persisted);
    } else {
        println!(
            "Saved {} turn(s); {} failed (see log).",
            report.persisted,
            report.failed.len()
        );
    }
    Ok(())
}
