//! Summarization prompt.

use memory_core::Turn;

use crate::ChatMessage;

/// System instruction for thread summarization. The model must answer with a single JSON
/// object `{"summary": "...", "facts": ["..."]}` with 1 to [`MAX_SUMMARY_FACTS`] facts.
pub const SUMMARY_INSTRUCTION: &str = "\
You are a conversation summarization assistant. Your job is to analyze conversation threads \
and extract the most relevant and important information.

For the given conversation thread, you must:
1. Create a concise summary of the thread that captures the main topics and outcomes
2. Identify 1 to 4 key facts - these are short, important concepts or relationships (3-6 words each)
3. Format your response as a JSON object with the following structure:

    {
    \"summary\": \"A concise paragraph summarizing the conversation\",
    \"facts\": [\"fact 1\", \"fact 2\", \"fact 3\"]
    }

Focus on actionable information, decisions made, important context, and key relationships \
between entities.";

/// Upper bound on facts the instruction asks for.
pub const MAX_SUMMARY_FACTS: usize = 4;

/// Prefix of the user message that carries the transcript.
pub const SUMMARY_REQUEST_PREFIX: &str = "Summarize this conversation thread:\n\n";

/// Pretty-printed JSON transcript (two-space indent) of `turns`, token counts omitted.
pub fn format_transcript(turns: &[Turn]) -> Result<String, serde_json::Error> {
    let stripped: Vec<Turn> = turns.iter().map(Turn::stripped).collect();
    serde_json::to_string_pretty(&stripped)
}

/// User message body: [`SUMMARY_REQUEST_PREFIX`] followed by the transcript.
pub fn summary_request(turns: &[Turn]) -> Result<String, serde_json::Error> {
    Ok(format!("{}{}", SUMMARY_REQUEST_PREFIX, format_transcript(turns)?))
}

/// `[system: SUMMARY_INSTRUCTION, user: summary_request(turns)]`.
pub fn summary_messages(turns: &[Turn]) -> Result<Vec<ChatMessage>, serde_json::Error> {
    Ok(vec![
        ChatMessage::system(SUMMARY_INSTRUCTION),
        ChatMessage::user(summary_request(turns)?),
    ])
}
