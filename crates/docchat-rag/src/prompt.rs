//! Prompt construction

use docchat_core::{ChatMessage, Prompt, Snippet, SYSTEM_PROMPT};

/// Render retrieved snippets as one text block, in retrieval order.
///
/// Snippet text is copied verbatim after its header line.
pub fn render_context(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "[{}] (source: {}, score: {:.3})\n{}",
                i + 1,
                s.source.display(),
                s.score,
                s.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Text of the user turn: context block, blank line, then the question
pub fn user_content(context: &str, message: &str) -> String {
    format!("Context: {context}\n\nUsers questions: {message}")
}

/// Build the two-message prompt sent to the completer
pub fn build_prompt(snippets: &[Snippet], message: &str) -> Prompt {
    let context = render_context(snippets);
    Prompt::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_content(&context, message)),
    ])
}
