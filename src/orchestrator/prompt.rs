use super::turn::ConversationContext;

pub const SYSTEM_PROMPT: &str = "You are a warm, empathetic journaling companion. \
Listen closely, reflect the user's feelings back to them, and ask at most one gentle \
follow-up question. Keep replies to two or three short sentences because they will be \
spoken aloud. Never diagnose or lecture.";

/// Build the system prompt, adding the topics discussed so far when there are any
pub fn build_system_prompt(context: &ConversationContext) -> String {
    if context.recent_topics.is_empty() {
        return SYSTEM_PROMPT.to_string();
    }

    let topics = context
        .recent_topics
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{}\n\nContext from this conversation: the user has recently talked about {}. \
Use this context to personalize your reply and refer back to it when it fits naturally.",
        SYSTEM_PROMPT, topics
    )
}
