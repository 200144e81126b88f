//! Local replies used when the completion service is unavailable.
//!
//! Rules are checked in order; the first that matches wins. Context rules
//! come first so a returning user hears about what they said earlier.

use super::turn::ConversationContext;
use crate::heuristics::Topic;

const GREETING_WORDS: &[&str] = &["hello", "hey", "good morning", "good evening"];
const GRATITUDE_WORDS: &[&str] = &["thank", "grateful", "appreciate"];
const SAD_WORDS: &[&str] = &["sad", "down", "upset", "lonely"];
const HAPPY_WORDS: &[&str] = &["happy", "great", "good", "excited"];

pub const STRESS_COPING_REPLY: &str = "It's really good that you're looking for ways to feel \
better. Managing stress takes time, so be patient with yourself. What has helped you the most \
so far?";

pub const WORK_CHECK_IN_REPLY: &str = "Work has been on your mind lately. How did things go at \
work today?";

pub const GREETING_REPLY: &str = "Hello! It's good to hear from you. How are you feeling right now?";

pub const GRATITUDE_REPLY: &str = "You're very welcome. I'm here whenever you want to talk \
something through.";

pub const SAD_REPLY: &str = "I'm sorry you're feeling this way. It's okay to feel sad \
sometimes. Would you like to tell me more about what's on your mind?";

pub const HAPPY_REPLY: &str = "That's wonderful to hear! What's been the highlight that's \
making you feel this way?";

pub const GENERIC_REPLY: &str = "Thank you for sharing that with me. How does it make you feel?";

fn mentions(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn join_topics(topics: &[Topic]) -> String {
    topics.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
}

/// Generate a reply for `message` without the completion service
pub fn fallback_reply(message: &str, context: &ConversationContext) -> String {
    let lower = message.to_lowercase();
    let has_context = !context.recent_topics.is_empty();

    if has_context && mentions(&lower, &["remember", "before"]) {
        return format!(
            "I remember we talked about {}. How are those things going for you now?",
            join_topics(context.last_topics(3))
        );
    }

    if context.has_topic(Topic::Stress) && mentions(&lower, &["better", "improve"]) {
        return STRESS_COPING_REPLY.to_string();
    }

    if context.has_topic(Topic::Work) && lower.contains("today") {
        return WORK_CHECK_IN_REPLY.to_string();
    }

    if mentions(&lower, GREETING_WORDS) {
        return GREETING_REPLY.to_string();
    }
    if mentions(&lower, GRATITUDE_WORDS) {
        return GRATITUDE_REPLY.to_string();
    }
    if mentions(&lower, SAD_WORDS) {
        return SAD_REPLY.to_string();
    }
    if mentions(&lower, HAPPY_WORDS) {
        return HAPPY_REPLY.to_string();
    }

    if has_context {
        return format!(
            "Thank you for sharing that with me. I'm keeping in mind what you've told me about \
{}. How does this connect with how you've been feeling?",
            join_topics(context.last_topics(3))
        );
    }

    GENERIC_REPLY.to_string()
}
