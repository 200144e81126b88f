//! Keyword heuristics for mood and topic tagging.
//!
//! Both functions lowercase the input and look for plain substrings, so
//! "stressed" counts for "stress" and "workout" counts for "work".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of topics attached to a single turn
pub const MAX_TOPICS_PER_TURN: usize = 3;

pub const POSITIVE_WORDS: &[&str] = &[
    "happy",
    "good",
    "great",
    "excited",
    "wonderful",
    "amazing",
    "love",
    "grateful",
    "joy",
    "awesome",
    "fantastic",
    "glad",
];

pub const NEGATIVE_WORDS: &[&str] = &[
    "sad",
    "bad",
    "angry",
    "upset",
    "depressed",
    "anxious",
    "worried",
    "frustrated",
    "terrible",
    "awful",
    "hate",
    "lonely",
];

/// Keyword groups in definition order; `extract_topics` preserves this order
pub const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (
        Topic::Work,
        &["work", "job", "office", "boss", "career", "meeting", "project", "colleague"],
    ),
    (
        Topic::Family,
        &["family", "mom", "dad", "parent", "sister", "brother", "kids", "children", "wife", "husband"],
    ),
    (Topic::Social, &["friend", "party", "social", "people", "relationship"]),
    (Topic::Health, &["health", "sick", "exercise", "doctor", "pain", "gym"]),
    (
        Topic::Stress,
        &["stress", "anxious", "anxiety", "overwhelm", "pressure", "worried", "nervous"],
    ),
    (Topic::Sleep, &["sleep", "tired", "insomnia", "exhausted", "nap"]),
    (
        Topic::Positive,
        &["happy", "great", "good", "excited", "wonderful", "amazing", "love", "joy"],
    ),
    (
        Topic::Negative,
        &["sad", "angry", "upset", "depressed", "lonely", "bad", "hurt"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Negative,
    Neutral,
}

impl Mood {
    /// Numeric mirror of the mood label
    pub fn sentiment(self) -> i8 {
        match self {
            Mood::Positive => 1,
            Mood::Negative => -1,
            Mood::Neutral => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Negative => "negative",
            Mood::Neutral => "neutral",
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Mood::Neutral
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Work,
    Family,
    Social,
    Health,
    Stress,
    Sleep,
    Positive,
    Negative,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Work => "work",
            Topic::Family => "family",
            Topic::Social => "social",
            Topic::Health => "health",
            Topic::Stress => "stress",
            Topic::Sleep => "sleep",
            Topic::Positive => "positive",
            Topic::Negative => "negative",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn count_matches(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|word| text.contains(*word)).count()
}

/// Classify text as positive, negative or neutral.
///
/// Each list counts how many of its words appear; the strictly larger count
/// wins and a tie (including none at all) is neutral.
pub fn detect_mood(text: &str) -> Mood {
    let lower = text.to_lowercase();
    let positive = count_matches(&lower, POSITIVE_WORDS);
    let negative = count_matches(&lower, NEGATIVE_WORDS);

    if positive > negative {
        Mood::Positive
    } else if negative > positive {
        Mood::Negative
    } else {
        Mood::Neutral
    }
}

/// Tag text with up to three topics, in keyword-group order
pub fn extract_topics(text: &str) -> Vec<Topic> {
    let lower = text.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| *topic)
        .take(MAX_TOPICS_PER_TURN)
        .collect()
}
