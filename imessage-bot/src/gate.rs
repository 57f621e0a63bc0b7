//! Follow-up and search-need gate.
//!
//! Deterministic heuristics only. They decide whether the search collaborators are engaged,
//! whether a turn is an image-generation request, and what literal query text a follow-up
//! question is expanded to. Anything the rules leave open is [`SearchNeed::Undecided`]; the
//! dispatcher may ask a [`relay_core::SearchAdvisor`] about those.

use std::sync::LazyLock;

use memory::{ConversationContext, ProductMention, ASSISTANT_PREFIX};
use regex::Regex;
use tracing::debug;

/// Outcome of the deterministic search-need test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchNeed {
    /// Weather, time-sensitive or link-request phrasing.
    Required,
    /// Link sharing or an empty query.
    Rejected,
    Undecided,
}

/// Word count at or below which a query is treated as short.
pub const SHORT_QUERY_WORDS: usize = 5;

const PRONOUNS: &[&str] = &["it", "they", "them", "their", "its", "this", "that", "these", "those"];

const INSTRUCTION_PHRASES: &[&str] = &[
    "send me",
    "find me",
    "get me",
    "show me",
    "give me",
    "can you find",
    "can you send",
    "can you get",
    "can you show",
    "can you give",
];

const LINK_REQUEST_PHRASES: &[&str] = &[
    "link to",
    "link for",
    "where to buy",
    "where to find",
    "where can i buy",
    "where can i find",
    "where to get",
    "where can i get",
];

const WEATHER_KEYWORDS: &[&str] = &[
    "weather", "temperature", "forecast", "rain", "snow", "storm", "sunny", "cloudy", "humidity",
    "wind", "precipitation", "cold", "hot", "warm", "chilly", "freezing", "degrees",
];

const TIME_REFERENCES: &[&str] = &[
    "today",
    "tonight",
    "tomorrow",
    "this week",
    "this month",
    "this year",
    "right now",
    "currently",
    "at the moment",
];

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://(?:[-\w.]|(?:%[\da-fA-F]{2}))+").expect("valid regex"));

static WHOLE_LINE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:[-\w.]|(?:%[\da-fA-F]{2}))+$").expect("valid regex")
});

static WEATHER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)weather\s+(in|for|at)\s+.+",
        r"(?i)temperature\s+(in|at)\s+.+",
        r"(?i)is\s+it\s+(raining|snowing|cold|hot|warm|sunny|cloudy)\s+(in|at)\s+.+",
        r"(?i)what'?s\s+the\s+(weather|forecast|temperature)\s+(like|in|at|for)\s+.+",
        r"(?i)how\s+(cold|hot|warm|chilly)\s+is\s+it\s+(in|at)\s+.+",
        r"(?i)will\s+it\s+(rain|snow|be\s+cold|be\s+hot|be\s+sunny|be\s+cloudy)\s+(in|at|today|tomorrow|this\s+week)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static TIME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(current|latest|today'?s|tonight'?s|tomorrow'?s|upcoming|live)\s+\w+",
        r"(?i)what'?s\s+happening\s+(now|today|tonight|this\s+week|this\s+month)",
        r"(?i)\b(news|stock|price|score)\s+(of|for|on|in)\s+\w+",
        r"(?i)what\s+is\s+the\s+(current|latest|today'?s)\s+.+",
        r"(?i)who\s+is\s+(currently|now|presently)\s+.+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static IMAGE_REQUEST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(generate|create|draw|show me|imagine)(\s+a|\s+an)?\s+.+",
        r"(?i)^(image|picture|photo|drawing|illustration|artwork|graphic)\s+of\s+.+",
        r"(?i)^(can you|could you|please)(\s+generate|\s+create|\s+make|\s+draw|\s+show me)(\s+a|\s+an)?\s+.+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static FOLLOWUP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(how|what|when|where|why|who|which)\b",
        r"^(is|are|was|were|do|does|did|can|could|would|should|will)\b",
        r"^(and|but|so|then)\b",
        r"(your|my) (pick|choice|recommendation|suggestion|opinion|thought)",
        r"(which|what) (one|should|would|do you) (i|you) (choose|pick|select|recommend|suggest)",
        r"(best|better|preferred|recommended) (option|choice|pick|selection)",
        r"(any|have) (preference|recommendation|suggestion)",
        r"(what|how) about",
        r"(tell|give) me more",
        r"(anything|something) else",
        r"^(yes|no|maybe|sure|okay|fine|alright|great|perfect)\b",
        r"^(i|we) (like|prefer|want|need|choose|pick|select)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

pub fn contains_url(text: &str) -> bool {
    URL.is_match(text)
}

pub fn has_pronoun(text: &str) -> bool {
    words(text).any(|w| PRONOUNS.contains(&w.as_str()))
}

pub fn is_short_query(text: &str) -> bool {
    text.split_whitespace().count() <= SHORT_QUERY_WORDS
}

pub fn has_instruction_phrase(text: &str) -> bool {
    let lower = text.to_lowercase();
    INSTRUCTION_PHRASES.iter().any(|p| lower.contains(p))
}

pub fn is_link_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    LINK_REQUEST_PHRASES.iter().any(|p| lower.contains(p))
}

pub fn is_weather_query(text: &str) -> bool {
    words(text).any(|w| WEATHER_KEYWORDS.contains(&w.as_str()))
        || WEATHER_PATTERNS.iter().any(|p| p.is_match(text))
}

pub fn is_time_sensitive(text: &str) -> bool {
    let lower = text.to_lowercase();
    TIME_REFERENCES.iter().any(|r| lower.contains(r))
        || TIME_PATTERNS.iter().any(|p| p.is_match(text))
}

/// Link sharing rather than a question: URLs make up more than half the characters, every
/// non-empty line is a bare URL, or a short message has a URL on every line.
pub fn is_link_sharing(text: &str) -> bool {
    let total = text.chars().count();
    let url_chars: usize = URL.find_iter(text).map(|m| m.as_str().chars().count()).sum();
    if url_chars == 0 {
        return false;
    }
    if url_chars * 2 > total {
        return true;
    }

    let lines: Vec<&str> = text
        .trim()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.iter().all(|l| WHOLE_LINE_URL.is_match(l)) {
        return true;
    }
    lines.len() <= 3 && lines.iter().all(|l| URL.is_match(l))
}

/// Imperative image-generation phrasing, never when the text carries a URL.
pub fn is_image_request(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || contains_url(text) {
        return false;
    }
    IMAGE_REQUEST_PATTERNS.iter().any(|p| p.is_match(text))
}

/// Deterministic search-need decision. Weather always wins over link sharing.
pub fn search_need(text: &str) -> SearchNeed {
    let text = text.trim();
    let need = if text.is_empty() {
        SearchNeed::Rejected
    } else if is_weather_query(text) {
        SearchNeed::Required
    } else if is_link_sharing(text) {
        SearchNeed::Rejected
    } else if is_time_sensitive(text) || is_link_request(text) {
        SearchNeed::Required
    } else {
        SearchNeed::Undecided
    };
    debug!(query = %text, need = ?need, "step: search need assessed");
    need
}

/// Whether `query` likely leans on earlier turns.
pub fn is_followup_question(query: &str) -> bool {
    let lower = query.trim().to_lowercase();
    is_short_query(&lower)
        || has_pronoun(&lower)
        || has_instruction_phrase(&lower)
        || is_link_request(&lower)
        || FOLLOWUP_PATTERNS.iter().any(|p| p.is_match(&lower))
}

/// Expands a follow-up query with conversation context.
///
/// `context` must already hold the current message. Preference order: the resolved referent
/// product, then tracked entities (for short, pronoun or instruction queries), then the
/// previous message. Queries that are not follow-ups come back unchanged.
pub fn enhance_query(
    query: &str,
    context: Option<&ConversationContext>,
    referent: Option<&ProductMention>,
) -> String {
    let query = query.trim();
    let Some(ctx) = context else {
        return query.to_string();
    };
    let previous = ctx
        .previous_message()
        .map(|m| m.strip_prefix(ASSISTANT_PREFIX).unwrap_or(m));
    let Some(previous) = previous.filter(|p| *p != query) else {
        return query.to_string();
    };

    if !is_followup_question(query) {
        return query.to_string();
    }

    // "send me the link", "can you find one": the object is whatever was being discussed.
    let leans_on_subject =
        has_pronoun(query) || is_short_query(query) || has_instruction_phrase(query);
    if let Some(mention) = referent {
        if leans_on_subject {
            return format!("{} about {}", query, mention.full_name);
        }
    }
    if leans_on_subject && !ctx.entities().is_empty() {
        let entities: Vec<&str> = ctx.entities().iter().map(String::as_str).collect();
        return format!("{} about {}", query, entities.join(" "));
    }
    format!("{} in context of previous question about {}", query, previous)
}
