//! Correction cue and negation detection.

use std::sync::LazyLock;

use regex::Regex;

static CORRECTION_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(not|actually|wrong|incorrect|mistake|mistaken|meant|instead|correction|rather)\b",
    )
    .expect("valid regex")
});

/// Negation word at the end of the text, optionally followed by an article.
static TRAILING_NEGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:not|isn['’]?t|wasn['’]?t|never|no)\s+(?:(?:a|an|the|my)\s+)?$")
        .expect("valid regex")
});

/// True if the message signals that it corrects something said earlier.
pub fn has_correction_cue(text: &str) -> bool {
    CORRECTION_CUE.is_match(text)
}

/// True if the mention starting at byte `start` is directly negated ("not an iPhone 15").
pub fn is_negated(text: &str, start: usize) -> bool {
    text.get(..start)
        .is_some_and(|prefix| TRAILING_NEGATION.is_match(prefix))
}
