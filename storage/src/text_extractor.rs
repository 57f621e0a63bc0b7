//! Text recovery from `attributedBody`, the typedstream-archived `NSAttributedString` the
//! Messages app stores when the plain `text` column is empty.
//!
//! Two passes:
//!
//! 1. **Marker pass**: take the bytes between the `NSString…+` class marker and the following
//!    `iI` attribute marker, skip the archive's length prefix (one byte, or `0x81` plus a
//!    two-byte length for strings of 128 bytes and more), then strip leading digits and
//!    non-alphanumeric noise.
//! 2. **Run pass**: collect runs of printable ASCII, drop runs that are archive internals, and
//!    prefer a run that reads like a command or question; else the longest remaining run.
//!
//! `None` means nothing qualified. Callers treat that as "no text", never as an empty string.

use std::sync::LazyLock;

use regex::bytes::Regex as BytesRegex;
use regex::Regex;

static NSSTRING_MARKER: LazyLock<BytesRegex> =
    LazyLock::new(|| BytesRegex::new(r"NSString(?-u:[^+])*\+").expect("valid regex"));

static COMMAND_OR_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(create|make|generate|show|tell|find|search|look|get|give|send|write|draw|calculate|compute|analyze|explain|describe|how|what|when|where|why|who|which|whose|whom|can|could|would|should|is|are|do|does|did|has|have|had)\s",
    )
    .expect("valid regex")
});

const ATTRIBUTE_MARKER: &[u8] = b"iI";

/// Length prefixes wider than one byte: tag byte and the number of length bytes after it.
const WIDE_LENGTH_TAGS: &[(u8, usize)] = &[(0x81, 2), (0x82, 4)];

/// Lowercase fragments that only occur in archive internals.
const ARCHIVE_TOKENS: &[&str] = &[
    "nsstring",
    "nsobject",
    "nsattributed",
    "nsdictionary",
    "nsarray",
    "nsnumber",
    "nsvalue",
    "nsdata",
    "nsmutable",
    "streamtyped",
    "__k",
];

const MIN_RUN_LEN: usize = 5;

/// Recovers message text from an `attributedBody` payload.
pub fn extract_attributed_text(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    marker_pass(body).or_else(|| run_pass(body))
}

fn marker_pass(body: &[u8]) -> Option<String> {
    let mut start = NSSTRING_MARKER.find(body)?.end();
    if let Some((_, width)) = WIDE_LENGTH_TAGS
        .iter()
        .find(|(tag, _)| body.get(start) == Some(tag))
    {
        start += 1 + width;
    }
    let rest = body.get(start..)?;
    let end = rest
        .windows(ATTRIBUTE_MARKER.len())
        .position(|w| w == ATTRIBUTE_MARKER)?;

    let decoded: String = String::from_utf8_lossy(&rest[..end])
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect();

    let candidate = decoded.trim_start_matches(|c: char| c.is_ascii_digit() || !c.is_alphanumeric());
    let candidate = strip_stray_lead(candidate);
    let candidate = fix_truncated_apostrophe(candidate);
    let candidate = candidate.trim_matches(|c: char| c.is_control() || c.is_whitespace());

    (candidate.chars().count() > 2).then(|| candidate.to_string())
}

fn run_pass(body: &[u8]) -> Option<String> {
    let runs: Vec<&str> = body
        .split(|b| !(32..=126).contains(b))
        .filter(|run| run.len() >= MIN_RUN_LEN)
        // printable ASCII is valid UTF-8
        .filter_map(|run| std::str::from_utf8(run).ok())
        .filter(|run| {
            let lower = run.to_ascii_lowercase();
            !ARCHIVE_TOKENS.iter().any(|token| lower.contains(token))
        })
        .collect();

    for run in &runs {
        let cleaned = clean_run(run);
        if cleaned.len() > 10 && COMMAND_OR_QUESTION.is_match(&cleaned.to_ascii_lowercase()) {
            return Some(cleaned.to_string());
        }
    }

    let mut longest: Option<&str> = None;
    for run in runs
        .iter()
        .copied()
        .filter(|run| run.len() > MIN_RUN_LEN && run.chars().any(|c| c.is_ascii_alphabetic()))
    {
        if longest.map_or(true, |best| run.len() > best.len()) {
            longest = Some(run);
        }
    }

    let cleaned = clean_run(longest?);
    if let Some(rest) = cleaned.strip_prefix("s ") {
        return Some(format!("What's {}", rest));
    }
    Some(cleaned.to_string())
}

fn clean_run(run: &str) -> &str {
    strip_stray_lead(run.trim_start_matches(|c: char| !c.is_ascii_alphabetic()))
}

/// Drops a single letter that precedes a capital: the archive's length byte rendered as ASCII
/// ("FCreate" -> "Create").
fn strip_stray_lead(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_ascii_alphabetic() && second.is_ascii_uppercase() => {
            &text[first.len_utf8()..]
        }
        _ => text,
    }
}

fn fix_truncated_apostrophe(text: &str) -> std::borrow::Cow<'_, str> {
    if text.starts_with("hat's ") {
        format!("W{}", text).into()
    } else if text.starts_with("t's ") {
        format!("I{}", text).into()
    } else {
        text.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a typedstream-shaped payload around `text`.
    fn archived(text: &str) -> Vec<u8> {
        archived_bytes(text.as_bytes())
    }

    fn archived_bytes(payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"\x04\x0bstreamtyped\x81\xe8\x03\x84\x01@\x84\x84\x84");
        body.extend_from_slice(b"\x12NSAttributedString\x00\x84\x84\x08NSObject\x00\x85\x92");
        body.extend_from_slice(b"\x84\x84\x84\x08NSString\x01\x94\x84\x01+");
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\x86\x84\x02iI\x01\x19\x92\x84\x84\x84\x0cNSDictionary\x00");
        body
    }

    #[test]
    fn strips_stray_length_byte_before_capital() {
        let body = archived("FCreate a poem about cats");
        assert_eq!(
            extract_attributed_text(&body).as_deref(),
            Some("Create a poem about cats")
        );
    }

    #[test]
    fn strips_control_length_prefix() {
        let body = archived("\x0bhello there");
        assert_eq!(extract_attributed_text(&body).as_deref(), Some("hello there"));
    }

    #[test]
    fn strips_length_byte_that_reads_as_digit() {
        let text = "Tell me the weather forecast for Boston tomorrow!";
        assert_eq!(text.len(), 49);
        let mut payload = vec![0x31];
        payload.extend_from_slice(text.as_bytes());
        let body = archived_bytes(&payload);
        assert_eq!(extract_attributed_text(&body).as_deref(), Some(text));
    }

    #[test]
    fn skips_wide_length_prefix_of_long_messages() {
        let text = format!("Hello {}", "x".repeat(294));
        let mut payload = vec![0x81, 0x2C, 0x01];
        payload.extend_from_slice(text.as_bytes());
        let body = archived_bytes(&payload);
        assert_eq!(extract_attributed_text(&body), Some(text));
    }

    #[test]
    fn wide_length_byte_that_reads_as_letter_is_skipped() {
        let text = format!("hello {}", "y".repeat(315));
        let mut payload = vec![0x81, 0x41, 0x01];
        payload.extend_from_slice(text.as_bytes());
        let body = archived_bytes(&payload);
        assert_eq!(extract_attributed_text(&body), Some(text));
    }

    #[test]
    fn repairs_truncated_apostrophe_words() {
        let body = archived("hat's the weather like");
        assert_eq!(
            extract_attributed_text(&body).as_deref(),
            Some("What's the weather like")
        );
        let body = archived("t's raining again");
        assert_eq!(
            extract_attributed_text(&body).as_deref(),
            Some("It's raining again")
        );
    }

    #[test]
    fn keeps_multibyte_text() {
        let body = archived("café at 5?");
        assert_eq!(extract_attributed_text(&body).as_deref(), Some("café at 5?"));
    }

    #[test]
    fn run_pass_prefers_question_runs() {
        let body = b"\x00\x01streamtyped\x00\x02some longer noise run here ok\x00what is the tallest tower\x00";
        assert_eq!(
            extract_attributed_text(body).as_deref(),
            Some("what is the tallest tower")
        );
    }

    #[test]
    fn run_pass_falls_back_to_longest_run() {
        let body = b"\x00\x01NSObject\x00\x02short\x00\x03@@pizza tonight maybe\x00";
        assert_eq!(
            extract_attributed_text(body).as_deref(),
            Some("pizza tonight maybe")
        );
    }

    #[test]
    fn run_pass_restores_whats() {
        let body = b"\x00\x01s up with you\x00";
        assert_eq!(extract_attributed_text(body).as_deref(), Some("What's up with you"));
    }

    #[test]
    fn returns_none_without_candidates() {
        assert_eq!(extract_attributed_text(b""), None);
        assert_eq!(extract_attributed_text(b"\x00\x01\x02\x03"), None);
        assert_eq!(extract_attributed_text(b"\x00streamtyped\x00NSString\x00"), None);
    }

    #[test]
    fn output_is_stable_under_plain_text_handling() {
        let body = archived("FCreate a poem about cats");
        let extracted = extract_attributed_text(&body).expect("text recovered");
        let record = relay_core::RawMessageRecord::text(1, "a", extracted.clone(), 0);
        assert_eq!(record.text_content(), Some(extracted.as_str()));
    }
}
