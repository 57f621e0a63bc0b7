//! Topic word extraction.

use std::collections::BTreeSet;

/// Words likely to be nouns: longer than 4 chars, or capitalized and longer than 1.
/// Punctuation is stripped and the result lowercased; words of 2 chars or less are dropped.
pub fn extract_topics(message: &str) -> BTreeSet<String> {
    message
        .split_whitespace()
        .filter(|word| {
            let len = word.chars().count();
            len > 4 || (len > 1 && word.chars().next().is_some_and(char::is_uppercase))
        })
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| word.chars().count() > 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_long_and_capitalized_words() {
        let topics = extract_topics("Is the Pixel camera good, or not?");
        let expected: BTreeSet<String> = ["pixel", "camera", "good"]
            .into_iter()
            .map(String::from)
            .collect();
        // "good," is 5 chars before stripping
        assert_eq!(topics, expected);
    }

    #[test]
    fn drops_short_words_after_stripping() {
        assert!(extract_topics("Hi! ok yes").is_empty());
        assert!(extract_topics("").is_empty());
    }
}
