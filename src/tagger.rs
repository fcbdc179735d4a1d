//! Bigram search keys for utterances.
//!
//! The key is a space-separated list of `prev:word` pairs. Stored statements
//! carry the key of the input they answer, so the matcher can narrow its
//! candidates to inputs sharing at least one pair.

use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "do", "for", "from", "has", "have",
    "he", "her", "his", "i", "if", "in", "is", "it", "its", "me", "my", "of", "on", "or", "our",
    "she", "so", "that", "the", "their", "them", "they", "this", "to", "was", "we", "were",
    "will", "with", "you", "your",
];

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Build the bigram search key for `text`.
///
/// Texts of one or two words yield the words themselves.
pub fn bigram_pair_string(text: &str) -> String {
    let words = tokens(text);
    if words.len() <= 2 {
        return words.join(" ");
    }

    words
        .windows(2)
        .filter(|pair| !STOP_WORDS.contains(&pair[1].as_str()))
        .map(|pair| format!("{}:{}", pair[0], pair[1]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether two search keys share at least one pair.
pub fn keys_overlap(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let left: HashSet<&str> = a.split(' ').collect();
    b.split(' ').any(|pair| left.contains(pair))
}
