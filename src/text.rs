//! Text normalization: lowercase, strip URLs and channel/user mentions,
//! drop punctuation, split, then filter stop words and short tokens.
//! Pure functions over a compiled [`TextProcessor`]; no state.

use anyhow::Result;
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};

use crate::config::AnalysisConfig;

/// Built-in stop words, matched after lowercasing.
const STOP_WORDS: &[&str] = &[
    "ever", "why", "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for",
    "not", "on", "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from",
    "they", "we", "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there",
    "their", "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when",
    "make", "can", "like", "time", "no", "just", "him", "know", "take", "people", "into", "year",
    "your", "good", "some", "could", "them", "see", "other", "than", "then", "now", "look",
    "only", "come", "its", "over", "think", "also", "back", "after", "use", "two", "how", "our",
    "work", "first", "well", "way", "even", "new", "want", "because", "any", "these", "give",
    "day", "most", "us", "is", "are", "was", "were", "been", "being", "has", "had", "does",
    "did", "should", "may", "might", "must", "shall", "am", "pm", "etc", "vs", "mr", "mrs",
    "dr", "prof", "inc", "ltd", "co", "corp", "llc",
];

pub struct TextProcessor {
    stop_words: HashSet<String>,
    min_word_length: usize,
    context_length: usize,
    url_re: Regex,
    mention_re: Regex,
    nonword_re: Regex,
    ws_re: Regex,
}

impl TextProcessor {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let mut stop_words: HashSet<String> =
            STOP_WORDS.iter().map(|w| w.to_string()).collect();
        stop_words.extend(config.extra_stop_words.iter().map(|w| w.to_lowercase()));

        Ok(Self {
            stop_words,
            min_word_length: config.min_word_length,
            context_length: config.context_length,
            url_re: Regex::new(r"https?://\S+")?,
            mention_re: Regex::new(r"\b[ru]/\w+")?,
            nonword_re: Regex::new(r"[^\w\s']")?,
            ws_re: Regex::new(r"\s+")?,
        })
    }

    /// Lowercase and strip URLs, channel/user mentions, and punctuation.
    /// Apostrophes survive so contractions stay intact.
    pub fn clean_text(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text = text.to_lowercase();
        let text = self.url_re.replace_all(&text, "");
        let text = self.mention_re.replace_all(&text, "");
        let text = self.nonword_re.replace_all(&text, " ");
        let text = self.ws_re.replace_all(&text, " ");
        text.trim().to_string()
    }

    /// Split cleaned text into filtered words: minimum length, not pure
    /// digits, not a stop word.
    pub fn extract_words(&self, cleaned: &str) -> Vec<String> {
        cleaned
            .split_whitespace()
            .map(|w| w.trim_matches('\''))
            .filter(|w| {
                w.chars().count() >= self.min_word_length
                    && !w.chars().all(|c| c.is_ascii_digit())
                    && !w.starts_with("http")
                    && !self.stop_words.contains(*w)
            })
            .map(|w| w.to_string())
            .collect()
    }

    /// Word frequencies for one piece of raw text.
    pub fn word_frequencies(&self, text: &str) -> HashMap<String, i64> {
        let cleaned = self.clean_text(text);
        let mut counts = HashMap::new();
        for word in self.extract_words(&cleaned) {
            *counts.entry(word).or_insert(0) += 1;
        }
        counts
    }

    /// The window surrounding the first case-insensitive occurrence of
    /// `word` in `text`, with ellipses at whichever edges were clipped.
    /// Falls back to a truncated prefix when the word is not found
    /// (it may have been produced by cleaning).
    pub fn context(&self, text: &str, word: &str) -> String {
        if text.is_empty() || word.is_empty() {
            return String::new();
        }

        let len = self.context_length;
        let word_re = match RegexBuilder::new(&regex::escape(word))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => re,
            Err(_) => return String::new(),
        };

        let m = match word_re.find(text) {
            Some(m) => m,
            None => {
                return if text.chars().count() > len {
                    let prefix: String = text.chars().take(len).collect();
                    format!("{}...", prefix)
                } else {
                    text.to_string()
                };
            }
        };

        let start = floor_char_boundary(text, m.start().saturating_sub(len / 2));
        let end = ceil_char_boundary(text, (m.end() + len / 2).min(text.len()));

        let mut context = text[start..end].to_string();
        if start > 0 {
            context = format!("...{}", context);
        }
        if end < text.len() {
            context.push_str("...");
        }
        context
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    fn processor() -> TextProcessor {
        TextProcessor::new(&AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn clean_strips_urls_and_mentions() {
        let tp = processor();
        let cleaned = tp.clean_text("Check https://example.com/x?y=1 via r/rust and u/someone!");
        assert_eq!(cleaned, "check via and");
    }

    #[test]
    fn clean_keeps_contractions() {
        let tp = processor();
        assert_eq!(tp.clean_text("Don't panic!"), "don't panic");
    }

    #[test]
    fn extract_filters_stop_words_digits_and_short_tokens() {
        let tp = processor();
        let words = tp.extract_words("the quick brown fox is 42 ok");
        assert_eq!(words, vec!["quick", "brown", "fox"]);
    }

    #[test]
    fn frequencies_count_repeats() {
        let tp = processor();
        let counts = tp.word_frequencies("Rust rust RUST python");
        assert_eq!(counts.get("rust"), Some(&3));
        assert_eq!(counts.get("python"), Some(&1));
    }

    #[test]
    fn context_trailing_ellipsis_only_when_right_edge_clipped() {
        let cfg = AnalysisConfig {
            context_length: 8,
            ..Default::default()
        };
        let tp = TextProcessor::new(&cfg).unwrap();
        let ctx = tp.context("the quick brown fox", "quick");
        assert_eq!(ctx, "the quick bro...");
    }

    #[test]
    fn context_both_edges_clipped() {
        let cfg = AnalysisConfig {
            context_length: 4,
            ..Default::default()
        };
        let tp = TextProcessor::new(&cfg).unwrap();
        let ctx = tp.context("aaaa quick bbbb", "quick");
        assert_eq!(ctx, "...a quick b...");
    }

    #[test]
    fn context_unclipped_has_no_ellipses() {
        let cfg = AnalysisConfig {
            context_length: 100,
            ..Default::default()
        };
        let tp = TextProcessor::new(&cfg).unwrap();
        assert_eq!(tp.context("short text", "short"), "short text");
    }

    #[test]
    fn context_missing_word_falls_back_to_prefix() {
        let cfg = AnalysisConfig {
            context_length: 5,
            ..Default::default()
        };
        let tp = TextProcessor::new(&cfg).unwrap();
        assert_eq!(tp.context("abcdefghij", "zzz"), "abcde...");
    }

    #[test]
    fn extra_stop_words_are_merged() {
        let cfg = AnalysisConfig {
            extra_stop_words: vec!["Rust".to_string()],
            ..Default::default()
        };
        let tp = TextProcessor::new(&cfg).unwrap();
        let words = tp.extract_words("rust tokio");
        assert_eq!(words, vec!["tokio"]);
    }
}
