// Text Processing Service
// Normalization and n-gram tokenization feeding the feature extractor

use regex::Regex;
use std::sync::OnceLock;

fn horizontal_ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\x0C\x0B]+").expect("horizontal whitespace regex"))
}

fn any_ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn word_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Tokens of two or more word characters, same pattern the vectorizer was fitted with.
    RE.get_or_init(|| Regex::new(r"(?u)\b\w\w+\b").expect("word token regex"))
}

/// Normalize raw input for word counting and previews.
///
/// Smart quotes and dashes become ASCII, non-breaking and ideographic spaces
/// become plain spaces, line endings are unified and horizontal whitespace is
/// collapsed. Every line is trimmed, then the whole text.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let s = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{2014}', '\u{2013}'], "-")
        .replace(['\u{3000}', '\u{00A0}'], " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let s = horizontal_ws_re().replace_all(&s, " ");

    s.lines()
        .map(|ln| ln.trim())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Whitespace-separated word count, used by the short-text guard.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn word_tokens(text: &str, lowercase: bool) -> Vec<String> {
    let source = if lowercase { text.to_lowercase() } else { text.to_string() };
    word_token_re()
        .find_iter(&source)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Word n-grams for every n in `min_n..=max_n`, joined by a single space.
pub fn word_ngrams(tokens: &[String], min_n: usize, max_n: usize) -> Vec<String> {
    let min_n = min_n.max(1);
    let mut out = Vec::new();
    for n in min_n..=max_n {
        if n > tokens.len() {
            break;
        }
        out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    out
}

/// Character n-grams over whitespace-collapsed text.
pub fn char_ngrams(text: &str, min_n: usize, max_n: usize, lowercase: bool) -> Vec<String> {
    let source = if lowercase { text.to_lowercase() } else { text.to_string() };
    let collapsed = any_ws_re().replace_all(&source, " ");
    let chars: Vec<char> = collapsed.chars().collect();
    let min_n = min_n.max(1);
    let mut out = Vec::new();
    for n in min_n..=max_n {
        if n > chars.len() {
            break;
        }
        out.extend(chars.windows(n).map(|w| w.iter().collect::<String>()));
    }
    out
}

/// Single-line preview for logs and terminal output.
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}
