//! Knowledge chunks and sanitization of untrusted passage text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// An opaque text passage from the retrieval collaborator.
///
/// Content is untrusted and may carry markdown; sanitize with
/// [`clean_content`] before reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl KnowledgeChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            concept: None,
            score: None,
        }
    }
}

static FENCE_RE: OnceLock<Regex> = OnceLock::new();
static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static BULLET_RE: OnceLock<Regex> = OnceLock::new();
static NUMBERED_RE: OnceLock<Regex> = OnceLock::new();

/// Strip structural markup and normalize whitespace.
///
/// Fenced code blocks are removed wholesale; heading markers, list
/// markers, emphasis asterisks, and backticks are stripped; runs of
/// whitespace collapse to single spaces. `max_length` truncates on a
/// word boundary.
pub fn clean_content(text: &str, max_length: Option<usize>) -> String {
    let no_fences = FENCE_RE
        .get_or_init(|| Regex::new(r"(?s)```.*?```").unwrap())
        .replace_all(text, " ");
    let no_headings = HEADING_RE
        .get_or_init(|| Regex::new(r"(?m)^\s*#{1,6}\s*").unwrap())
        .replace_all(&no_fences, "");
    let no_bullets = BULLET_RE
        .get_or_init(|| Regex::new(r"(?m)^\s*[-*+]\s+").unwrap())
        .replace_all(&no_headings, "");
    let no_numbers = NUMBERED_RE
        .get_or_init(|| Regex::new(r"(?m)^\s*\d+\.\s+").unwrap())
        .replace_all(&no_bullets, "");

    let stripped: String = no_numbers
        .chars()
        .filter(|c| *c != '*' && *c != '`')
        .collect();

    let normalized = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    match max_length {
        Some(limit) if normalized.len() > limit => {
            let mut cut = String::new();
            for word in normalized.split(' ') {
                if cut.len() + word.len() + 1 > limit {
                    break;
                }
                if !cut.is_empty() {
                    cut.push(' ');
                }
                cut.push_str(word);
            }
            cut
        }
        _ => normalized,
    }
}

/// Split text into sentences at a terminator followed by whitespace and
/// a capital letter.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if matches!(chars[i], '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j > i + 1 && j < chars.len() && chars[j].is_uppercase() {
                let sentence: String = chars[start..=i].iter().collect();
                let trimmed = sentence.trim();
                if !trimmed.is_empty() {
                    sentences.push(trimmed.to_string());
                }
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }

    if start < chars.len() {
        let tail: String = chars[start..].iter().collect();
        let trimmed = tail.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
    }

    sentences
}

/// First `count` sentences of a passage, joined back together
pub fn extract_key_sentences(text: &str, count: usize) -> String {
    split_sentences(text)
        .into_iter()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}
