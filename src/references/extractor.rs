use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::model::{RefKind, Reference};
use crate::references::patterns::REFERENCE_PATTERNS;

/// Stands in for the space after a protected abbreviation while sentences are split.
const PROTECTED_SPACE: char = '\u{E000}';

lazy_static! {
    static ref PROTECTED_ABBREVIATIONS: Vec<Regex> = [
        r"(?i)\b(Fig\.)\s*(\d+)",
        r"(?i)\b(Table\.)\s*(\d+)",
        r"(?i)\b(Tab\.)\s*(\d+)",
    ]
    .iter()
    .map(|source| Regex::new(source).unwrap())
    .collect();
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Sentences shorter than this many characters are treated as noise.
    pub min_sentence_len: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_sentence_len: 10,
        }
    }
}

/// Finds figure and table citations in running text.
#[derive(Debug, Clone, Default)]
pub struct ReferenceExtractor {
    config: ExtractorConfig,
}

impl ReferenceExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Every pattern hit in every sentence, overlaps included.
    ///
    /// Returned references carry no location; callers attach page and box.
    pub fn extract(&self, text: &str) -> Vec<Reference> {
        let mut references = Vec::new();
        for (sentence_idx, sentence) in split_sentences(text).iter().enumerate() {
            if sentence.chars().count() < self.config.min_sentence_len {
                continue;
            }
            for pattern in REFERENCE_PATTERNS.iter() {
                for caps in pattern.regex.captures_iter(sentence) {
                    let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                        continue;
                    };
                    references.push(Reference {
                        sentence: sentence.clone(),
                        sentence_idx,
                        ref_type: pattern.kind,
                        number: number.as_str().to_string(),
                        match_text: whole.as_str().to_string(),
                        page_idx: 0,
                        bbox: None,
                    });
                }
            }
        }
        references
    }
}

/// Splits on `.`, `!` or `?` followed by whitespace, without breaking "Fig. 3"-style citations.
pub fn split_sentences(text: &str) -> Vec<String> {
    let replacement = format!("${{1}}{PROTECTED_SPACE}${{2}}");
    let mut protected = text.to_string();
    for pattern in PROTECTED_ABBREVIATIONS.iter() {
        protected = pattern
            .replace_all(&protected, replacement.as_str())
            .into_owned();
    }

    SENTENCE_END
        .split(&protected)
        .map(|sentence| sentence.replace(PROTECTED_SPACE, " ").trim().to_string())
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Keeps the first reference for each (sentence, number, kind).
pub fn dedup_references(references: Vec<Reference>) -> Vec<Reference> {
    let mut seen: HashSet<(String, String, RefKind)> = HashSet::new();
    references
        .into_iter()
        .filter(|r| seen.insert((r.sentence.trim().to_string(), r.number.clone(), r.ref_type)))
        .collect()
}
