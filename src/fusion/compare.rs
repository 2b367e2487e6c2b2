use std::collections::HashSet;

use strsim::normalized_levenshtein;
use unicode_normalization::UnicodeNormalization;

use crate::core::model::ContentKind;

const PREFIX_FRACTION: f32 = 0.8;
const MIN_PREFIX_CHARS: usize = 10;
const PREFIX_SHORT_CIRCUIT: f32 = 0.8;

/// Similarity of two texts in `[0, 1]`, weighted toward their openings.
///
/// Extracted captions are often cut off after the first clause, so when the
/// leading 80% of the shorter text matches closely the tails are ignored.
pub fn text_similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a = clean_for_comparison(a);
    let b = clean_for_comparison(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let prefix_len = MIN_PREFIX_CHARS.max((a_len.min(b_len) as f32 * PREFIX_FRACTION) as usize);
    let a_prefix: String = a.chars().take(prefix_len).collect();
    let b_prefix: String = b.chars().take(prefix_len).collect();

    let prefix_ratio = normalized_levenshtein(&a_prefix, &b_prefix) as f32;
    if prefix_ratio >= PREFIX_SHORT_CIRCUIT {
        return (0.9 + prefix_ratio * 0.1).min(1.0);
    }

    let full_ratio = normalized_levenshtein(&a, &b) as f32;
    let contain_bonus = if a.contains(b.as_str()) || b.contains(a.as_str()) {
        0.3
    } else {
        0.0
    };

    (prefix_ratio * 0.5 + full_ratio * 0.3 + word_overlap(&a, &b) * 0.2 + contain_bonus).min(1.0)
}

/// Lowercases, replaces punctuation with spaces and collapses whitespace.
pub fn clean_for_comparison(text: &str) -> String {
    let replaced: String = text
        .nfkc()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn word_overlap(a: &str, b: &str) -> f32 {
    let a_words: HashSet<_> = a.split_whitespace().collect();
    let b_words: HashSet<_> = b.split_whitespace().collect();
    if a_words.is_empty() || b_words.is_empty() {
        return 0.0;
    }
    let intersection = a_words.intersection(&b_words).count() as f32;
    let union = a_words.union(&b_words).count() as f32;
    intersection / union
}

/// Whether a content-list kind and a middle-structure block type describe the same sort of content.
pub fn kind_compatible(content: &ContentKind, block_kind: &str) -> bool {
    let accepted: &[&str] = match content {
        ContentKind::Text => &["text", "paragraph", "para"],
        ContentKind::Image => &["image", "figure"],
        ContentKind::Title => &["title", "heading"],
        ContentKind::Table => &["table"],
        ContentKind::Other(name) => return name == block_kind,
    };
    accepted.contains(&block_kind)
}
