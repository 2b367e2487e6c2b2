use lazy_static::lazy_static;
use regex::Regex;

use crate::core::model::RefKind;

lazy_static! {
    static ref FIGURE_NUMBER: Regex = Regex::new(r"(?i)(?:Fig\.|Figure|FIG\.?)\s*(\d+)").unwrap();
    static ref TABLE_NUMBER: Regex = Regex::new(r"(?i)(?:Table|Tab\.|TABLE\.?)\s*(\d+)").unwrap();
    static ref TABLE_TOKEN: Regex = Regex::new(r"(?i)\b(?:Table|Tab\.|TABLE\.?)").unwrap();
    static ref FIGURE_TOKEN: Regex = Regex::new(r"(?i)\b(?:Fig\.|Figure|FIG\.?)").unwrap();
}

/// First figure number in a caption, else the first table number.
pub fn number_from_caption(caption: &str) -> Option<String> {
    [&*FIGURE_NUMBER, &*TABLE_NUMBER].iter().find_map(|pattern| {
        pattern
            .captures(caption)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Table if any table token appears, else figure if a figure token appears.
pub fn kind_from_caption(caption: &str) -> Option<RefKind> {
    if TABLE_TOKEN.is_match(caption) {
        Some(RefKind::Table)
    } else if FIGURE_TOKEN.is_match(caption) {
        Some(RefKind::Figure)
    } else {
        None
    }
}
