//! Citation patterns for figure and table references.
//!
//! English, mixed and Chinese phrasings overlap. Every pattern is evaluated
//! on every sentence and duplicate hits are removed downstream.

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::model::RefKind;

const FIGURE_TOKEN: &str = r"(?:Fig\.|Figure|FIG\.?|fig\.?)";
const TABLE_TOKEN: &str = r"(?:Table|Tab\.|TABLE\.?|table|tab\.?)";

/// `{T}` stands for the figure token alternation.
const FIGURE_PATTERNS: &[&str] = &[
    // bare and bracketed
    r"\b{T}\s*(\d+)",
    r"\({T}\s*(\d+)\)",
    r"\[{T}\s*(\d+)\]",
    // verb modifiers
    r"\b(?:see|refer to|shown in|as in)\s+{T}\s*(\d+)",
    r"\b{T}\s*(\d+)\s*(?:shows|depicts|illustrates|presents|displays)",
    r"\bthe\s+{T}\s*(\d+)",
    // positional
    r"\b(?:above|below|following|previous|next|aforementioned|aforesaid)\s+{T}\s*(\d+)",
    r"\b{T}\s*(\d+)\s*(?:above|below|shown|presented)",
    // mixed Chinese and English
    r"如\s*{T}\s*(\d+)\s*所示",
    r"见\s*{T}\s*(\d+)",
    r"参见\s*{T}\s*(\d+)",
    r"\(见\s*{T}\s*(\d+)\)",
    r"\(参见\s*{T}\s*(\d+)\)",
    // Chinese
    r"图\s*(\d+)",
    r"第\s*(\d+)\s*图",
    r"见图\s*(\d+)",
    r"如图\s*(\d+)\s*所示",
    r"参见图\s*(\d+)",
    r"\(图\s*(\d+)\)",
    r"\(见图\s*(\d+)\)",
    // abbreviations without a dot
    r"\bfig\s*(\d+)",
    r"\bFigure\s*(\d+)",
    r"figure\s*(\d+)",
    // punctuation-terminated
    r"{T}\s*(\d+)[,，.]",
    r"{T}\s*(\d+)[：:]",
    // connectives
    r"\bin\s+{T}\s*(\d+)",
    r"\bfrom\s+{T}\s*(\d+)",
    r"\bof\s+{T}\s*(\d+)",
    // descriptive
    r"\b{T}\s*(\d+)\s*(?:demonstrates|reveals|indicates|suggests)",
    r"\baccording to\s+{T}\s*(\d+)",
    r"\bbased on\s+{T}\s*(\d+)",
];

/// `{T}` stands for the table token alternation.
const TABLE_PATTERNS: &[&str] = &[
    r"\b{T}\s*(\d+)",
    r"\({T}\s*(\d+)\)",
    r"\[{T}\s*(\d+)\]",
    r"\b(?:see|refer to|shown in|as in)\s+{T}\s*(\d+)",
    r"\b{T}\s*(\d+)\s*(?:shows|lists|presents|summarizes|contains)",
    r"\bthe\s+{T}\s*(\d+)",
    r"\b(?:above|below|following|previous|next|aforementioned|aforesaid)\s+{T}\s*(\d+)",
    r"\b{T}\s*(\d+)\s*(?:above|below|shown|presented)",
    // data-oriented phrasing
    r"\b(?:data|results|statistics)\s+(?:in|from|of)\s+{T}\s*(\d+)",
    r"\b(?:summarized|presented|listed|shown|reported)\s+in\s+{T}\s*(\d+)",
    r"如\s*{T}\s*(\d+)\s*所示",
    r"见\s*{T}\s*(\d+)",
    r"参见\s*{T}\s*(\d+)",
    r"\(见\s*{T}\s*(\d+)\)",
    r"\(参见\s*{T}\s*(\d+)\)",
    r"表\s*(\d+)",
    r"第\s*(\d+)\s*表",
    r"见表\s*(\d+)",
    r"如表\s*(\d+)\s*所示",
    r"参见表\s*(\d+)",
    r"\(表\s*(\d+)\)",
    r"\(见表\s*(\d+)\)",
    r"\btab\s*(\d+)",
    r"\bTable\s*(\d+)",
    r"table\s*(\d+)",
    r"{T}\s*(\d+)[,，.]",
    r"{T}\s*(\d+)[：:]",
    r"\bin\s+{T}\s*(\d+)",
    r"\bfrom\s+{T}\s*(\d+)",
    r"\bof\s+{T}\s*(\d+)",
    r"\b{T}\s*(\d+)\s*(?:demonstrates|reveals|indicates|suggests|provides)",
    r"\baccording to\s+{T}\s*(\d+)",
    r"\bbased on\s+{T}\s*(\d+)",
];

/// One citation pattern. Capture group 1 is the printed number.
#[derive(Debug)]
pub struct RefPattern {
    pub kind: RefKind,
    pub regex: Regex,
}

fn compile(kind: RefKind, token: &str, sources: &[&str]) -> Vec<RefPattern> {
    sources
        .iter()
        .map(|source| RefPattern {
            kind,
            regex: Regex::new(&format!("(?i){}", source.replace("{T}", token)))
                .expect("built-in reference pattern must compile"),
        })
        .collect()
}

lazy_static! {
    /// Figure patterns first, then table patterns.
    pub static ref REFERENCE_PATTERNS: Vec<RefPattern> = {
        let mut patterns = compile(RefKind::Figure, FIGURE_TOKEN, FIGURE_PATTERNS);
        patterns.extend(compile(RefKind::Table, TABLE_TOKEN, TABLE_PATTERNS));
        patterns
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        let figures = REFERENCE_PATTERNS
            .iter()
            .filter(|p| p.kind == RefKind::Figure)
            .count();
        assert_eq!(figures, FIGURE_PATTERNS.len());
        assert_eq!(
            REFERENCE_PATTERNS.len(),
            FIGURE_PATTERNS.len() + TABLE_PATTERNS.len()
        );
    }

    #[test]
    fn every_pattern_captures_a_number() {
        for pattern in REFERENCE_PATTERNS.iter() {
            assert!(
                pattern.regex.captures_len() >= 2,
                "pattern {} has no number group",
                pattern.regex.as_str()
            );
        }
    }
}
