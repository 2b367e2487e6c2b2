use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::geometry::BBox;

pub const IMAGE_CAPTION: &str = "image_caption";
pub const TABLE_CAPTION: &str = "table_caption";

/// Lane name to the aggregated raw text of that lane, in lane priority order.
pub type LaneTexts = IndexMap<String, String>;

/// Asset id (file stem) to its encoded payload.
pub type AssetMap = HashMap<String, String>;

/// Lane name to the figures it owns.
pub type FigureMap = IndexMap<String, Vec<FigureEntry>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Text,
    Image,
    Table,
    Title,
    Other(String),
}

impl ContentKind {
    pub fn as_str(&self) -> &str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Image => "image",
            ContentKind::Table => "table",
            ContentKind::Title => "title",
            ContentKind::Other(name) => name,
        }
    }
}

impl From<String> for ContentKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => ContentKind::Text,
            "image" => ContentKind::Image,
            "table" => ContentKind::Table,
            "title" => ContentKind::Title,
            _ => ContentKind::Other(value),
        }
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One flat unit of the content list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub page_idx: usize,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Image or table caption, list forms already joined with spaces.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_path: Option<String>,
    /// Bare-string entry of the content list. Carries no page and is never matched.
    #[serde(skip)]
    pub plain: bool,
}

impl ContentItem {
    pub fn text(kind: ContentKind, page_idx: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            page_idx,
            text: text.into(),
            caption: String::new(),
            img_path: None,
            plain: false,
        }
    }

    pub fn captioned(
        kind: ContentKind,
        page_idx: usize,
        caption: impl Into<String>,
        img_path: Option<String>,
    ) -> Self {
        Self {
            kind,
            page_idx,
            text: String::new(),
            caption: caption.into(),
            img_path,
            plain: false,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain: true,
            ..Self::text(ContentKind::Text, 0, text)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource {
    PreprocBlocks,
    ParaBlocks,
}

impl BlockSource {
    /// Search order used by every matching strategy.
    pub const ORDER: [BlockSource; 2] = [BlockSource::PreprocBlocks, BlockSource::ParaBlocks];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockSource::PreprocBlocks => "preproc_blocks",
            BlockSource::ParaBlocks => "para_blocks",
        }
    }
}

/// A flattened geometric block of the middle structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiddleBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub bbox: Option<BBox>,
    pub content: String,
    pub first_span_bbox: Option<BBox>,
}

impl MiddleBlock {
    pub fn is_caption(&self) -> bool {
        self.kind == IMAGE_CAPTION || self.kind == TABLE_CAPTION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureKind {
    Image,
    Table,
}

impl FigureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FigureKind::Image => "image",
            FigureKind::Table => "table",
        }
    }

    pub fn caption_block(&self) -> &'static str {
        match self {
            FigureKind::Image => IMAGE_CAPTION,
            FigureKind::Table => TABLE_CAPTION,
        }
    }

    /// Keyword both captions must contain for the number fallback.
    pub fn anchor(&self) -> &'static str {
        match self {
            FigureKind::Image => "figure",
            FigureKind::Table => "table",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Figure,
    Table,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Figure => "figure",
            RefKind::Table => "table",
        }
    }
}

/// Which strategy produced a merged record's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum MatchMethod {
    Similarity(BlockSource),
    Caption(FigureKind, BlockSource),
    NumberFallback(FigureKind, BlockSource),
    NoMatch,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::Similarity(source) => write!(f, "{}_similarity", source.as_str()),
            MatchMethod::Caption(kind, source) => {
                write!(f, "{}_{}", kind.caption_block(), source.as_str())
            }
            MatchMethod::NumberFallback(kind, source) => {
                write!(f, "{}_number_{}", kind.anchor(), source.as_str())
            }
            MatchMethod::NoMatch => f.write_str("no_match"),
        }
    }
}

impl From<MatchMethod> for String {
    fn from(method: MatchMethod) -> Self {
        method.to_string()
    }
}

/// A content item enriched with the geometry of the block it was aligned to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    #[serde(flatten)]
    pub item: ContentItem,
    pub bbox: Option<BBox>,
    pub first_span_bbox: Option<BBox>,
    pub middle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_content: Option<String>,
    pub match_confidence: f32,
    pub match_method: MatchMethod,
    pub type_matched: bool,
}

impl MergedRecord {
    pub fn unmatched(item: ContentItem) -> Self {
        Self {
            item,
            bbox: None,
            first_span_bbox: None,
            middle_type: None,
            middle_content: None,
            match_confidence: 0.0,
            match_method: MatchMethod::NoMatch,
            type_matched: false,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.match_method != MatchMethod::NoMatch
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub id: String,
    pub caption: String,
    pub kind: FigureKind,
    pub page_idx: usize,
    pub bbox: Option<BBox>,
}

/// A textual citation of a figure or table found in a sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub sentence: String,
    pub sentence_idx: usize,
    pub ref_type: RefKind,
    pub number: String,
    pub match_text: String,
    pub page_idx: usize,
    pub bbox: Option<BBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub reference_text: String,
    pub match_text: String,
    pub page_distance: usize,
    pub position_weight: f32,
    pub confidence_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureMatchResult {
    pub figure_id: String,
    pub figure_caption: String,
    pub figure_type: FigureKind,
    pub page_idx: usize,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchingStatistics {
    pub figures_with_matches: usize,
    pub figures_without_matches: usize,
    pub average_matches_per_figure: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchingReport {
    pub document_id: String,
    pub total_figures: usize,
    pub total_matches: usize,
    pub results: Vec<FigureMatchResult>,
    pub statistics: MatchingStatistics,
}

impl MatchingReport {
    pub fn new(document_id: impl Into<String>, results: Vec<FigureMatchResult>) -> Self {
        let total_figures = results.len();
        let total_matches = results.iter().map(|r| r.matches.len()).sum::<usize>();
        let figures_with_matches = results.iter().filter(|r| !r.matches.is_empty()).count();
        let average_matches_per_figure = if total_figures == 0 {
            0.0
        } else {
            total_matches as f32 / total_figures as f32
        };
        Self {
            document_id: document_id.into(),
            total_figures,
            total_matches,
            results,
            statistics: MatchingStatistics {
                figures_with_matches,
                figures_without_matches: total_figures - figures_with_matches,
                average_matches_per_figure,
            },
        }
    }
}

/// A figure as it appears in a lane of the final map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureEntry {
    pub figure_id: String,
    pub figure_caption: String,
    pub reference_text: Vec<String>,
    pub figure_base64: String,
}

/// Everything produced for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentResult {
    pub merged: Vec<MergedRecord>,
    pub matching: MatchingReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure_map: Option<FigureMap>,
}
