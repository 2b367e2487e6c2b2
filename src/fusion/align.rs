use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::core::model::{BlockSource, ContentItem, FigureKind, MatchMethod, MiddleBlock};
use crate::fusion::compare::{kind_compatible, text_similarity};
use crate::fusion::ReconcileConfig;
use crate::input::PageBlocks;

lazy_static! {
    static ref FIGURE_NUMBER: Regex = Regex::new(r"figure\s*(\d+)").unwrap();
    static ref TABLE_NUMBER: Regex = Regex::new(r"table\s*(\d+)").unwrap();
}

/// The block a content item was aligned to, and how.
#[derive(Debug, Clone, Copy)]
pub struct Alignment<'a> {
    pub block: &'a MiddleBlock,
    pub source: BlockSource,
    pub confidence: f32,
    pub method: MatchMethod,
    pub type_matched: bool,
}

/// Finds the caption block of an image or table on its page.
///
/// Falls back to comparing figure/table numbers when no caption block is similar enough.
pub fn align_caption<'a>(
    caption: &str,
    kind: FigureKind,
    page: &'a PageBlocks,
    config: &ReconcileConfig,
) -> Option<Alignment<'a>> {
    if caption.trim().is_empty() {
        debug!("empty {} caption, skipping", kind.as_str());
        return None;
    }

    let mut best: Option<Alignment<'a>> = None;
    let mut best_score = 0.0;
    let mut candidates = 0;
    for (source, block) in caption_blocks(page, kind) {
        candidates += 1;
        let similarity = text_similarity(caption, &block.content);
        debug!("  candidate {:?} similarity {similarity:.3}", truncate(&block.content, 80));
        if similarity > best_score && similarity > config.caption_threshold {
            best_score = similarity;
            best = Some(Alignment {
                block,
                source,
                confidence: similarity,
                method: MatchMethod::Caption(kind, source),
                type_matched: true,
            });
        }
    }

    if best.is_none() {
        debug!("no caption above threshold among {candidates} candidates, trying number fallback");
        best = align_by_number(caption, kind, page, config);
    }
    best
}

fn align_by_number<'a>(
    caption: &str,
    kind: FigureKind,
    page: &'a PageBlocks,
    config: &ReconcileConfig,
) -> Option<Alignment<'a>> {
    let anchor = kind.anchor();
    let caption = caption.to_lowercase();
    if !caption.contains(anchor) {
        return None;
    }
    let wanted = leading_number(&caption, kind)?;

    caption_blocks(page, kind).find_map(|(source, block)| {
        let content = block.content.to_lowercase();
        if !content.contains(anchor) || leading_number(&content, kind)? != wanted {
            return None;
        }
        debug!("  number match: {anchor} {wanted}");
        Some(Alignment {
            block,
            source,
            confidence: config.fallback_confidence,
            method: MatchMethod::NumberFallback(kind, source),
            type_matched: true,
        })
    })
}

fn leading_number<'t>(lowercase: &'t str, kind: FigureKind) -> Option<&'t str> {
    let pattern = match kind {
        FigureKind::Image => &*FIGURE_NUMBER,
        FigureKind::Table => &*TABLE_NUMBER,
    };
    pattern
        .captures(lowercase)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn caption_blocks(
    page: &PageBlocks,
    kind: FigureKind,
) -> impl Iterator<Item = (BlockSource, &MiddleBlock)> + '_ {
    page.iter()
        .filter(move |(_, block)| block.kind == kind.caption_block())
}

/// Aligns a text-like item with the most similar block on its page, favouring compatible block types.
pub fn align_text<'a>(
    item: &ContentItem,
    page: &'a PageBlocks,
    config: &ReconcileConfig,
) -> Option<Alignment<'a>> {
    let text = item.text.trim();
    let mut best: Option<Alignment<'a>> = None;
    let mut best_score = 0.0;

    for (source, block) in page.iter() {
        let similarity = text_similarity(text, &block.content);
        let type_matched = kind_compatible(&item.kind, &block.kind);
        let score = if type_matched {
            similarity + config.type_bonus
        } else {
            similarity
        };
        if score > best_score && similarity > config.text_threshold {
            best_score = score;
            best = Some(Alignment {
                block,
                source,
                confidence: similarity,
                method: MatchMethod::Similarity(source),
                type_matched,
            });
        }
    }
    best
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use crate::core::model::{ContentKind, IMAGE_CAPTION, TABLE_CAPTION};

    fn block(kind: &str, content: &str) -> MiddleBlock {
        MiddleBlock {
            kind: kind.to_string(),
            bbox: Some(BBox::new(0.0, 0.0, 100.0, 20.0)),
            content: content.to_string(),
            first_span_bbox: None,
        }
    }

    #[test]
    fn caption_prefers_preproc_list_on_ties() {
        let page = PageBlocks {
            preproc_blocks: vec![block(IMAGE_CAPTION, "Figure 1: Overview of the pipeline")],
            para_blocks: vec![block(IMAGE_CAPTION, "Figure 1: Overview of the pipeline")],
        };
        let config = ReconcileConfig::default();
        let found = align_caption("Figure 1: Overview of the pipeline", FigureKind::Image, &page, &config)
            .expect("caption should align");
        assert_eq!(found.source, BlockSource::PreprocBlocks);
        assert_eq!(found.method, MatchMethod::Caption(FigureKind::Image, BlockSource::PreprocBlocks));
        assert!(found.confidence > config.caption_threshold);
    }

    #[test]
    fn caption_ignores_other_caption_kinds() {
        let page = PageBlocks {
            preproc_blocks: vec![block(TABLE_CAPTION, "Figure 1: Overview of the pipeline")],
            para_blocks: vec![],
        };
        let found = align_caption(
            "Figure 1: Overview of the pipeline",
            FigureKind::Image,
            &page,
            &ReconcileConfig::default(),
        );
        assert!(found.is_none());
    }

    #[test]
    fn number_fallback_uses_fixed_confidence() {
        let page = PageBlocks {
            preproc_blocks: vec![block(TABLE_CAPTION, "Table 3")],
            para_blocks: vec![block(
                TABLE_CAPTION,
                "TABLE 3 ZZZZ QQQQ XXXX WWWW VVVV KKKK JJJJ PPPP",
            )],
        };
        let caption = "table 3 accuracy of baselines over every benchmark split";
        let config = ReconcileConfig {
            caption_threshold: 0.95,
            ..ReconcileConfig::default()
        };
        let found = align_caption(caption, FigureKind::Table, &page, &config).expect("fallback should fire");
        assert_eq!(found.confidence, 0.8);
        assert_eq!(
            found.method,
            MatchMethod::NumberFallback(FigureKind::Table, BlockSource::PreprocBlocks)
        );
    }

    #[test]
    fn number_fallback_needs_keyword() {
        let page = PageBlocks {
            preproc_blocks: vec![block(IMAGE_CAPTION, "Fig. 9 Something else entirely")],
            para_blocks: vec![],
        };
        let config = ReconcileConfig {
            caption_threshold: 0.99,
            ..ReconcileConfig::default()
        };
        assert!(align_caption("Fig. 9 Results", FigureKind::Image, &page, &config).is_none());
    }

    #[test]
    fn text_alignment_applies_type_bonus() {
        let body = "Transformers process the whole sequence in parallel using attention.";
        let page = PageBlocks {
            preproc_blocks: vec![block("title", body)],
            para_blocks: vec![block("text", body)],
        };
        let item = ContentItem::text(ContentKind::Text, 0, body);
        let found = align_text(&item, &page, &ReconcileConfig::default()).expect("text should align");
        assert_eq!(found.source, BlockSource::ParaBlocks);
        assert!(found.type_matched);
        assert_eq!(found.method, MatchMethod::Similarity(BlockSource::ParaBlocks));
    }

    #[test]
    fn text_alignment_requires_threshold() {
        let page = PageBlocks {
            preproc_blocks: vec![block("text", "Completely unrelated acknowledgements section")],
            para_blocks: vec![],
        };
        let item = ContentItem::text(ContentKind::Text, 0, "Our method improves accuracy by 4 points.");
        assert!(align_text(&item, &page, &ReconcileConfig::default()).is_none());
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("图表结果", 2), "图表");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
