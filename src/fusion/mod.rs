pub mod align;
pub mod compare;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::model::{ContentItem, ContentKind, FigureKind, MergedRecord};
use crate::fusion::align::{align_caption, align_text, truncate, Alignment};
use crate::input::PageIndex;

/// Acceptance thresholds for aligning content items with middle-structure blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Minimum similarity for text and title items.
    pub text_threshold: f32,
    /// Minimum similarity for image and table captions.
    pub caption_threshold: f32,
    /// Score bonus when content kind and block type agree.
    pub type_bonus: f32,
    /// Confidence assigned when captions align by figure/table number.
    pub fallback_confidence: f32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            text_threshold: 0.6,
            caption_threshold: 0.2,
            type_bonus: 0.2,
            fallback_confidence: 0.8,
        }
    }
}

pub trait StructureReconciler {
    /// One record per content item, in input order.
    fn reconcile(&self, items: &[ContentItem], index: &PageIndex) -> Vec<MergedRecord>;
}

#[derive(Debug, Clone, Default)]
pub struct SimpleReconciler {
    config: ReconcileConfig,
}

impl SimpleReconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    fn align_item<'a>(&self, item: &ContentItem, index: &'a PageIndex) -> Option<Alignment<'a>> {
        if item.plain {
            return None;
        }
        let page = index.get(&item.page_idx)?;
        match item.kind {
            ContentKind::Image => align_caption(&item.caption, FigureKind::Image, page, &self.config),
            ContentKind::Table => align_caption(&item.caption, FigureKind::Table, page, &self.config),
            _ => align_text(item, page, &self.config),
        }
    }
}

impl StructureReconciler for SimpleReconciler {
    fn reconcile(&self, items: &[ContentItem], index: &PageIndex) -> Vec<MergedRecord> {
        let records: Vec<MergedRecord> = items
            .iter()
            .map(|item| match self.align_item(item, index) {
                Some(alignment) => {
                    debug!(
                        "matched {} on page {}: {} ({:.3})",
                        item.kind.as_str(),
                        item.page_idx,
                        alignment.method,
                        alignment.confidence
                    );
                    merge(item.clone(), alignment)
                }
                None => {
                    let label = if item.caption.is_empty() { &item.text } else { &item.caption };
                    debug!(
                        "unmatched {} on page {}: {:?}",
                        item.kind.as_str(),
                        item.page_idx,
                        truncate(label, 50)
                    );
                    MergedRecord::unmatched(item.clone())
                }
            })
            .collect();

        let summary = ReconcileSummary::from_records(&records);
        info!(
            "reconciled {} records, {} matched ({:.1}%)",
            summary.total,
            summary.matched,
            summary.match_rate * 100.0
        );
        records
    }
}

fn merge(item: ContentItem, alignment: Alignment<'_>) -> MergedRecord {
    MergedRecord {
        item,
        bbox: alignment.block.bbox,
        first_span_bbox: alignment.block.first_span_bbox,
        middle_type: Some(alignment.block.kind.clone()),
        middle_content: Some(alignment.block.content.clone()),
        match_confidence: alignment.confidence.clamp(0.0, 1.0),
        match_method: alignment.method,
        type_matched: alignment.type_matched,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReconcileSummary {
    pub total: usize,
    pub matched: usize,
    pub match_rate: f32,
}

impl ReconcileSummary {
    pub fn from_records(records: &[MergedRecord]) -> Self {
        let total = records.len();
        let matched = records.iter().filter(|r| r.is_matched()).count();
        let match_rate = if total == 0 {
            0.0
        } else {
            matched as f32 / total as f32
        };
        Self {
            total,
            matched,
            match_rate,
        }
    }
}
