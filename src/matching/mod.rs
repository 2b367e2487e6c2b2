//! Links figures and tables to the sentences that cite them.
//!
//! Figures come from merged image/table records with a caption; references
//! come from merged text records. A figure matches every distinct sentence
//! citing its exact number and kind, weighted by how far apart they are.

use std::collections::HashSet;
use std::path::Path;

use log::{debug, info};

use crate::core::confidence::position_weight;
use crate::core::model::{
    ContentKind, Figure, FigureKind, FigureMatchResult, Match, MatchingReport, MergedRecord,
    Reference,
};
use crate::fusion::align::truncate;
use crate::references::{
    dedup_references, kind_from_caption, number_from_caption, ExtractorConfig, ReferenceExtractor,
};

#[derive(Debug, Clone, Default)]
pub struct MatchingPipeline {
    extractor: ReferenceExtractor,
}

impl MatchingPipeline {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            extractor: ReferenceExtractor::new(config),
        }
    }

    pub fn run(&self, records: &[MergedRecord], document_id: &str) -> MatchingReport {
        let figures = extract_figures(records);
        info!(
            "found {} images, {} tables",
            figures.iter().filter(|f| f.kind == FigureKind::Image).count(),
            figures.iter().filter(|f| f.kind == FigureKind::Table).count()
        );

        let references = self.extract_references(records);
        info!("extracted {} unique references", references.len());

        let results = figures
            .iter()
            .map(|figure| FigureMatchResult {
                figure_id: figure.id.clone(),
                figure_caption: figure.caption.clone(),
                figure_type: figure.kind,
                page_idx: figure.page_idx,
                matches: match_figure(figure, &references),
            })
            .collect();

        MatchingReport::new(document_id, results)
    }

    /// Citations from every text record, located on that record's page and box.
    pub fn extract_references(&self, records: &[MergedRecord]) -> Vec<Reference> {
        let located = records
            .iter()
            .filter(|record| record.item.kind == ContentKind::Text && !record.item.text.is_empty())
            .flat_map(|record| {
                self.extractor
                    .extract(&record.item.text)
                    .into_iter()
                    .map(move |reference| Reference {
                        page_idx: record.item.page_idx,
                        bbox: record.bbox,
                        ..reference
                    })
            })
            .collect();
        dedup_references(located)
    }
}

/// One figure per captioned image or table record.
pub fn extract_figures(records: &[MergedRecord]) -> Vec<Figure> {
    records
        .iter()
        .filter_map(|record| {
            let kind = match record.item.kind {
                ContentKind::Image => FigureKind::Image,
                ContentKind::Table => FigureKind::Table,
                _ => return None,
            };
            if record.item.caption.is_empty() {
                return None;
            }
            let id = id_from_path(record.item.img_path.as_deref());
            debug!("{} {id} from {:?}", kind.as_str(), record.item.img_path);
            Some(Figure {
                id,
                caption: record.item.caption.clone(),
                kind,
                page_idx: record.item.page_idx,
                bbox: record.bbox,
            })
        })
        .collect()
}

/// File stem of an asset path, or `"unknown"`.
pub fn id_from_path(path: Option<&str>) -> String {
    path.filter(|p| !p.is_empty())
        .and_then(|p| Path::new(p).file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Matches sorted by descending weight; equal weights keep discovery order.
pub fn match_figure(figure: &Figure, references: &[Reference]) -> Vec<Match> {
    let (Some(number), Some(kind)) = (
        number_from_caption(&figure.caption),
        kind_from_caption(&figure.caption),
    ) else {
        debug!("no number in caption: {:?}", truncate(&figure.caption, 50));
        return Vec::new();
    };

    let mut seen_sentences = HashSet::new();
    let mut matches: Vec<Match> = references
        .iter()
        .filter(|r| r.number == number && r.ref_type == kind)
        .filter(|r| seen_sentences.insert(r.sentence.trim().to_string()))
        .map(|r| {
            let weight = position_weight(
                figure.page_idx,
                figure.bbox.as_ref(),
                r.page_idx,
                r.bbox.as_ref(),
            );
            Match {
                reference_text: r.sentence.clone(),
                match_text: r.match_text.clone(),
                page_distance: figure.page_idx.abs_diff(r.page_idx),
                position_weight: weight,
                confidence_score: weight,
            }
        })
        .collect();

    matches.sort_by(|a, b| b.position_weight.total_cmp(&a.position_weight));
    debug!(
        "{} {number}: {} matches",
        kind.as_str(),
        matches.len()
    );
    matches
}
