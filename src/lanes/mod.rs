//! Assigns matched figures to the thematic lane whose text mentions them.

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

use crate::core::model::{AssetMap, FigureEntry, FigureMap, FigureMatchResult, LaneTexts, MatchingReport};

lazy_static! {
    static ref CAPTION_PREFIX: Regex = Regex::new(r"(?i)^(Figure|Fig|Table|Tab)\s*\d+[:\-.]?\s*").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref FIRST_NUMBER: Regex = Regex::new(r"(\d+)").unwrap();
}

pub const DEFAULT_LANES: [&str; 4] = [
    "Context & Related Work",
    "Methodology & Setup",
    "Results & Analysis",
    "Conclusion",
];

/// How a figure was tied to its lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneEvidence {
    Caption,
    FileName,
    Number,
}

#[derive(Debug, Clone, Default)]
pub struct LaneAssigner;

impl LaneAssigner {
    pub fn new() -> Self {
        Self
    }

    /// Every lane of `lane_texts` appears in the result, in the same order.
    /// Figures no lane mentions are left out.
    pub fn assign(
        &self,
        report: &MatchingReport,
        lane_texts: &LaneTexts,
        assets: &AssetMap,
    ) -> FigureMap {
        let mut figure_map: FigureMap = lane_texts
            .keys()
            .map(|lane| (lane.clone(), Vec::new()))
            .collect();

        for result in &report.results {
            match determine_lane(&result.figure_caption, &result.figure_id, lane_texts) {
                Some((lane, evidence)) => {
                    debug!("{} -> {lane} ({evidence:?})", result.figure_id);
                    if let Some(entries) = figure_map.get_mut(lane) {
                        entries.push(entry(result, assets));
                    }
                }
                None => debug!("{} not found in any lane", result.figure_id),
            }
        }

        for (lane, figures) in &figure_map {
            info!("{lane}: {} figures", figures.len());
        }
        figure_map
    }
}

fn entry(result: &FigureMatchResult, assets: &AssetMap) -> FigureEntry {
    FigureEntry {
        figure_id: result.figure_id.clone(),
        figure_caption: result.figure_caption.clone(),
        reference_text: result
            .matches
            .iter()
            .map(|m| m.reference_text.clone())
            .collect(),
        figure_base64: assets.get(&result.figure_id).cloned().unwrap_or_default(),
    }
}

/// First lane containing the cleaned caption, else the figure id, else "figure N"/"table N".
pub fn determine_lane<'l>(
    caption: &str,
    figure_id: &str,
    lane_texts: &'l LaneTexts,
) -> Option<(&'l str, LaneEvidence)> {
    if caption.trim().is_empty() {
        return None;
    }
    let lanes: Vec<(&'l str, String)> = lane_texts
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(lane, text)| (lane.as_str(), text.to_lowercase()))
        .collect();

    let caption = clean_caption(caption).to_lowercase();
    if !caption.is_empty() {
        if let Some((lane, _)) = lanes.iter().find(|(_, text)| text.contains(&caption)) {
            return Some((*lane, LaneEvidence::Caption));
        }
    }

    let id = figure_id.to_lowercase();
    if let Some((lane, _)) = lanes.iter().find(|(_, text)| text.contains(&id)) {
        return Some((*lane, LaneEvidence::FileName));
    }

    let number = FIRST_NUMBER.captures(figure_id)?.get(1)?.as_str();
    let figure_phrase = format!("figure {number}");
    let table_phrase = format!("table {number}");
    lanes
        .iter()
        .find(|(_, text)| text.contains(&figure_phrase) || text.contains(&table_phrase))
        .map(|(lane, _)| (*lane, LaneEvidence::Number))
}

/// Drops a leading "Figure 3:"-style label and collapses whitespace.
pub fn clean_caption(caption: &str) -> String {
    let stripped = CAPTION_PREFIX.replace(caption, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}
