use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{DocumentResult, FigureMatchResult, MergedRecord};
use crate::export::Exporter;

/// Human-readable summary in `summary.txt`, plus `figure_map.txt` when lanes were assigned.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn format_figure(result: &FigureMatchResult, record: Option<&MergedRecord>) -> String {
        let location = match record.and_then(|r| r.bbox) {
            Some(bbox) => format!(
                "[{} at page:{} x:{:.0} y:{:.0} w:{:.0} h:{:.0}]",
                result.figure_type.as_str().to_uppercase(),
                result.page_idx + 1,
                bbox.x0,
                bbox.y0,
                bbox.width(),
                bbox.height()
            ),
            None => format!(
                "[{} at page:{}]",
                result.figure_type.as_str().to_uppercase(),
                result.page_idx + 1
            ),
        };
        let mut text = format!("{location} {}\n  {}", result.figure_id, result.figure_caption);
        for m in &result.matches {
            text.push_str(&format!(
                "\n  - ({:.1}, {} pages) {}",
                m.confidence_score, m.page_distance, m.reference_text
            ));
        }
        text
    }

    fn figure_record<'a>(
        result: &FigureMatchResult,
        merged: &'a [MergedRecord],
    ) -> Option<&'a MergedRecord> {
        merged.iter().find(|record| {
            record.item.page_idx == result.page_idx && record.item.caption == result.figure_caption
        })
    }
}

impl Exporter for TextExporter {
    fn export(&self, result: &DocumentResult) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        let matched = result.merged.iter().filter(|r| r.is_matched()).count();
        let mut summary = format!(
            "=== {} ===\n\nrecords: {} ({} matched)\nfigures: {} ({} with references)\n\n",
            result.matching.document_id,
            result.merged.len(),
            matched,
            result.matching.total_figures,
            result.matching.statistics.figures_with_matches
        );
        for figure in &result.matching.results {
            let record = Self::figure_record(figure, &result.merged);
            summary.push_str(&Self::format_figure(figure, record));
            summary.push_str("\n\n");
        }
        fs::write(self.out_dir.join("summary.txt"), summary)?;

        if let Some(figure_map) = &result.figure_map {
            let mut lanes = String::new();
            for (lane, figures) in figure_map {
                lanes.push_str(&format!("=== {lane} ({}) ===\n", figures.len()));
                for figure in figures {
                    lanes.push_str(&format!(
                        "{}: {} ({} references)\n",
                        figure.figure_id,
                        figure.figure_caption,
                        figure.reference_text.len()
                    ));
                }
                lanes.push('\n');
            }
            fs::write(self.out_dir.join("figure_map.txt"), lanes)?;
        }

        Ok(())
    }
}
