use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::model::{AssetMap, ContentItem, DocumentResult, LaneTexts};
use crate::export::json_export::JsonExporter;
use crate::export::text_export::TextExporter;
use crate::export::Exporter;
use crate::fusion::{ReconcileConfig, SimpleReconciler, StructureReconciler};
use crate::input::{read_content_list, read_middle, PageIndex};
use crate::lanes::{LaneAssigner, DEFAULT_LANES};
use crate::matching::MatchingPipeline;
use crate::references::ExtractorConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub reconcile: ReconcileConfig,
    pub extractor: ExtractorConfig,
    /// Lane priority order. Lanes only present in the lane texts follow these.
    pub lanes: Vec<String>,
    pub document_id: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reconcile: ReconcileConfig::default(),
            extractor: ExtractorConfig::default(),
            lanes: DEFAULT_LANES.iter().map(|lane| lane.to_string()).collect(),
            document_id: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn document_id(&self) -> &str {
        self.document_id.as_deref().unwrap_or("unknown")
    }

    /// Configured lanes first (empty text when absent), then any others in their given order.
    pub fn order_lanes(&self, lane_texts: LaneTexts) -> LaneTexts {
        let mut remaining = lane_texts;
        let mut ordered: LaneTexts = self
            .lanes
            .iter()
            .map(|lane| {
                let text = remaining.shift_remove(lane).unwrap_or_default();
                (lane.clone(), text)
            })
            .collect();
        ordered.extend(remaining);
        ordered
    }
}

/// Parsed inputs of one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentInputs {
    pub content_list: Vec<ContentItem>,
    pub pages: PageIndex,
    pub lane_texts: Option<LaneTexts>,
    pub assets: AssetMap,
}

#[derive(Debug, Clone, Default)]
pub struct InputPaths {
    pub content_list: PathBuf,
    pub middle: PathBuf,
    pub lanes: Option<PathBuf>,
    pub assets: Option<PathBuf>,
}

pub fn load_inputs(paths: &InputPaths) -> Result<DocumentInputs> {
    let content_list = read_content_list(&read(&paths.content_list)?)
        .with_context(|| format!("invalid content list {}", paths.content_list.display()))?;
    let pages = read_middle(&read(&paths.middle)?)
        .with_context(|| format!("invalid middle structure {}", paths.middle.display()))?;
    let lane_texts = paths
        .lanes
        .as_deref()
        .map(|path| {
            serde_json::from_str::<LaneTexts>(&read(path)?)
                .with_context(|| format!("invalid lane texts {}", path.display()))
        })
        .transpose()?;
    let assets = match paths.assets.as_deref() {
        Some(path) => serde_json::from_str::<AssetMap>(&read(path)?)
            .with_context(|| format!("invalid asset map {}", path.display()))?,
        None => AssetMap::new(),
    };

    Ok(DocumentInputs {
        content_list,
        pages,
        lane_texts,
        assets,
    })
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Reconcile, match, and (when lane texts are present) assign figures to lanes.
pub fn build_figure_map(config: &PipelineConfig, inputs: &DocumentInputs) -> DocumentResult {
    let reconciler = SimpleReconciler::new(config.reconcile.clone());
    let merged = reconciler.reconcile(&inputs.content_list, &inputs.pages);

    let matching = MatchingPipeline::new(config.extractor.clone()).run(&merged, config.document_id());

    let figure_map = inputs.lane_texts.as_ref().map(|lane_texts| {
        let lanes = config.order_lanes(lane_texts.clone());
        LaneAssigner::new().assign(&matching, &lanes, &inputs.assets)
    });

    DocumentResult {
        merged,
        matching,
        figure_map,
    }
}

pub fn export_outputs(result: &DocumentResult, output: &Path) -> Result<()> {
    let json_exporter = JsonExporter::new(output.to_path_buf());
    json_exporter.export(result)?;

    let text_exporter = TextExporter::new(output.to_path_buf());
    text_exporter.export(result)?;

    Ok(())
}
