pub mod core;
pub mod export;
pub mod fusion;
pub mod input;
pub mod lanes;
pub mod matching;
pub mod pipeline;
pub mod references;

pub use crate::core::model::{DocumentResult, FigureMap, MatchingReport, MergedRecord};
pub use pipeline::{build_figure_map, PipelineConfig};
