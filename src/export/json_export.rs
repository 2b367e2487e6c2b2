use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::core::model::DocumentResult;
use crate::export::Exporter;

/// Writes `merged.json`, `matches.json` and, when lanes were assigned, `figure_map.json`.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let data = serde_json::to_string_pretty(value)?;
        fs::write(self.out_dir.join(name), data)?;
        Ok(())
    }
}

impl Exporter for JsonExporter {
    fn export(&self, result: &DocumentResult) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        self.write("merged.json", &result.merged)?;
        self.write("matches.json", &result.matching)?;
        if let Some(figure_map) = &result.figure_map {
            self.write("figure_map.json", figure_map)?;
        }
        Ok(())
    }
}
