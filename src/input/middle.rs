use std::collections::HashMap;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::core::geometry::BBox;
use crate::core::model::{BlockSource, MiddleBlock, IMAGE_CAPTION, TABLE_CAPTION};
use crate::input::{InputError, Result};

const LINE_BREAK_DASHES: [char; 3] = ['-', '—', '–'];
const TERMINAL_PUNCTUATION: [char; 4] = ['.', '!', '?', ':'];

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    page_idx: Option<usize>,
    #[serde(default)]
    preproc_blocks: Vec<RawBlock>,
    #[serde(default)]
    para_blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    bbox: Option<Vec<f32>>,
    #[serde(default)]
    lines: Vec<RawLine>,
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
struct RawLine {
    #[serde(default)]
    spans: Vec<RawSpan>,
}

#[derive(Debug, Deserialize)]
struct RawSpan {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    bbox: Option<Vec<f32>>,
}

/// Flattened blocks of one page, kept per source list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageBlocks {
    pub preproc_blocks: Vec<MiddleBlock>,
    pub para_blocks: Vec<MiddleBlock>,
}

impl PageBlocks {
    pub fn blocks(&self, source: BlockSource) -> &[MiddleBlock] {
        match source {
            BlockSource::PreprocBlocks => &self.preproc_blocks,
            BlockSource::ParaBlocks => &self.para_blocks,
        }
    }

    /// Every block with its source, preprocessing list first.
    pub fn iter(&self) -> impl Iterator<Item = (BlockSource, &MiddleBlock)> + '_ {
        BlockSource::ORDER
            .into_iter()
            .flat_map(move |source| self.blocks(source).iter().map(move |block| (source, block)))
    }
}

/// Page number to the flattened geometric blocks of that page.
pub type PageIndex = HashMap<usize, PageBlocks>;

/// Builds the page index from a middle structure (`{"pdf_info": [...]}`).
pub fn build_page_index(middle: &Value) -> Result<PageIndex> {
    let pages = middle
        .get("pdf_info")
        .and_then(Value::as_array)
        .ok_or(InputError::MissingPdfInfo)?;

    let mut index = PageIndex::new();
    for (position, page) in pages.iter().enumerate() {
        if !page.is_object() {
            warn!("skipping pdf_info entry {position}: not an object");
            continue;
        }
        let raw: RawPage =
            serde_json::from_value(page.clone()).map_err(|err| InputError::InvalidPage {
                index: position,
                reason: err.to_string(),
            })?;
        let page_idx = raw.page_idx.unwrap_or(position);
        let blocks = PageBlocks {
            preproc_blocks: flatten_blocks(&raw.preproc_blocks),
            para_blocks: flatten_blocks(&raw.para_blocks),
        };
        debug!(
            "page {page_idx}: {} preproc blocks, {} para blocks, {} captions",
            blocks.preproc_blocks.len(),
            blocks.para_blocks.len(),
            blocks.iter().filter(|(_, b)| b.is_caption()).count()
        );
        index.insert(page_idx, blocks);
    }
    Ok(index)
}

pub fn read_middle(json: &str) -> Result<PageIndex> {
    build_page_index(&serde_json::from_str(json)?)
}

/// Each top-level block followed by the caption blocks nested one level inside it.
fn flatten_blocks(blocks: &[RawBlock]) -> Vec<MiddleBlock> {
    let mut flat = Vec::with_capacity(blocks.len());
    for block in blocks {
        flat.push(to_middle_block(block));
        flat.extend(
            block
                .blocks
                .iter()
                .filter(|child| child.kind == IMAGE_CAPTION || child.kind == TABLE_CAPTION)
                .map(to_middle_block),
        );
    }
    flat
}

fn to_middle_block(block: &RawBlock) -> MiddleBlock {
    MiddleBlock {
        kind: block.kind.clone(),
        bbox: block.bbox.as_deref().and_then(BBox::from_slice),
        content: reconstruct_text(&block.lines),
        first_span_bbox: first_span_bbox(&block.lines),
    }
}

fn first_span_bbox(lines: &[RawLine]) -> Option<BBox> {
    lines
        .first()?
        .spans
        .first()?
        .bbox
        .as_deref()
        .and_then(BBox::from_slice)
}

/// Joins span text into block text, repairing words broken across lines.
fn reconstruct_text(lines: &[RawLine]) -> String {
    let mut result = String::new();
    for (i, line) in lines
        .iter()
        .filter_map(|line| line_text(&line.spans))
        .enumerate()
    {
        if i > 0
            && !result.ends_with(LINE_BREAK_DASHES)
            && result.ends_with(TERMINAL_PUNCTUATION)
        {
            result.push(' ');
        }
        result.push_str(&line);
    }
    result
}

fn line_text(spans: &[RawSpan]) -> Option<String> {
    let parts: Vec<&str> = spans
        .iter()
        .filter_map(|span| span.content.as_deref())
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .collect();
    if parts.is_empty() {
        return None;
    }
    let mut text = parts.join(" ");
    if text.ends_with(LINE_BREAK_DASHES) {
        text.pop();
    }
    Some(text)
}
