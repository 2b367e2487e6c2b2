use serde::Deserialize;
use serde_json::Value;

use crate::core::model::{ContentItem, ContentKind};
use crate::input::{InputError, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContentItem {
    Plain(String),
    Typed(RawTypedItem),
}

#[derive(Debug, Deserialize)]
struct RawTypedItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    page_idx: usize,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    img_caption: Option<CaptionField>,
    #[serde(default)]
    image_caption: Option<CaptionField>,
    #[serde(default)]
    table_caption: Option<CaptionField>,
    #[serde(default)]
    img_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CaptionField {
    Single(String),
    Lines(Vec<String>),
}

impl CaptionField {
    fn joined(&self) -> String {
        match self {
            CaptionField::Single(text) => text.clone(),
            CaptionField::Lines(lines) => lines.join(" "),
        }
    }
}

fn first_caption(fields: &[Option<&CaptionField>]) -> String {
    fields
        .iter()
        .flatten()
        .map(|field| field.joined())
        .find(|caption| !caption.trim().is_empty())
        .unwrap_or_default()
}

impl From<RawContentItem> for ContentItem {
    fn from(raw: RawContentItem) -> Self {
        match raw {
            RawContentItem::Plain(text) => ContentItem::plain(text),
            RawContentItem::Typed(item) => {
                let kind = ContentKind::from(item.kind.unwrap_or_else(|| "unknown".to_string()));
                match kind {
                    ContentKind::Image => {
                        let caption = first_caption(&[
                            item.img_caption.as_ref(),
                            item.image_caption.as_ref(),
                        ]);
                        ContentItem::captioned(kind, item.page_idx, caption, item.img_path)
                    }
                    ContentKind::Table => {
                        let caption = first_caption(&[item.table_caption.as_ref()]);
                        ContentItem::captioned(kind, item.page_idx, caption, item.img_path)
                    }
                    _ => ContentItem::text(kind, item.page_idx, item.text.unwrap_or_default()),
                }
            }
        }
    }
}

/// Reads a content list. A list that was serialized twice (a JSON string holding the array) is unwrapped first.
pub fn parse_content_list(value: Value) -> Result<Vec<ContentItem>> {
    let value = match value {
        Value::String(encoded) => serde_json::from_str(&encoded)?,
        other => other,
    };
    let Value::Array(entries) = value else {
        return Err(InputError::NotAList);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<RawContentItem>(entry)
                .map(ContentItem::from)
                .map_err(|err| InputError::InvalidContentItem {
                    index,
                    reason: err.to_string(),
                })
        })
        .collect()
}

pub fn read_content_list(json: &str) -> Result<Vec<ContentItem>> {
    parse_content_list(serde_json::from_str(json)?)
}
