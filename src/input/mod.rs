//! Readers for the structures produced by the external document parser.
//!
//! The content list and the middle structure arrive as JSON; everything here
//! turns them into the crate's own model before any matching happens.

pub mod content_list;
pub mod middle;

pub use content_list::{parse_content_list, read_content_list};
pub use middle::{build_page_index, read_middle, PageBlocks, PageIndex};

/// Result alias for the input layer.
pub type Result<T> = std::result::Result<T, InputError>;

/// Contract violations in parser output.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The middle structure has no `pdf_info` page list.
    #[error("middle structure has no `pdf_info` page list")]
    MissingPdfInfo,

    /// A page of the middle structure could not be read.
    #[error("invalid page at position {index}: {reason}")]
    InvalidPage {
        /// Position in `pdf_info`
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// An entry of the content list is neither a string nor a typed item.
    #[error("invalid content item at position {index}: {reason}")]
    InvalidContentItem {
        /// Position in the content list
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The content list is not a JSON array.
    #[error("content list must be a JSON array")]
    NotAList,

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
