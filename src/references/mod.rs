pub mod caption;
pub mod extractor;
pub mod patterns;

pub use caption::{kind_from_caption, number_from_caption};
pub use extractor::{dedup_references, split_sentences, ExtractorConfig, ReferenceExtractor};
