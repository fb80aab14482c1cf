//! Resource ingestion: extraction, cleaning, chunking.
//!
//! The [`ResourceProcessor`] turns one raw resource description (a document
//! path or a URL plus free-form metadata) into zero or more
//! [`crate::types::ResourceDocument`] records. Extraction/fetch engines are
//! external collaborators behind the [`TextExtractor`] trait and
//! [`PageFetcher`]; the processor only consumes their plain-text output.

pub mod chunker;
pub mod extract;
pub mod processor;
pub mod web;

pub use chunker::TokenChunker;
pub use extract::{CommandExtractor, PdfTextExtractor, TextExtractor, TieredExtractor};
pub use processor::{doc_id, ResourceProcessor, WebResourceKind};
pub use web::PageFetcher;
