//! Service layer for the retrieval pipeline.
//!
//! This module contains the business logic for:
//! - Extraction engines (`YtDlpExtractor`, `DirectExtractor`)
//! - Safe file naming (`namer`)
//! - Retrieval orchestration (`Retriever`)

mod direct;
pub mod extractor;
pub mod namer;
mod retriever;
#[cfg(test)]
pub(crate) mod stub;
mod ytdlp;

pub use direct::DirectExtractor;
pub use extractor::{Extraction, ExtractionError, MediaExtractor, build_extractor};
pub use namer::SafeFilename;
pub use retriever::Retriever;
pub use ytdlp::YtDlpExtractor;
