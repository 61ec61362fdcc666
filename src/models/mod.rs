pub mod document;
pub mod event;
pub mod summary;

pub use document::{AgeDetails, AgeInfo, Document, DocumentResult, DOB_NOT_FOUND};
pub use event::{BatchEvent, BatchStage};
pub use summary::{BatchReport, BatchSummary, ErrorEntry, UnderageEntry};
