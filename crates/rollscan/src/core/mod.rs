//! Run coordination: configuration, discovery, the per-document pipeline and
//! the batch orchestrator.

pub mod config;
pub mod io;
pub mod orchestrator;
pub mod pipeline;

pub use config::SearchConfig;
pub use io::discover_documents;
pub use orchestrator::{BatchOutcome, process_documents, resolve_worker_count};
pub use pipeline::{DocumentReport, DocumentTask, process_document};
