//! Configuration, the retrieval-augmented answering pipeline and the
//! ingestion session that ties loading, caching and indexing together.

pub mod bootstrap;
pub mod config;
pub mod pipeline;
pub mod session;
pub mod vault;

pub use config::Config;
pub use pipeline::{Answer, Pipeline, PipelineError, PipelineErrorKind};
pub use session::{IngestReport, Session, SessionError};
