//! Document ingestion and retrieval storage: loaders, the recursive text
//! splitter, content fingerprints, the parsed-document cache and the
//! in-memory similarity index.

pub mod cache;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod index;

pub use cache::DocumentCache;
pub use error::MemoryError;
pub use fingerprint::{file_hash, fingerprint};
pub use index::{IndexSnapshot, ScoredChunk, VectorIndex};
