//! Embedding and answer-generation providers.
//!
//! Two backends are supported: a locally running Ollama server and the hosted
//! Hugging Face inference router. [`any::AnyProvider`] erases the choice so the
//! pipeline can hold either one.

pub mod any;
pub mod error;
pub mod http;
pub mod huggingface;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod provider;

pub use error::LlmError;
pub use provider::LlmProvider;
