//! The fixed answer template.

use docqa_memory::document::Chunk;

/// Literal answer the model is told to give when the context is insufficient.
pub const FALLBACK_ANSWER: &str = "I don't know.";

/// Chunk contents in rank order, separated by blank lines.
#[must_use]
pub fn build_context<'a>(chunks: impl IntoIterator<Item = &'a Chunk>) -> String {
    chunks
        .into_iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fill the answer template. Context and question are inserted verbatim.
#[must_use]
pub fn render(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant. Use ONLY the context to answer.\n\
         If the answer is not in context, say: \"{FALLBACK_ANSWER}\"\n\n\
         Context:\n{context}\n\nQuestion:\n{question}\n\nAnswer:"
    )
}
