//! Prompt assembly and fixed answer phrases.
//!
//! The grounding policy lives entirely in the prompt: the generation model is
//! instructed when to stay inside the context, when to emit the fixed
//! in-document sentinel, and when general knowledge is acceptable. The
//! synthesizer cannot verify compliance, so this contract is best-effort by
//! design and the tests assert prompt construction, not model behavior.

/// Fixed answer returned when retrieval yields no usable chunks.
pub const NO_MATCH_ANSWER: &str = "No relevant information found.";

/// Fixed phrase the model is told to emit when the document does not answer a
/// document-related question.
pub const UNANSWERED_SENTINEL: &str = "The document does not contain this information.";

/// Concatenate hydrated chunk texts into one context block.
///
/// Order must already be similarity rank; chunks are separated by blank lines.
pub fn build_context(chunk_texts: &[String]) -> String {
    chunk_texts.join("\n\n")
}

/// Build the generation prompt encoding the answer policy.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful AI assistant answering questions about a document.\n\
         \n\
         Rules:\n\
         - If the question is about the document, answer using ONLY the context below.\n\
         - If the question is about the document but the context does not contain the answer, reply exactly: \"{UNANSWERED_SENTINEL}\"\n\
         - If the question is unrelated to the document, answer from your general knowledge.\n\
         - If the message is a greeting, respond conversationally.\n\
         - Never invent facts about the document.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         Answer clearly and concisely."
    )
}
