use std::fmt::Write;

use ragdb_core::types::ScoredCandidate;

const INSTRUCTIONS: &str = "You are a financial analyst. Answer the user query based ONLY on the context provided below.\n\
If the answer is not in the context, state 'I don't know'.\n";

/// Render the grounded-answer prompt for `query` over the retrieved `docs`, in rank order.
pub fn render_prompt(query: &str, docs: &[ScoredCandidate]) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    prompt.push_str("\nContext:\n");
    for doc in docs {
        let source = doc.meta_str("source").unwrap_or_default();
        let page = doc.meta_str("page_label").unwrap_or_default();
        // Writing into a String cannot fail.
        let _ = write!(prompt, "Document Source: {source} (Page {page})\nContent:\n{}\n---\n", doc.text);
    }
    let _ = write!(prompt, "\nQuery: {query}\n\nAnswer:");
    prompt
}
