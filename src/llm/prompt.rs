//! Grounding prompt composition for the portfolio assistant.

use crate::types::RetrievalResult;

use crate::rag::format_context_with_citations;

/// Compose the grounding prompt for a visitor question.
///
/// Retrieved context blocks are embedded verbatim; when nothing was
/// retrieved the prompt says so instead of presenting an empty context
/// section, which keeps the model from inventing sources.
pub fn build_prompt(question: &str, results: &[RetrievalResult]) -> String {
    let (context, citations) = format_context_with_citations(results);

    let context_section = if context.is_empty() {
        "No background material was retrieved for this question.".to_string()
    } else {
        context
    };

    let mut prompt = format!(
        "You are a portfolio assistant. You help visitors learn about the \
         portfolio owner's background, skills, projects, and experience.\n\n\
         Use the following context to answer the question:\n{}\n\n\
         Question: {}\n\n\
         Guidelines:\n\
         - Be friendly, professional, and informative\n\
         - If the information is not in the context, say you do not have \
         that specific information\n\
         - Keep responses conversational but grounded in the context\n",
        context_section, question
    );

    if !citations.is_empty() {
        prompt.push_str("\nSources:\n");
        prompt.push_str(&citations.join("\n"));
        prompt.push('\n');
    }

    prompt.push_str("\nAnswer:");
    prompt
}
