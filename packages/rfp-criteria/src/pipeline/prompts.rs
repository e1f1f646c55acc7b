//! LLM prompts for extraction, classification, categorization,
//! summarization and validation.
//!
//! Placeholders are `{name}`. Document text is always substituted last so
//! braces inside it are never re-expanded.

use crate::types::document::DocumentType;

pub const EXTRACT_SYSTEM: &str = "You are an expert at analyzing procurement documents (RFPs, RFQs, tenders) and extracting requirements and criteria. \
You work with documents in multiple languages including German, English, French, and others. \
Extract ALL requirements in exactly the structure given (same granularity as in the document).";

/// Prompt for extracting criteria from one chunk.
pub const EXTRACT_PROMPT: &str = r#"Analyze this document chunk and extract ALL requirements, criteria, specifications, and evaluation points.
This document may be in German, English, or other languages.
Provide the exact text as found in the document.
Include the internal ID of the criterion in the criteria_id field when the document has one.

Chunk {chunk_number} of {total_chunks}:

{chunk}"#;

pub const CLASSIFY_SYSTEM: &str = "You are an expert document classifier specializing in procurement and RFP documents. \
Analyze the content carefully and provide accurate classification with appropriate confidence levels.";

/// Prompt for classifying a document from its first pages.
pub const CLASSIFY_PROMPT: &str = r#"Analyze the following document content and classify it into one of these procurement document types:

{types}

**Criteria Detection:**
Determine if the document contains extractable criteria by looking for:
- Requirements statements (must, shall, should, required, mandatory)
- Evaluation criteria or scoring rubrics
- Technical specifications with measurable parameters
- Compliance requirements
- Performance standards or thresholds

**Document Content:**
{content}

Provide your classification with high confidence if the document clearly fits a category,
or lower confidence if it's ambiguous. Explain your reasoning briefly."#;

pub const CATEGORIZE_SYSTEM: &str =
    "You are an expert at categorizing RFP criteria. Assign each criterion to exactly one of the 6 specified categories.";

/// Prompt for six-way categorization. Criteria are numbered from 1.
pub const CATEGORIZE_PROMPT: &str = r#"Categorize the following criteria into exactly these 6 categories:

1. Technical Requirements - System architecture, technology stack, technical specifications
2. Security & Compliance - Security measures, regulatory compliance, data protection
3. Performance & Scalability - Performance metrics, scalability requirements, capacity
4. Integration & Compatibility - System integration, compatibility, interoperability
5. Support & Maintenance - Support services, maintenance requirements, SLAs
6. Commercial & Legal - Pricing, contracts, legal terms, commercial conditions

Each criterion must be assigned to exactly one category. Answer with the numbers
of the criteria per category; every number must appear exactly once.

Criteria to categorize:
{criteria}"#;

pub const SUMMARIZE_SYSTEM: &str = "You are an expert at summarizing technical and procurement documents.";

/// Prompt for the map step of summarization.
pub const SUMMARIZE_CHUNK_PROMPT: &str =
    "Summarize the key information, requirements, and objectives from this document chunk:\n\n{chunk}";

pub const SYNTHESIZE_SYSTEM: &str =
    "You are an expert at synthesizing multiple summaries into a final, comprehensive summary.";

/// Prompt for the reduce step of summarization.
pub const SYNTHESIZE_PROMPT: &str =
    "Create a single, coherent summary from the following chunk summaries:\n\n{summaries}";

pub const VERDICT_SYSTEM: &str = "You are a summarization expert. Extract the final decision, summary, and references from the agent's response. \
Please include all references (full URL as provided). ONLY RETURN A SINGLE OBJECT.";

/// Prompt for reducing a research conversation to a verdict.
pub const VERDICT_PROMPT: &str = "Agent conversation:\n{conversation}";

/// Instructions given to both research agents.
pub const AGENT_INSTRUCTIONS: &str = "You are an expert RFP analyst. Your task is to validate if a given criterion is met by a specified product/service, \
based on the provided document summary and web research. Provide a clear 'yes' or 'no' answer, a justification, and cite your sources. \
YOU MUST ALWAYS PROVIDE FULL URLs TO YOUR SOURCES";

/// The one message posted to a research thread.
pub const VALIDATION_MESSAGE: &str = r#"Product/Service to validate: {product}

Summary of RFP documents (Only for context, do not use this as the main source):
---
{summary}
---

Criterion to assess: "{criterion}"

Based on the provided summary and your web research, determine if the product/service meets this criterion.
Explain your reasoning and provide sources."#;

/// Format the extraction prompt for one chunk.
pub fn format_extract_prompt(chunk: &str, chunk_number: usize, total_chunks: usize) -> String {
    EXTRACT_PROMPT
        .replace("{chunk_number}", &chunk_number.to_string())
        .replace("{total_chunks}", &total_chunks.to_string())
        .replace("{chunk}", chunk)
}

/// Format the classification prompt, listing every allowed type label.
pub fn format_classify_prompt(content: &str) -> String {
    let types = DocumentType::CLASSIFIABLE
        .iter()
        .map(|t| format!("- \"{}\"", t.label()))
        .collect::<Vec<_>>()
        .join("\n");

    CLASSIFY_PROMPT
        .replace("{types}", &types)
        .replace("{content}", content)
}

/// Format the categorization prompt with 1-based numbering.
pub fn format_categorize_prompt(texts: &[String]) -> String {
    let criteria = texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n");

    CATEGORIZE_PROMPT.replace("{criteria}", &criteria)
}

pub fn format_summarize_chunk_prompt(chunk: &str) -> String {
    SUMMARIZE_CHUNK_PROMPT.replace("{chunk}", chunk)
}

pub fn format_synthesize_prompt(summaries: &[String]) -> String {
    SYNTHESIZE_PROMPT.replace("{summaries}", &summaries.join("\n\n"))
}

pub fn format_verdict_prompt(conversation: &str) -> String {
    VERDICT_PROMPT.replace("{conversation}", conversation)
}

/// Format the research thread message.
pub fn format_validation_message(product: &str, summary: &str, criterion: &str) -> String {
    VALIDATION_MESSAGE
        .replace("{product}", product)
        .replace("{criterion}", criterion)
        .replace("{summary}", summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_prompt_numbers_chunk() {
        let prompt = format_extract_prompt("The vendor shall comply.", 2, 5);
        assert!(prompt.contains("Chunk 2 of 5:"));
        assert!(prompt.ends_with("The vendor shall comply."));
    }

    #[test]
    fn test_classify_prompt_lists_all_types() {
        let prompt = format_classify_prompt("content");
        for t in DocumentType::CLASSIFIABLE {
            assert!(prompt.contains(&format!("\"{}\"", t.label())));
        }
        assert!(!prompt.contains("Spreadsheet"));
    }

    #[test]
    fn test_categorize_prompt_is_one_based() {
        let prompt = format_categorize_prompt(&["first".into(), "second".into()]);
        assert!(prompt.contains("1. first\n2. second"));
    }

    #[test]
    fn test_validation_message_does_not_expand_summary_braces() {
        let msg = format_validation_message("Acme Cloud", "summary with {criterion}", "Uptime 99.9%");
        assert!(msg.contains("Product/Service to validate: Acme Cloud"));
        assert!(msg.contains("summary with {criterion}"));
        assert!(msg.contains("Criterion to assess: \"Uptime 99.9%\""));
    }
}
