//! Output formatting for answers.
//!
//! Supports both human-readable terminal output and JSON for scripting.
//! The JSON form serializes the answer envelope directly, so scripted
//! consumers see the same fields the library API returns.

use guardrail_core::search::AnswerEnvelope;
use serde::Serialize;

/// JSON output structure wrapping the envelope with its question.
#[derive(Serialize)]
struct JsonOutput<'a> {
    question: &'a str,
    #[serde(flatten)]
    envelope: &'a AnswerEnvelope,
}

/// Formats an answer envelope as JSON.
pub fn format_json(question: &str, envelope: &AnswerEnvelope) -> String {
    let output = JsonOutput { question, envelope };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an answer envelope for human-readable terminal output.
pub fn format_human(question: &str, envelope: &AnswerEnvelope) -> String {
    let mut output = String::new();

    match &envelope.answer {
        Some(answer) => {
            output.push_str(answer);
            output.push('\n');
        }
        None => {
            output.push_str(&format!(
                "No confident answer found for \"{}\".\n",
                question
            ));
        }
    }

    if !envelope.contexts.is_empty() {
        output.push_str("\nSources:\n");
        for context in &envelope.contexts {
            output.push_str(&format!(
                "[{}] {} (score: {:.2})\n",
                context.rank, context.doc, context.score
            ));
            if let Some(url) = &context.url {
                output.push_str(&format!("    {}\n", url));
            }
        }
    }

    if envelope.abstained && !envelope.contexts.is_empty() {
        output.push_str("\nBest evidence fell below the confidence threshold.\n");
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardrail_core::search::RankedContext;

    fn envelope_with_answer() -> AnswerEnvelope {
        AnswerEnvelope {
            answer: Some("Guards must be affixed to the machine. [1]".to_string()),
            contexts: vec![RankedContext {
                rank: 1,
                doc: "machine_guarding.pdf".to_string(),
                score: 0.82,
                url: Some("https://example.org/guarding".to_string()),
                text: "Guards must be affixed to the machine where possible.".to_string(),
            }],
            reranker_used: "hybrid".to_string(),
            abstained: false,
        }
    }

    #[test]
    fn test_format_human_with_answer() {
        let output = format_human("guarding requirements", &envelope_with_answer());
        assert!(output.contains("Guards must be affixed"));
        assert!(output.contains("[1] machine_guarding.pdf"));
        assert!(output.contains("https://example.org/guarding"));
    }

    #[test]
    fn test_format_human_abstention() {
        let envelope = AnswerEnvelope {
            answer: None,
            contexts: Vec::new(),
            reranker_used: "baseline".to_string(),
            abstained: true,
        };
        let output = format_human("unknown topic", &envelope);
        assert!(output.contains("No confident answer"));
        assert!(output.contains("unknown topic"));
    }

    #[test]
    fn test_format_json_fields() {
        let output = format_json("guarding", &envelope_with_answer());
        assert!(output.contains("\"question\": \"guarding\""));
        assert!(output.contains("\"reranker_used\": \"hybrid\""));
        assert!(output.contains("\"abstained\": false"));
        assert!(output.contains("\"doc\": \"machine_guarding.pdf\""));
    }
}
