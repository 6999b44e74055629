//! Extractive answer assembly.
//!
//! No generation happens anywhere in the pipeline: the answer is stitched
//! from the opening sentences of the top-ranked contexts, each snippet
//! tagged with a bracketed marker (`[1]`, `[2]`, ...) pointing at the
//! context it came from.

use crate::config::SNIPPET_SENTENCES;
use crate::search::types::RankedContext;

/// Assembles an extractive answer from ranked contexts.
///
/// Takes the first [`SNIPPET_SENTENCES`] sentences of each context (split
/// on `'.'`), appends the context's 1-based citation marker, and joins the
/// snippets with single spaces. Contexts whose text yields no non-empty
/// sentences are skipped; if every context is skipped, or `contexts` is
/// empty, returns `None`.
pub fn compose_answer(contexts: &[RankedContext]) -> Option<String> {
    let mut parts = Vec::with_capacity(contexts.len());

    for context in contexts {
        let snippet = leading_sentences(&context.text, SNIPPET_SENTENCES);
        if snippet.is_empty() {
            continue;
        }
        parts.push(format!("{} [{}]", snippet, context.rank));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// First `n` non-empty sentences of `text`, rejoined with periods.
fn leading_sentences(text: &str, n: usize) -> String {
    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(n)
        .collect();

    if sentences.is_empty() {
        String::new()
    } else {
        format!("{}.", sentences.join(". "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(rank: usize, text: &str) -> RankedContext {
        RankedContext {
            rank,
            doc: "doc.pdf".to_string(),
            score: 0.9,
            url: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_two_sentences_with_marker() {
        let contexts = vec![context(
            1,
            "Guards must be affixed to the machine. They shall not create new hazards. A third sentence is dropped.",
        )];
        let answer = compose_answer(&contexts).unwrap();
        assert_eq!(
            answer,
            "Guards must be affixed to the machine. They shall not create new hazards. [1]"
        );
    }

    #[test]
    fn test_snippets_joined_in_rank_order() {
        let contexts = vec![
            context(1, "First context sentence."),
            context(2, "Second context sentence."),
        ];
        let answer = compose_answer(&contexts).unwrap();
        assert_eq!(
            answer,
            "First context sentence. [1] Second context sentence. [2]"
        );
    }

    #[test]
    fn test_short_context_uses_what_it_has() {
        let contexts = vec![context(1, "Only one sentence here.")];
        let answer = compose_answer(&contexts).unwrap();
        assert_eq!(answer, "Only one sentence here. [1]");
    }

    #[test]
    fn test_empty_text_context_skipped() {
        let contexts = vec![context(1, "   "), context(2, "Usable text.")];
        let answer = compose_answer(&contexts).unwrap();
        assert_eq!(answer, "Usable text. [2]");
    }

    #[test]
    fn test_all_empty_yields_none() {
        assert!(compose_answer(&[]).is_none());
        assert!(compose_answer(&[context(1, "..."), context(2, "")]).is_none());
    }

    #[test]
    fn test_text_without_terminal_period() {
        let contexts = vec![context(1, "no trailing period at all")];
        let answer = compose_answer(&contexts).unwrap();
        assert_eq!(answer, "no trailing period at all. [1]");
    }
}
