//! Formats retrieved passages into a readable answer.
//!
//! No text is generated: the "answer" is the query echoed back, the ranked
//! evidence with scores and truncated previews, and a fixed disclaimer.
//!
//! ```text
//! Question: where did the cat sit?
//!
//! Relevant passages from your documents:
//!
//! [1] (score 0.812) The cat sat on the mat. ...
//!
//! These passages were retrieved directly from your uploaded documents.
//! The answer is based only on your material, not on general knowledge.
//! ```

use crate::models::Passage;

/// Returned by [`compose`] when nothing was retrieved.
pub const NO_RESULTS_MESSAGE: &str = "No relevant content found.\n\
     Your documents may not contain anything similar to this question,\n\
     or nothing has been uploaded yet.";

/// Closing note appended to every non-empty answer.
pub const DISCLAIMER: &str = "These passages were retrieved directly from your uploaded documents.\n\
     The answer is based only on your material, not on general knowledge.";

const TRUNCATION_MARKER: &str = " ...";

/// Answer formatting settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposerParams {
    /// Maximum characters of each passage shown before truncation.
    pub preview_chars: usize,
}

impl Default for ComposerParams {
    fn default() -> Self {
        Self { preview_chars: 400 }
    }
}

/// Build the display text for `query` from ranked `passages`.
///
/// Passages are listed in the order given, numbered from 1.
pub fn compose(query: &str, passages: &[Passage], params: &ComposerParams) -> String {
    if passages.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let mut lines = vec![
        format!("Question: {}", query.trim()),
        String::new(),
        "Relevant passages from your documents:".to_string(),
    ];

    for (i, passage) in passages.iter().enumerate() {
        let preview = preview(&passage.text, params.preview_chars);
        lines.push(String::new());
        match passage.score {
            Some(score) => lines.push(format!("[{}] (score {:.3}) {}", i + 1, score, preview)),
            None => lines.push(format!("[{}] {}", i + 1, preview)),
        }
    }

    lines.push(String::new());
    lines.push(DISCLAIMER.to_string());
    lines.join("\n")
}

/// Trim `text` and cut it to `max_chars` characters, marking the cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &trimmed[..cut], TRUNCATION_MARKER),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_passages() {
        let out = compose("anything", &[], &ComposerParams::default());
        assert_eq!(out, NO_RESULTS_MESSAGE);
    }

    #[test]
    fn test_layout() {
        let passages = vec![
            Passage::new("first passage", Some(0.8123)),
            Passage::new("  second passage  ", Some(0.5)),
        ];
        let out = compose("  where?  ", &passages, &ComposerParams::default());
        let expected = format!(
            "Question: where?\n\nRelevant passages from your documents:\n\n\
             [1] (score 0.812) first passage\n\n\
             [2] (score 0.500) second passage\n\n{}",
            DISCLAIMER
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_score_omitted_when_absent() {
        let out = compose("q", &[Passage::new("text", None)], &ComposerParams::default());
        assert!(out.contains("[1] text"));
        assert!(!out.contains("score"));
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "a".repeat(450);
        let p = preview(&long, 400);
        assert_eq!(p.chars().count(), 400 + TRUNCATION_MARKER.len());
        assert!(p.ends_with(" ..."));
    }

    #[test]
    fn test_preview_exact_length_untouched() {
        let exact = "b".repeat(400);
        assert_eq!(preview(&exact, 400), exact);
    }

    #[test]
    fn test_preview_counts_chars() {
        let korean = "가".repeat(5);
        assert_eq!(preview(&korean, 3), "가가가 ...");
    }

    #[test]
    fn test_deterministic() {
        let passages = vec![Passage::new("same", Some(0.25))];
        let params = ComposerParams::default();
        assert_eq!(compose("q", &passages, &params), compose("q", &passages, &params));
    }
}
