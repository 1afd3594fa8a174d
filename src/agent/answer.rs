//! Pulls the user-facing answer out of the agent's last reply.

use std::sync::OnceLock;

use regex::Regex;

fn answer_patterns() -> &'static [Regex; 2] {
    static RE: OnceLock<[Regex; 2]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"(?is)Final Answer:\s*(?:```(?:markdown)?\s*)?(.*?)(?:```)?\s*$")
                .expect("valid final answer regex"),
            Regex::new(r"(?is)Answer:\s*(?:```(?:markdown)?\s*)?(.*?)(?:```)?\s*$")
                .expect("valid answer regex"),
        ]
    })
}

/// Text after `Final Answer:` (or, failing that, `Answer:`) with an optional
/// markdown fence removed and whitespace trimmed. Input without either label is
/// returned unchanged.
pub fn extract_final_answer(text: &str) -> String {
    answer_patterns()
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_markdown_answer_is_unwrapped() {
        let text = "Thought: done.\nFinal Answer:\n```markdown\nX\n```";
        assert_eq!(extract_final_answer(text), "X");
    }

    #[test]
    fn plain_fence_is_unwrapped() {
        let text = "Final Answer: ```\n## Summary\n- 3 hosts\n```\n";
        assert_eq!(extract_final_answer(text), "## Summary\n- 3 hosts");
    }

    #[test]
    fn label_is_case_insensitive() {
        assert_eq!(extract_final_answer("final answer:   two hosts  "), "two hosts");
    }

    #[test]
    fn answer_label_is_the_fallback() {
        assert_eq!(
            extract_final_answer("Reasoning first.\nAnswer: 1.2.3.4 is critical."),
            "1.2.3.4 is critical."
        );
    }

    #[test]
    fn final_answer_wins_over_earlier_answer_label() {
        let text = "Answer: draft\nFinal Answer: polished";
        assert_eq!(extract_final_answer(text), "polished");
    }

    #[test]
    fn text_without_labels_is_unchanged() {
        assert_eq!(extract_final_answer("no markers here"), "no markers here");
        assert_eq!(extract_final_answer("  padded  "), "  padded  ");
    }
}
