//! Extraction of a single JSON tool call from free-form model output.
//!
//! Models are asked to reply with `{"<tool_name>": {<params>}}`, but tend to
//! wrap it in prose or code fences. Only the first balanced top-level object
//! is considered; anything that does not parse is treated as no action.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::tools::ToolError;

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Function name as the model wrote it (not necessarily registered).
    pub name: String,
    /// Value under the name; expected to be an object of keyword parameters.
    pub params: Value,
}

impl Action {
    /// Parameters as a keyword map. `null` counts as no parameters.
    pub fn arguments(&self) -> Result<Cow<'_, Map<String, Value>>, ToolError> {
        match &self.params {
            Value::Object(map) => Ok(Cow::Borrowed(map)),
            Value::Null => Ok(Cow::Owned(Map::new())),
            _ => Err(ToolError::InvalidArgument {
                name: "parameters",
                expected: "an object",
            }),
        }
    }
}

fn fence_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)```json|```").expect("valid fence regex"))
}

/// Strip code fences, then return the first top-level `{...}` span.
fn first_object_span(text: &str) -> Option<String> {
    let cleaned = fence_pattern().replace_all(text, "");

    let mut depth = 0usize;
    let mut start = None;
    for (i, ch) in cleaned.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let begin = start?;
                    return Some(cleaned[begin..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract the tool call from `text`, if there is a usable one.
///
/// The function name is the object's first key; an empty object is no action.
pub fn extract_action(text: &str) -> Option<Action> {
    let candidate = first_object_span(text)?;

    let object = match serde_json::from_str::<Value>(&candidate) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return None,
        Err(e) => {
            tracing::debug!("Discarding malformed action JSON: {}", e);
            return None;
        }
    };

    let (name, params) = object.into_iter().next()?;
    Some(Action { name, params })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_is_extracted() {
        let action = extract_action(r#"{"qa_action": {"question": "How many hosts?"}}"#).unwrap();
        assert_eq!(action.name, "qa_action");
        assert_eq!(action.params["question"], "How many hosts?");
    }

    #[test]
    fn prose_and_fences_are_ignored() {
        let text = "Thought: I need host data.\nAction:\n```json\n{\"summarize_host_action\": {\"ip\": \"1.2.3.4\"}}\n```\nPAUSE";
        let action = extract_action(text).unwrap();
        assert_eq!(action.name, "summarize_host_action");
        assert_eq!(action.params["ip"], "1.2.3.4");
    }

    #[test]
    fn fence_markers_are_case_insensitive() {
        let text = "```JSON\n{\"qa_action\": {\"question\": \"q\"}}\n```";
        assert_eq!(extract_action(text).unwrap().name, "qa_action");
    }

    #[test]
    fn only_first_object_counts() {
        let text = r#"{"qa_action": {"question": "a"}} then {"summarize_host_action": {"ip": "1.1.1.1"}}"#;
        assert_eq!(extract_action(text).unwrap().name, "qa_action");
    }

    #[test]
    fn nested_braces_stay_in_one_span() {
        let text = r#"call {"evaluate_output_action": {"output": "set {a, b}"}} done"#;
        let action = extract_action(text).unwrap();
        assert_eq!(action.params["output"], "set {a, b}");
    }

    #[test]
    fn unbalanced_or_missing_braces_yield_nothing() {
        assert!(extract_action("no json here").is_none());
        assert!(extract_action(r#"{"qa_action": {"question": "q"}"#).is_none());
        assert!(extract_action("").is_none());
    }

    #[test]
    fn stray_closing_brace_before_object_is_skipped() {
        let text = r#"} oops {"qa_action": {"question": "q"}}"#;
        assert_eq!(extract_action(text).unwrap().name, "qa_action");
    }

    #[test]
    fn malformed_json_is_swallowed() {
        assert!(extract_action("{qa_action: question}").is_none());
        assert!(extract_action(r#"{"qa_action": {"question": "q",}}"#).is_none());
        assert!(extract_action("{}").is_none());
    }

    #[test]
    fn first_key_names_the_function() {
        let action = extract_action(r#"Final Answer: {"hosts": 3, "critical": 1}"#).unwrap();
        assert_eq!(action.name, "hosts");
        assert_eq!(action.params, 3);
    }

    #[test]
    fn arguments_require_an_object() {
        let action = extract_action(r#"{"qa_action": null}"#).unwrap();
        assert!(action.arguments().unwrap().is_empty());

        let action = extract_action(r#"{"qa_action": "not a map"}"#).unwrap();
        assert!(matches!(
            action.arguments(),
            Err(ToolError::InvalidArgument { name: "parameters", .. })
        ));
    }
}
