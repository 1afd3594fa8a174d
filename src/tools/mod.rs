//! Tools the agent can invoke by name.
//!
//! The set is closed: [`ToolName`] enumerates every registered tool and
//! [`ToolRegistry`] maps each name to its handler. Anything the model names
//! outside that set is reported back as an unknown function.

mod evaluate;
mod qa;
mod summarize;

pub use evaluate::{evaluate, evaluate_output, EvaluateOutput, Finding};
pub use qa::{answer_question, AnswerQuestion};
pub use summarize::{highlight_entities, summarize_host, SummarizeHost};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::dataset::Dataset;
use crate::llm::LlmClient;

/// Failure while executing a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The action's parameters did not fit the tool. Reported back to the model.
    #[error("Missing '{0}' argument")]
    MissingArgument(&'static str),

    #[error("Invalid '{name}' argument: expected {expected}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
    },

    /// The model gateway failed. Fatal for the current request.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl ToolError {
    /// Whether the agent can feed this error back into the conversation and carry on.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ToolError::Upstream(_))
    }
}

/// Names of the registered tools, as the model spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SummarizeHost,
    Qa,
    EvaluateOutput,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::SummarizeHost,
        ToolName::Qa,
        ToolName::EvaluateOutput,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SummarizeHost => "summarize_host_action",
            ToolName::Qa => "qa_action",
            ToolName::EvaluateOutput => "evaluate_output_action",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown function {}", s))
    }
}

/// A tool invoked with keyword-style parameters.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> ToolName;

    fn description(&self) -> &str;

    /// Names of the parameters the tool reads from the action.
    fn parameters(&self) -> &'static [&'static str];

    async fn execute(&self, args: &Map<String, Value>) -> Result<String, ToolError>;
}

/// Everything a tool may need: the dataset and the model gateway.
#[derive(Clone)]
pub struct ToolContext {
    pub dataset: Arc<Dataset>,
    pub llm: Arc<dyn LlmClient>,
    pub model: String,
}

/// The fixed set of tools available to the agent.
pub struct ToolRegistry {
    summarize_host: SummarizeHost,
    qa: AnswerQuestion,
    evaluate_output: EvaluateOutput,
}

impl ToolRegistry {
    pub fn new(ctx: ToolContext) -> Self {
        Self {
            summarize_host: SummarizeHost::new(ctx.clone()),
            qa: AnswerQuestion::new(ctx.clone()),
            evaluate_output: EvaluateOutput::new(ctx.dataset),
        }
    }

    pub fn get(&self, name: ToolName) -> &dyn Tool {
        match name {
            ToolName::SummarizeHost => &self.summarize_host,
            ToolName::Qa => &self.qa,
            ToolName::EvaluateOutput => &self.evaluate_output,
        }
    }

    pub fn list_tools(&self) -> Vec<&dyn Tool> {
        ToolName::ALL.into_iter().map(|n| self.get(n)).collect()
    }

    /// Run a named tool, logging the call.
    pub async fn execute(
        &self,
        name: ToolName,
        args: &Map<String, Value>,
    ) -> Result<String, ToolError> {
        tracing::info!(tool = %name, "Executing tool");
        let result = self.get(name).execute(args).await;
        if let Err(e) = &result {
            tracing::warn!(tool = %name, "Tool failed: {}", e);
        }
        result
    }
}

/// Read a required string parameter.
pub(crate) fn string_arg<'a>(
    args: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Err(ToolError::MissingArgument(name)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ToolError::InvalidArgument {
            name,
            expected: "a string",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedClient;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        ToolRegistry::new(ToolContext {
            dataset: Arc::new(Dataset::default()),
            llm: Arc::new(ScriptedClient::new(["ok"])),
            model: "test-model".to_string(),
        })
    }

    #[test]
    fn tool_names_round_trip_through_wire_names() {
        for name in ToolName::ALL {
            assert_eq!(name.as_str().parse::<ToolName>().unwrap(), name);
        }
        assert!("delete_everything".parse::<ToolName>().is_err());
        assert!("SUMMARIZE_HOST_ACTION".parse::<ToolName>().is_err());
    }

    #[test]
    fn registry_maps_each_name_to_its_tool() {
        let registry = registry();
        for name in ToolName::ALL {
            assert_eq!(registry.get(name).name(), name);
        }
        let listed: Vec<ToolName> = registry.list_tools().iter().map(|t| t.name()).collect();
        assert_eq!(listed, ToolName::ALL.to_vec());
    }

    #[tokio::test]
    async fn execute_runs_the_named_tool() {
        let registry = registry();
        let args = json!({"output": "anything"}).as_object().cloned().unwrap();
        let out = registry.execute(ToolName::EvaluateOutput, &args).await.unwrap();
        assert_eq!(out, "- Output appears complete and consistent with dataset.");
    }

    #[test]
    fn string_arg_distinguishes_missing_and_mistyped() {
        let args = json!({"ip": 42, "empty": null}).as_object().cloned().unwrap();
        assert!(matches!(
            string_arg(&args, "question"),
            Err(ToolError::MissingArgument("question"))
        ));
        assert!(matches!(
            string_arg(&args, "empty"),
            Err(ToolError::MissingArgument("empty"))
        ));
        assert!(matches!(
            string_arg(&args, "ip"),
            Err(ToolError::InvalidArgument { name: "ip", .. })
        ));
    }

    #[test]
    fn upstream_errors_are_not_recoverable() {
        assert!(ToolError::MissingArgument("ip").is_recoverable());
        assert!(!ToolError::Upstream(anyhow::anyhow!("boom")).is_recoverable());
    }
}
