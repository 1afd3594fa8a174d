//! Core agent loop implementation.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::dataset::Dataset;
use crate::llm::{ChatMessage, LlmClient, OpenAiCompatClient};
use crate::tools::{evaluate_output, ToolContext, ToolName, ToolRegistry};

use super::action::{extract_action, Action};
use super::answer::extract_final_answer;
use super::prompt::build_system_prompt;

const ACTION_PREFIX: &str = "Action_Response:";
const EVALUATION_PREFIX: &str = "Evaluation_Response:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentState {
    Running,
    Done,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The model replied without a tool call.
    NoAction,
    /// Every allowed round was used.
    RoundLimit,
}

/// Outcome of one agent invocation.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// The model's last reply.
    pub reply: String,
    /// Rounds actually executed.
    pub rounds: usize,
    pub termination: Termination,
    /// Every turn sent to (or queued for) the model during this run.
    pub transcript: Vec<ChatMessage>,
}

impl AgentRun {
    /// The user-facing answer with loop scaffolding stripped.
    pub fn final_answer(&self) -> String {
        extract_final_answer(&self.reply)
    }
}

/// The host-scan analyst agent.
///
/// Holds no conversation state: every call to [`Agent::run`] starts from a
/// fresh transcript, so one agent can serve concurrent requests.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    dataset: Arc<Dataset>,
    tools: ToolRegistry,
    model: String,
    max_rounds: usize,
    system_prompt: String,
}

impl Agent {
    /// Create an agent talking to the configured model gateway.
    pub fn new(config: &Config, dataset: Arc<Dataset>) -> Self {
        let llm = Arc::new(OpenAiCompatClient::new(
            config.llm_base_url.clone(),
            config.api_key.clone(),
        ));
        Self::with_client(
            llm,
            dataset,
            config.default_model.clone(),
            config.max_iterations,
        )
    }

    /// Create an agent with an explicit client (used by tests).
    pub fn with_client(
        llm: Arc<dyn LlmClient>,
        dataset: Arc<Dataset>,
        model: String,
        max_rounds: usize,
    ) -> Self {
        let tools = ToolRegistry::new(ToolContext {
            dataset: Arc::clone(&dataset),
            llm: Arc::clone(&llm),
            model: model.clone(),
        });
        let system_prompt = build_system_prompt(&tools);

        Self {
            llm,
            dataset,
            tools,
            model,
            max_rounds: max_rounds.max(1),
            system_prompt,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Answer `question`, letting the model call tools for up to `max_rounds` rounds.
    ///
    /// # Errors
    ///
    /// Fails only when the model gateway fails, either directly or inside a tool.
    pub async fn run(&self, question: &str) -> anyhow::Result<AgentRun> {
        let run_id = Uuid::new_v4();
        self.run_rounds(question)
            .instrument(tracing::info_span!("agent_run", %run_id))
            .await
    }

    async fn run_rounds(&self, question: &str) -> anyhow::Result<AgentRun> {
        let mut transcript = vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(question),
        ];
        let mut state = AgentState::Running;
        let mut reply = String::new();
        let mut rounds = 0;

        while state == AgentState::Running && rounds < self.max_rounds {
            rounds += 1;
            tracing::debug!("Agent round {}", rounds);

            let response = self.llm.chat_completion(&self.model, &transcript).await?;
            reply = response.text().to_string();
            tracing::debug!(
                model = response.model.as_deref().unwrap_or(&self.model),
                finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
                "Model reply: {}",
                truncate_for_log(&reply, 500)
            );

            let action = extract_action(&reply);
            match &action {
                Some(action) => {
                    let turn = self.dispatch(action).await?;
                    transcript.push(ChatMessage::user(turn));
                }
                None => tracing::debug!("No action in reply"),
            }

            // Feedback judges the raw reply, and is queued even on the final round.
            let feedback = evaluate_output(&self.dataset, &reply);
            transcript.push(ChatMessage::user(format!(
                "{} {}",
                EVALUATION_PREFIX,
                json_string(&feedback)
            )));

            if action.is_none() {
                state = AgentState::Done;
            }
        }

        let termination = match state {
            AgentState::Done => Termination::NoAction,
            AgentState::Running => Termination::RoundLimit,
        };
        tracing::info!(rounds, ?termination, "Agent run finished");

        Ok(AgentRun {
            reply,
            rounds,
            termination,
            transcript,
        })
    }

    /// Execute the action and format the turn reporting its result.
    async fn dispatch(&self, action: &Action) -> anyhow::Result<String> {
        let Ok(name) = action.name.parse::<ToolName>() else {
            tracing::warn!("Model requested unknown function {}", action.name);
            return Ok(format!("{} Unknown function {}", ACTION_PREFIX, action.name));
        };

        let result = match action.arguments() {
            Ok(args) => self.tools.execute(name, &args).await,
            Err(e) => Err(e),
        };

        let output = match result {
            Ok(output) => output,
            Err(e) if e.is_recoverable() => format!("Error: {}", e),
            Err(e) => return Err(anyhow::Error::new(e).context(format!("{} failed", name))),
        };
        tracing::debug!("Action result: {}", truncate_for_log(&output, 1000));

        Ok(format!("{} {}", ACTION_PREFIX, json_string(&output)))
    }
}

/// Encode `s` as a JSON string literal with non-ASCII characters escaped as
/// `\uXXXX` (UTF-16 surrogate pairs above the BMP).
fn json_string(s: &str) -> String {
    let encoded = serde_json::Value::String(s.to_string()).to_string();
    if encoded.is_ascii() {
        return encoded;
    }
    let mut escaped = String::with_capacity(encoded.len() + 16);
    for c in encoded.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    escaped
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
