//! Free-form questions answered against the whole dataset.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{string_arg, Tool, ToolContext, ToolError, ToolName};
use crate::llm::ChatMessage;

pub struct AnswerQuestion {
    ctx: ToolContext,
}

impl AnswerQuestion {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for AnswerQuestion {
    fn name(&self) -> ToolName {
        ToolName::Qa
    }

    fn description(&self) -> &str {
        "Answer a question about the dataset using every host's scan results as context."
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["question"]
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<String, ToolError> {
        let question = string_arg(args, "question")?;
        answer_question(&self.ctx, question).await
    }
}

/// Ask the model `question` with the rendered dataset as context. Returns the
/// raw model text.
pub async fn answer_question(ctx: &ToolContext, question: &str) -> Result<String, ToolError> {
    let prompt = format!(
        r#"You are a cybersecurity analyst. Answer the question using only the dataset below. Be concise and structure the answer in Markdown.

Dataset:
{context}
Question: {question}
Answer:
"#,
        context = ctx.dataset.to_context(),
    );

    let response = ctx
        .llm
        .chat_completion(&ctx.model, &[ChatMessage::user(prompt)])
        .await?;
    Ok(response.text().to_string())
}
