//! Agent module - the analyst agent loop.
//!
//! Each round:
//! 1. Call the LLM with the run's transcript
//! 2. Parse a JSON tool call out of the reply, if any, and execute it
//! 3. Append the tool result and completeness feedback on the reply
//! 4. Stop once a reply carries no tool call or the round limit is reached

mod action;
mod agent_loop;
mod answer;
mod prompt;

pub use action::{extract_action, Action};
pub use agent_loop::{Agent, AgentRun, Termination};
pub use answer::extract_final_answer;
pub use prompt::build_system_prompt;
