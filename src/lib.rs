//! # Censys Summarizer
//!
//! Natural-language answers over a static dataset of host scan results.
//!
//! This library provides:
//! - An HTTP API for host lookup, questions and summaries
//! - A tool-based agent loop over an OpenAI-compatible chat endpoint
//! - A deterministic evaluator that checks answers cover the dataset
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a question via the API
//! 2. Seed a fresh transcript with the system prompt and the question
//! 3. Call the LLM, parse a JSON tool call out of its reply, run the tool
//! 4. Feed the result and completeness feedback back, repeat until the model
//!    stops calling tools or the round limit is reached
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use censys_summarizer::{agent::Agent, config::Config, dataset::Dataset};
//!
//! let config = Config::from_env()?;
//! let dataset = Arc::new(Dataset::load(&config.dataset_path)?);
//! let agent = Agent::new(&config, dataset);
//! let run = agent.run("Which hosts are critical?").await?;
//! println!("{}", run.final_answer());
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod dataset;
pub mod llm;
pub mod tools;

pub use config::Config;
