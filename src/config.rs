//! Configuration management for the summarizer.
//!
//! Configuration can be set via environment variables (a `.env` file in the
//! working directory is loaded first by `main`):
//! - `HF_API_KEY` - API key for the model gateway. Not validated at startup;
//!   a missing key surfaces as an upstream error on the first model call.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible endpoint. Defaults to `https://router.huggingface.co/v1`.
//! - `DEFAULT_MODEL` - Optional. Model identifier. Defaults to `mistralai/Mistral-7B-Instruct-v0.2:featherless-ai`.
//! - `DATASET_PATH` - Optional. Host scan dataset. Defaults to `hosts_dataset.json`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MAX_ITERATIONS` - Optional. Maximum agent rounds per request. Defaults to `3`.

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2:featherless-ai";
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model gateway API key
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible chat endpoint
    pub llm_base_url: String,

    /// Model identifier sent with every chat completion
    pub default_model: String,

    /// Path to the host scan dataset
    pub dataset_path: PathBuf,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum rounds for the agent loop
    pub max_iterations: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `PORT` or `MAX_ITERATIONS` do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("HF_API_KEY").ok();

        let llm_base_url =
            std::env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let dataset_path = std::env::var("DATASET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("hosts_dataset.json"));

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_iterations = parse_max_iterations(std::env::var("MAX_ITERATIONS").ok())?;

        Ok(Self {
            api_key,
            llm_base_url,
            default_model,
            dataset_path,
            host,
            port,
            max_iterations,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>, default_model: String, dataset_path: PathBuf) -> Self {
        Self {
            api_key,
            llm_base_url: DEFAULT_BASE_URL.to_string(),
            default_model,
            dataset_path,
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

fn parse_max_iterations(raw: Option<String>) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MAX_ITERATIONS);
    };
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e)))?;
    if value == 0 {
        return Err(ConfigError::InvalidValue(
            "MAX_ITERATIONS".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(value)
}
