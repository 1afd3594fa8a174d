//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request body for `POST /qa-global`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QaRequest {
    /// The question about the dataset
    #[serde(default)]
    pub question: Option<String>,
}

/// Answer to a dataset question.
#[derive(Debug, Clone, Serialize)]
pub struct QaResponse {
    pub question: String,
    pub answer: String,
}

/// Summary of the whole dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummaryResponse {
    pub summary: String,
}

/// Summary of a single host.
#[derive(Debug, Clone, Serialize)]
pub struct HostSummaryResponse {
    pub ip: String,
    pub summary: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Model used by the agent
    pub model: String,

    /// Number of hosts in the loaded dataset
    pub hosts: usize,

    /// Agent round limit per request
    pub max_rounds: usize,
}
