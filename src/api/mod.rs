//! HTTP API for the summarizer.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /hosts` - List hosts with location and risk level
//! - `GET /hosts/:ip` - Full host record
//! - `POST /qa-global` - Answer a question about the dataset
//! - `GET /summarize-dataset` - Summarize the whole dataset
//! - `GET /summarize-host/:ip` - Summarize a single host

mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
