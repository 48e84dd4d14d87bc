//! Outbound call invocation: one GET request, classified into an [`Outcome`].

pub mod http;

use serde::Serialize;
use thiserror::Error;

pub use self::http::HttpInvoker;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Response payload: parsed JSON when the server labelled it structured,
/// otherwise the raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

/// Result of attempting a call.
///
/// Any received response is a `Success`, whatever its status code. Only
/// transport-level errors produce a `Failure`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        status_code: u16,
        body: ResponseBody,
    },
    Failure {
        error_message: String,
    },
}

impl Outcome {
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Outcome::Failure {
            error_message: error.to_string(),
        }
    }
}

/// Performs a single outbound call. Implementations never return an error:
/// every failure is folded into [`Outcome::Failure`].
#[async_trait::async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, url: &str) -> Outcome;
}
