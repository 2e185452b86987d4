use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct PredictRequest {
    #[serde(default)]
    #[validate(
        required(message = "Prompt is required"),
        length(min = 1, message = "Prompt is required")
    )]
    pub prompt: Option<String>,
}

impl PredictRequest {
    /// Parse a raw request body. An empty body reads as `{}`.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    /// The validated, non-empty prompt.
    pub fn into_prompt(self) -> Result<String, ValidationErrors> {
        self.validate()?;
        Ok(self.prompt.unwrap_or_default())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: Value,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Seconds with two decimals, e.g. `0.42s`.
    pub latency: String,
}

impl ResponseMeta {
    pub fn from_elapsed(elapsed: Duration) -> Self {
        Self {
            latency: format_latency(elapsed),
        }
    }
}

pub fn format_latency(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

/// Elapsed milliseconds rounded to two decimals.
pub fn latency_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}
