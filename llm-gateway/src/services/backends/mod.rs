//! Inference backend abstraction.
//!
//! The gateway never runs a model itself. It hands a batch of instances to
//! an [`InferenceBackend`] and relays what comes back.

pub mod mock;
pub mod vertex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error type for backend calls.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Failed to obtain access token: {0}")]
    Auth(String),

    #[error("Backend returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Backend returned no predictions")]
    EmptyPredictions,
}

/// One unit of input in a prediction batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub prompt: String,
}

impl Instance {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// What a backend hands back for a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendPrediction {
    /// Raw outputs, one per instance, in order.
    pub predictions: Vec<Value>,
    /// Empty when the backend does not report one.
    pub model_version_id: String,
    pub deployed_model_id: Option<String>,
}

/// Output for the first instance of a batch, with the model that served it.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstPrediction {
    pub prediction: Value,
    pub model_version_id: String,
    pub deployed_model_id: Option<String>,
}

impl BackendPrediction {
    /// Take the output for the first instance of the batch.
    pub fn into_first(self) -> Result<FirstPrediction, BackendError> {
        let prediction = self
            .predictions
            .into_iter()
            .next()
            .ok_or(BackendError::EmptyPredictions)?;

        Ok(FirstPrediction {
            prediction,
            model_version_id: self.model_version_id,
            deployed_model_id: self.deployed_model_id,
        })
    }
}

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Submit one synchronous prediction request.
    async fn predict(&self, instances: Vec<Instance>) -> Result<BackendPrediction, BackendError>;

    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn into_first_takes_head_of_predictions() {
        let prediction = BackendPrediction {
            predictions: vec![json!("Hi there"), json!("ignored")],
            model_version_id: "v1".into(),
            deployed_model_id: Some("987".into()),
        };

        let first = prediction.into_first().unwrap();
        assert_eq!(first.prediction, json!("Hi there"));
        assert_eq!(first.model_version_id, "v1");
        assert_eq!(first.deployed_model_id.as_deref(), Some("987"));
    }

    #[test]
    fn into_first_rejects_empty_predictions() {
        let prediction = BackendPrediction {
            predictions: vec![],
            model_version_id: "v1".into(),
            deployed_model_id: None,
        };

        assert!(matches!(
            prediction.into_first(),
            Err(BackendError::EmptyPredictions)
        ));
    }
}
