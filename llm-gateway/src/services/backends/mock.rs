//! Mock backend for local runs and tests.

use super::{BackendError, BackendPrediction, Instance, InferenceBackend};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

enum MockOutcome {
    Succeed {
        predictions: Vec<Value>,
        model_version_id: String,
    },
    Fail(String),
    Echo,
}

/// Backend that answers from a canned outcome and remembers every batch.
pub struct MockBackend {
    outcome: MockOutcome,
    calls: Mutex<Vec<Vec<Instance>>>,
}

impl MockBackend {
    /// Always return `predictions` tagged with `model_version_id`.
    pub fn succeeding(predictions: Vec<Value>, model_version_id: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Succeed {
            predictions,
            model_version_id: model_version_id.into(),
        })
    }

    /// Always fail with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Fail(message.into()))
    }

    /// Reply with `Mock response for: <prompt>` for each instance.
    pub fn echo() -> Self {
        Self::with_outcome(MockOutcome::Echo)
    }

    fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Batches received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<Instance>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn predict(&self, instances: Vec<Instance>) -> Result<BackendPrediction, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(instances.clone());
        }

        match &self.outcome {
            MockOutcome::Succeed {
                predictions,
                model_version_id,
            } => Ok(BackendPrediction {
                predictions: predictions.clone(),
                model_version_id: model_version_id.clone(),
                deployed_model_id: None,
            }),
            MockOutcome::Fail(message) => Err(BackendError::Api {
                status: 500,
                body: message.clone(),
            }),
            MockOutcome::Echo => Ok(BackendPrediction {
                predictions: instances
                    .iter()
                    .map(|i| Value::String(format!("Mock response for: {}", i.prompt)))
                    .collect(),
                model_version_id: "mock".to_string(),
                deployed_model_id: None,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
