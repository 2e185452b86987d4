//! Vertex AI online prediction backend.
//!
//! Calls `endpoints/{id}:predict` on the regional Vertex AI REST API.
//! Credentials come from a static token or the GCE metadata server.

use super::{BackendError, BackendPrediction, Instance, InferenceBackend};
use crate::config::BackendConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::observability::TracedClientExt;

#[derive(Serialize)]
struct PredictRequestBody<'a> {
    instances: &'a [Instance],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictResponseBody {
    #[serde(default)]
    predictions: Vec<Value>,
    #[serde(default)]
    deployed_model_id: Option<String>,
    #[serde(default)]
    model_version_id: Option<String>,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

pub struct VertexBackend {
    predict_url: String,
    token_url: String,
    access_token: Option<String>,
    client: Client,
}

impl VertexBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent(concat!("llm-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            predict_url: config.predict_url(),
            token_url: config.metadata_token_url(),
            access_token: config.access_token.clone(),
            client,
        })
    }

    async fn access_token(&self) -> Result<String, BackendError> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }

        let response = self
            .client
            .traced_get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| BackendError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Auth(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| BackendError::Auth(format!("invalid token response: {}", e)))?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl InferenceBackend for VertexBackend {
    async fn predict(&self, instances: Vec<Instance>) -> Result<BackendPrediction, BackendError> {
        let token = self.access_token().await?;

        tracing::debug!(
            url = %self.predict_url,
            instance_count = instances.len(),
            "Sending prediction request to Vertex AI"
        );

        let response = self
            .client
            .traced_post(&self.predict_url)
            .bearer_auth(token)
            .json(&PredictRequestBody {
                instances: &instances,
            })
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api { status, body });
        }

        let body: PredictResponseBody = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        if body.predictions.is_empty() {
            return Err(BackendError::EmptyPredictions);
        }

        Ok(BackendPrediction {
            predictions: body.predictions,
            model_version_id: body.model_version_id.unwrap_or_default(),
            deployed_model_id: body.deployed_model_id,
        })
    }

    fn name(&self) -> &'static str {
        "vertex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_wraps_instances() {
        let instances = vec![Instance::new("Hello")];
        let body = serde_json::to_value(PredictRequestBody {
            instances: &instances,
        })
        .unwrap();

        assert_eq!(body, json!({ "instances": [{ "prompt": "Hello" }] }));
    }

    #[test]
    fn response_body_reads_camel_case_fields() {
        let body: PredictResponseBody = serde_json::from_value(json!({
            "predictions": ["Hi there"],
            "deployedModelId": "987",
            "model": "projects/p/locations/l/models/m",
            "modelVersionId": "1"
        }))
        .unwrap();

        assert_eq!(body.predictions, vec![json!("Hi there")]);
        assert_eq!(body.deployed_model_id.as_deref(), Some("987"));
        assert_eq!(body.model_version_id.as_deref(), Some("1"));
    }
}
