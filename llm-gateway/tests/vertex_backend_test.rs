//! Vertex AI backend against a wiremock stand-in for the REST API and the
//! GCE metadata server.

use llm_gateway::config::{BackendConfig, BackendKind};
use llm_gateway::services::backends::{vertex::VertexBackend, BackendError, InferenceBackend, Instance};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREDICT_PATH: &str =
    "/v1/projects/acme/locations/us-central1/endpoints/555:predict";

fn config_for(server: &MockServer, access_token: Option<&str>) -> BackendConfig {
    BackendConfig {
        project_id: "acme".to_string(),
        endpoint_id: "555".to_string(),
        api_base: Some(server.uri()),
        access_token: access_token.map(str::to_string),
        metadata_host: server.uri(),
        ..BackendConfig::with_defaults(BackendKind::Vertex)
    }
}

#[tokio::test]
async fn sends_single_instance_with_static_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .and(header("authorization", "Bearer static-token"))
        .and(body_json(json!({ "instances": [{ "prompt": "Hello" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": ["Hi there"],
            "deployedModelId": "987",
            "modelVersionId": "v1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = VertexBackend::new(&config_for(&server, Some("static-token"))).unwrap();
    let result = backend
        .predict(vec![Instance::new("Hello")])
        .await
        .expect("prediction should succeed");

    assert_eq!(result.predictions, vec![json!("Hi there")]);
    assert_eq!(result.model_version_id, "v1");
    assert_eq!(result.deployed_model_id.as_deref(), Some("987"));
}

#[tokio::test]
async fn fetches_token_from_metadata_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/computeMetadata/v1/instance/service-accounts/default/token",
        ))
        .and(header("metadata-flavor", "Google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "metadata-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .and(header("authorization", "Bearer metadata-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{ "content": "ok" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = VertexBackend::new(&config_for(&server, None)).unwrap();
    let result = backend.predict(vec![Instance::new("Hello")]).await.unwrap();

    assert_eq!(result.predictions[0]["content"], "ok");
    assert_eq!(result.model_version_id, "");
}

#[tokio::test]
async fn metadata_failure_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let backend = VertexBackend::new(&config_for(&server, None)).unwrap();
    let err = backend
        .predict(vec![Instance::new("Hello")])
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Auth(_)), "got {:?}", err);
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let backend = VertexBackend::new(&config_for(&server, Some("t"))).unwrap();
    let err = backend
        .predict(vec![Instance::new("Hello")])
        .await
        .unwrap_err();

    match err {
        BackendError::Api { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Permission denied"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_predictions_are_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "predictions": [] })))
        .mount(&server)
        .await;

    let backend = VertexBackend::new(&config_for(&server, Some("t"))).unwrap();
    let err = backend
        .predict(vec![Instance::new("Hello")])
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::EmptyPredictions));
}

#[tokio::test]
async fn non_json_body_is_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let backend = VertexBackend::new(&config_for(&server, Some("t"))).unwrap();
    let err = backend
        .predict(vec![Instance::new("Hello")])
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let server = MockServer::start().await;
    let config = BackendConfig {
        // Nothing listens on port 1.
        api_base: Some("http://127.0.0.1:1".to_string()),
        ..config_for(&server, Some("t"))
    };

    let backend = VertexBackend::new(&config).unwrap();
    let err = backend
        .predict(vec![Instance::new("Hello")])
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Transport(_)), "got {:?}", err);
    assert!(server.received_requests().await.unwrap().is_empty());
}
