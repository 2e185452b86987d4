use service_core::config::{self as core_config, get_env, get_env_opt};
use service_core::error::AppError;

pub const DEFAULT_PROJECT_ID: &str = "your-project-id";
pub const DEFAULT_ENDPOINT_ID: &str = "1234567890";
pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Built once at startup by [`GatewayConfig::load`] and passed down explicitly.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub backend: BackendConfig,
    pub observability: ObservabilityConfig,
}

/// Which inference backend serves `/predict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Vertex,
    Mock,
}

impl std::str::FromStr for BackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertex" => Ok(BackendKind::Vertex),
            "mock" => Ok(BackendKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "INFERENCE_BACKEND must be 'vertex' or 'mock', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub project_id: String,
    pub endpoint_id: String,
    pub region: String,
    /// Overrides `https://{region}-aiplatform.googleapis.com`.
    pub api_base: Option<String>,
    /// Static bearer token. When unset the metadata server is asked per call.
    pub access_token: Option<String>,
    pub metadata_host: String,
}

impl BackendConfig {
    /// Placeholder-valued config for local runs and tests.
    pub fn with_defaults(kind: BackendKind) -> Self {
        Self {
            kind,
            project_id: DEFAULT_PROJECT_ID.to_string(),
            endpoint_id: DEFAULT_ENDPOINT_ID.to_string(),
            region: DEFAULT_REGION.to_string(),
            api_base: None,
            access_token: None,
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
        }
    }

    pub fn api_base(&self) -> String {
        match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.region),
        }
    }

    /// Full `:predict` URL of the configured endpoint.
    pub fn predict_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/endpoints/{}:predict",
            self.api_base(),
            self.project_id,
            self.region,
            self.endpoint_id
        )
    }

    pub fn metadata_token_url(&self) -> String {
        let host = self.metadata_host.trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            base
        )
    }
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            otlp_endpoint: None,
        }
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        Ok(GatewayConfig {
            common: common_config,
            backend: BackendConfig {
                kind: get_env("INFERENCE_BACKEND", Some("vertex"))?.parse()?,
                project_id: get_env("GCP_PROJECT_ID", Some(DEFAULT_PROJECT_ID))?,
                endpoint_id: get_env("VERTEX_ENDPOINT_ID", Some(DEFAULT_ENDPOINT_ID))?,
                region: get_env("REGION", Some(DEFAULT_REGION))?,
                api_base: get_env_opt("VERTEX_API_BASE"),
                access_token: get_env_opt("VERTEX_ACCESS_TOKEN"),
                metadata_host: get_env("GCE_METADATA_HOST", Some(DEFAULT_METADATA_HOST))?,
            },
            observability: ObservabilityConfig {
                log_level: get_env("LOG_LEVEL", Some("info"))?,
                otlp_endpoint: get_env_opt("OTLP_ENDPOINT"),
            },
        })
    }
}
