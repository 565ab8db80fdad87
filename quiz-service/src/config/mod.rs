use secrecy::Secret;
use service_core::config::{self as core_config, get_env, get_optional_env, is_production};
use service_core::error::AppError;

const DEFAULT_WORKFLOW_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct QuizConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub workflow: WorkflowConfig,
    pub cors: CorsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Enrichment is disabled when no API key is configured.
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub deployment_name: String,
    pub release_tag: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl QuizConfig {
    pub fn load() -> Result<Self, AppError> {
        // Common config handles .env and the APP__ prefix.
        let common = core_config::Config::load()?;
        let is_prod = is_production();

        Ok(QuizConfig {
            common,
            mongodb: MongoConfig {
                uri: Secret::new(get_env("MONGO_URL", None, is_prod)?),
                database: get_env("MONGO_DATABASE", Some("quizdb"), is_prod)?,
                collection: get_env("MONGO_COLLECTION", Some("quizzes"), is_prod)?,
            },
            workflow: WorkflowConfig {
                api_key: get_optional_env("VELLUM_API_KEY").map(Secret::new),
                base_url: get_env("VELLUM_BASE_URL", Some("https://predict.vellum.ai"), false)?,
                deployment_name: get_env("VELLUM_WORKFLOW_DEPLOYMENT", Some("prompting"), false)?,
                release_tag: get_env("VELLUM_RELEASE_TAG", Some("LATEST"), false)?,
                timeout_secs: get_env(
                    "VELLUM_TIMEOUT_SECS",
                    Some(&DEFAULT_WORKFLOW_TIMEOUT_SECS.to_string()),
                    false,
                )?
                .parse()
                .map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid VELLUM_TIMEOUT_SECS: {}", e))
                })?,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&get_env(
                    "CORS_ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    false,
                )?),
            },
            observability: ObservabilityConfig {
                log_level: get_env("LOG_LEVEL", Some("info"), false)?,
                otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
            },
        })
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.workflow.api_key.is_some()
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
