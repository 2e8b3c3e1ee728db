//! Run configuration.
//!
//! One YAML file describes the API, the source layout, the column mapping
//! and the per-column transforms:
//!
//! ```yaml
//! api:
//!   base_url: https://api.hevyapp.com
//!   auth:
//!     type: header
//!     header_name: api-key
//!     header_value_env: HEVY_API_KEY
//!   rate_limit_per_minute: 60
//!   idempotency:
//!     header_name: Idempotency-Key
//!   create:
//!     method: POST
//!     path: /v1/exercise_templates
//! source:
//!   header_row: 1
//! mapping:
//!   Name: exercise.title
//!   Muscles: exercise.other_muscles
//! required_fields: [Name]
//! transforms:
//!   Muscles: { split_csv: true, strip: true }
//! ```
//!
//! Secrets usually come from the environment; [`load_dotenv`] pulls in a
//! `.env` file first.

use reqwest::Method;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::client::{
    AuthMode, ClientConfig, ResilientClient, RetryPolicy, DEFAULT_RATE_LIMIT_PER_MINUTE,
    DEFAULT_TIMEOUT_SECS,
};
use crate::error::{ConfigError, ConfigResult};
use crate::parser::SourceOptions;
use crate::transform::{FieldMapping, RequiredFields, RowPipeline, TransformRules};
use crate::upload::Target;

const DEFAULT_AUTH_HEADER: &str = "api-key";

/// Load `.env` from the working directory, if present.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        log::debug!("loaded environment from {}", path.display());
    }
}

/// Accept `delimiter` only if the CSV reader can use it.
pub fn check_delimiter(delimiter: char) -> ConfigResult<char> {
    if delimiter.is_ascii() {
        Ok(delimiter)
    } else {
        Err(ConfigError::invalid(
            "source.delimiter",
            format!("{:?} is not a single ASCII character", delimiter),
        ))
    }
}

// =============================================================================
// API section
// =============================================================================

/// How the token is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthType {
    Bearer,
    #[default]
    #[serde(alias = "custom-header")]
    Header,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(rename = "type")]
    pub kind: AuthType,
    pub header_name: String,
    /// Literal token.
    pub header_value: Option<String>,
    /// Environment variable holding the token.
    pub header_value_env: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            kind: AuthType::default(),
            header_name: DEFAULT_AUTH_HEADER.to_string(),
            header_value: None,
            header_value_env: None,
        }
    }
}

impl AuthConfig {
    /// The literal value wins; otherwise the named variable must be set.
    pub fn token(&self) -> ConfigResult<Option<String>> {
        if let Some(value) = self.header_value.as_ref().filter(|v| !v.is_empty()) {
            return Ok(Some(value.clone()));
        }
        match &self.header_value_env {
            Some(var) => std::env::var(var)
                .map(Some)
                .map_err(|_| ConfigError::MissingEnv(var.clone())),
            None => Ok(None),
        }
    }

    pub fn mode(&self) -> AuthMode {
        match self.kind {
            AuthType::Bearer => AuthMode::Bearer,
            AuthType::Header => AuthMode::Header {
                name: self.header_name.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdempotencyConfig {
    pub header_name: String,
}

/// The create endpoint every row is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateConfig {
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_rate_limit() -> u32 {
    DEFAULT_RATE_LIMIT_PER_MINUTE
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub idempotency: Option<IdempotencyConfig>,
    #[serde(default)]
    pub custom_headers: BTreeMap<String, String>,
    pub create: CreateConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
}

// =============================================================================
// Source section
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub delimiter: Option<char>,
    /// 1-based.
    pub header_row: usize,
    pub infer_types: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        let options = SourceOptions::default();
        Self {
            delimiter: options.delimiter,
            header_row: options.header_row,
            infer_types: options.infer_types,
        }
    }
}

impl SourceConfig {
    pub fn options(&self) -> SourceOptions {
        SourceOptions {
            delimiter: self.delimiter,
            header_row: self.header_row,
            infer_types: self.infer_types,
        }
    }
}

// =============================================================================
// Whole file
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default, alias = "excel")]
    pub source: SourceConfig,
    pub mapping: FieldMapping,
    #[serde(default)]
    pub required_fields: RequiredFields,
    #[serde(default)]
    pub transforms: TransformRules,
}

impl AppConfig {
    /// Read, parse and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would fail later in the run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("api.base_url", "must not be empty"));
        }
        reqwest::Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::invalid("api.base_url", e.to_string()))?;
        self.method()?;
        if !self.api.create.path.starts_with('/') {
            return Err(ConfigError::invalid("api.create.path", "must start with '/'"));
        }
        if self.mapping.is_empty() {
            return Err(ConfigError::invalid("mapping", "must map at least one column"));
        }
        if self.source.header_row == 0 {
            return Err(ConfigError::invalid("source.header_row", "is 1-based"));
        }
        if let Some(delimiter) = self.source.delimiter {
            check_delimiter(delimiter)?;
        }
        self.transforms.validate()
    }

    pub fn method(&self) -> ConfigResult<Method> {
        let raw = self.api.create.method.trim().to_uppercase();
        Method::from_bytes(raw.as_bytes()).map_err(|_| {
            ConfigError::invalid("api.create.method", format!("unknown HTTP method '{}'", raw))
        })
    }

    pub fn target(&self) -> ConfigResult<Target> {
        Ok(Target::new(self.method()?, self.api.create.path.clone()))
    }

    /// Client settings, with the token resolved.
    pub fn client_config(&self) -> ConfigResult<ClientConfig> {
        let api = &self.api;
        let mut config = ClientConfig::new(api.base_url.clone())
            .with_auth(api.auth.mode(), api.auth.token()?)
            .with_rate_limit(api.rate_limit_per_minute)
            .with_timeout(Duration::from_secs(api.timeout_seconds));
        for (name, value) in &api.custom_headers {
            config = config.with_header(name.clone(), value.clone());
        }
        if let Some(idempotency) = &api.idempotency {
            config = config.with_idempotency_header(idempotency.header_name.clone());
        }
        Ok(config)
    }

    pub fn build_client(&self) -> ConfigResult<ResilientClient> {
        Ok(ResilientClient::new(self.client_config()?)?.with_retry_policy(self.api.retry.clone()))
    }

    pub fn pipeline(&self) -> RowPipeline {
        RowPipeline::new(self.mapping.clone())
            .with_rules(self.transforms.clone())
            .with_required(self.required_fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
api:
  base_url: https://api.hevyapp.com
  create:
    path: /v1/exercise_templates
mapping:
  Name: exercise.title
"#;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.api.rate_limit_per_minute, 60);
        assert_eq!(config.api.timeout_seconds, 20);
        assert_eq!(config.api.auth.kind, AuthType::Header);
        assert_eq!(config.api.auth.header_name, "api-key");
        assert_eq!(config.api.retry, RetryPolicy::default());
        assert_eq!(config.source, SourceConfig::default());
        assert_eq!(config.method().unwrap(), Method::POST);
        assert!(config.required_fields.is_empty());
    }

    #[test]
    fn test_full_file() {
        let yaml = r#"
api:
  base_url: https://api.example.com/
  auth:
    type: bearer
    header_value: secret
  rate_limit_per_minute: 30
  idempotency:
    header_name: Idempotency-Key
  custom_headers:
    X-Client: hevyload
  create:
    method: put
    path: /v1/things
  retry:
    max_attempts: 3
    initial_backoff_ms: 10
    max_backoff_ms: 40
excel:
  header_row: 3
  delimiter: ";"
mapping:
  Name: exercise.title
  Muscles: exercise.other_muscles
required_fields: [Name]
transforms:
  Muscles:
    split_csv: true
    strip: true
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.target().unwrap(), Target::new(Method::PUT, "/v1/things"));
        assert_eq!(config.source.options().header_row, 3);
        assert_eq!(config.source.options().delimiter, Some(';'));
        assert_eq!(config.api.retry.max_attempts, 3);
        assert_eq!(config.api.retry.initial_backoff, Duration::from_millis(10));

        let client = config.client_config().unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
        assert_eq!(client.auth, AuthMode::Bearer);
        assert_eq!(client.token.as_deref(), Some("secret"));
        assert_eq!(client.idempotency_header.as_deref(), Some("Idempotency-Key"));
        assert_eq!(client.rate_limit_per_minute, 30);

        let pipeline = config.pipeline();
        assert_eq!(pipeline.mapping.len(), 2);
        assert!(pipeline.rules.get("Muscles").is_some());
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn test_token_from_env() {
        std::env::set_var("HEVYLOAD_TEST_TOKEN_SET", "from-env");
        let auth = AuthConfig {
            header_value_env: Some("HEVYLOAD_TEST_TOKEN_SET".into()),
            ..AuthConfig::default()
        };
        assert_eq!(auth.token().unwrap().as_deref(), Some("from-env"));

        let auth = AuthConfig {
            header_value_env: Some("HEVYLOAD_TEST_TOKEN_UNSET".into()),
            ..AuthConfig::default()
        };
        assert!(matches!(
            auth.token(),
            Err(ConfigError::MissingEnv(var)) if var == "HEVYLOAD_TEST_TOKEN_UNSET"
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_url = MINIMAL.replace("https://api.hevyapp.com", "not a url");
        assert!(matches!(
            AppConfig::from_yaml(&bad_url),
            Err(ConfigError::InvalidValue { field, .. }) if field == "api.base_url"
        ));

        let bad_method = MINIMAL.replace("    path:", "    method: \"NOT A METHOD\"\n    path:");
        assert!(matches!(
            AppConfig::from_yaml(&bad_method),
            Err(ConfigError::InvalidValue { field, .. }) if field == "api.create.method"
        ));

        let bad_bounds = format!("{}transforms:\n  Weight: {{ min: 10, max: 1 }}\n", MINIMAL);
        assert!(AppConfig::from_yaml(&bad_bounds).is_err());

        let unknown_rule = format!("{}transforms:\n  Weight: {{ clamp: true }}\n", MINIMAL);
        assert!(matches!(AppConfig::from_yaml(&unknown_rule), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let yaml = format!("{}source:\n  delimiter: \"§\"\n", MINIMAL);
        assert!(matches!(
            AppConfig::from_yaml(&yaml),
            Err(ConfigError::InvalidValue { field, .. }) if field == "source.delimiter"
        ));
        assert_eq!(check_delimiter('\t').unwrap(), '\t');
        assert!(check_delimiter('→').is_err());
    }

    #[test]
    fn test_empty_mapping_rejected() {
        let yaml = MINIMAL.replace("  Name: exercise.title\n", "  {}\n");
        assert!(AppConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::load("/nonexistent/hevyload.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
