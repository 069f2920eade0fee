//! Client configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

/// Environment variable holding the API token.
pub const TOKEN_VAR: &str = "CROWDRUN_TOKEN";
/// Environment variable selecting `production` or `sandbox`.
pub const ENVIRONMENT_VAR: &str = "CROWDRUN_ENVIRONMENT";
/// Environment variable overriding the API base URL.
pub const BASE_URL_VAR: &str = "CROWDRUN_BASE_URL";

/// Platform environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    /// API base URL of the environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://toloka.dev/api",
            Self::Sandbox => "https://sandbox.toloka.dev/api",
        }
    }
}

impl FromStr for Environment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(ClientError::Config(format!("unknown environment: {other}"))),
        }
    }
}

/// Platform client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,

    /// Overrides the environment's base URL (e.g. for a proxy or a test server).
    pub base_url: Option<String>,

    /// OAuth token of the requester.
    pub token: String,

    /// Sent as `X-Caller-Context` so the platform can attribute traffic.
    pub caller_context: Option<String>,

    /// Per-request timeout (seconds).
    pub request_timeout_secs: u64,

    /// Delay between operation status checks (seconds).
    pub operation_poll_interval_secs: u64,

    /// Give up waiting for an operation after this long (seconds).
    pub operation_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            base_url: None,
            token: String::new(),
            caller_context: Some("crowdrun".to_string()),
            request_timeout_secs: 30,
            operation_poll_interval_secs: 1,
            operation_timeout_secs: 600,
        }
    }
}

impl ClientConfig {
    /// Create a config for `environment` with the given token.
    pub fn new(environment: Environment, token: impl Into<String>) -> Self {
        Self {
            environment,
            token: token.into(),
            ..Self::default()
        }
    }

    /// Load from `CROWDRUN_TOKEN`, `CROWDRUN_ENVIRONMENT` and
    /// `CROWDRUN_BASE_URL`. Only the token is required.
    pub fn from_env() -> Result<Self, ClientError> {
        let token = env::var(TOKEN_VAR)
            .map_err(|_| ClientError::Config(format!("{TOKEN_VAR} is not set")))?;
        let environment = match env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };

        Ok(Self {
            base_url: env::var(BASE_URL_VAR).ok(),
            ..Self::new(environment, token)
        })
    }

    /// Effective API base URL, without a trailing slash.
    pub fn api_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn operation_poll_interval(&self) -> Duration {
        Duration::from_secs(self.operation_poll_interval_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("Sandbox".parse::<Environment>().unwrap(), Environment::Sandbox);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert!(matches!(
            "staging".parse::<Environment>(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_api_url_override() {
        let mut config = ClientConfig::new(Environment::Sandbox, "t");
        assert_eq!(config.api_url(), "https://sandbox.toloka.dev/api");

        config.base_url = Some("http://localhost:8080/api/".to_string());
        assert_eq!(config.api_url(), "http://localhost:8080/api");
    }
}
