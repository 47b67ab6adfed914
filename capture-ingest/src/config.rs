use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("GitHub repository must not be empty")]
    EmptyRepository,

    #[error("GitHub repository must be of the form owner/name: {0}")]
    InvalidRepository(String),

    #[error("GitHub token must not be empty")]
    EmptyToken,
}

/// Ingestion service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for incoming capture submissions
    pub listener: Listener,
    /// Trusted reverse-proxy header carrying the caller IP
    ///
    /// Note: requests without this header all share the literal "unknown"
    /// rate-limit key. This matches the deployed behavior and is kept as-is.
    #[serde(default = "default_client_ip_header")]
    pub client_ip_header: String,
    /// External rate limiter collaborator
    pub rate_limiter: RateLimiterConfig,
    /// Issue tracker the captures are forwarded to
    pub github: GithubConfig,
}

impl Config {
    /// Validates the service configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.github.validate()?;
        Ok(())
    }
}

fn default_client_ip_header() -> String {
    "CF-Connecting-IP".to_string()
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Rate limiter collaborator configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RateLimiterConfig {
    /// URL of the limit endpoint
    ///
    /// Note: Uses the `url::Url` type so invalid URLs are rejected during
    /// config deserialization.
    pub url: Url,
}

/// Issue tracker configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GithubConfig {
    /// Target repository, "owner/name"
    pub repo: String,
    /// Bearer token used to authenticate issue creation
    pub token: String,
    /// Base API URL, overridable for testing against a stub tracker
    #[serde(default = "default_api_base")]
    pub api_base: Url,
}

impl GithubConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.repo.is_empty() {
            return Err(ValidationError::EmptyRepository);
        }

        let mut parts = self.repo.split('/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if owner.is_empty() || name.is_empty() || parts.next().is_some() {
            return Err(ValidationError::InvalidRepository(self.repo.clone()));
        }

        if self.token.is_empty() {
            return Err(ValidationError::EmptyToken);
        }

        Ok(())
    }
}

fn default_api_base() -> Url {
    Url::parse("https://api.github.com").expect("default API base is a valid URL")
}
