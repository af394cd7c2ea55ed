//! Centralized configuration for the token lifecycle engine.
//!
//! All configuration is loaded from environment variables and validated
//! at startup. The deployment environment is an explicit value threaded
//! through construction, never an ambient process-global lookup.

use crate::error::TokenError;
use chrono::Duration;
use std::env;

/// Deployment environment.
///
/// Drives secret strength requirements, subject marker policy, and how
/// much diagnostic detail error responses may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development.
    Development,
    /// Automated test runs.
    Test,
    /// Production.
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn from_str(s: &str) -> Result<Self, TokenError> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(TokenError::config(format!("unknown environment: {}", other))),
        }
    }

    /// Environment name as embedded in logs and reason codes.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    /// Whether this is the production environment.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Token lifecycle configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment.
    pub environment: Environment,
    /// `iss` claim stamped into and required from access tokens.
    pub issuer: String,
    /// Accepted audience set; issued tokens carry all of these.
    pub audiences: Vec<String>,
    /// Access token lifetime (nominal 15 minutes).
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (nominal 7 days).
    pub refresh_token_ttl: Duration,
    /// Session lifetime.
    pub session_ttl: Duration,
    /// Absolute ceiling on `exp - iat` of any accepted access token,
    /// independent of the nominal access lifetime. Bounds forged but
    /// correctly signed long-lived tokens.
    pub max_token_lifetime: Duration,
}

impl Config {
    /// Defaults for the given environment.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            issuer: "auth-platform".to_string(),
            audiences: vec!["api".to_string()],
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
            session_ttl: Duration::days(30),
            max_token_lifetime: Duration::days(7),
        }
    }

    /// Set the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set the audience list.
    #[must_use]
    pub fn with_audiences(mut self, audiences: Vec<String>) -> Self {
        self.audiences = audiences;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `TOKEN_ENVIRONMENT` is unknown or any numeric
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_str(
            &env::var("TOKEN_ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        )?;
        let issuer = env::var("TOKEN_ISSUER").unwrap_or_else(|_| "auth-platform".to_string());
        let audiences = env::var("TOKEN_AUDIENCE")
            .unwrap_or_else(|_| "api".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            environment,
            issuer,
            audiences,
            access_token_ttl: Duration::seconds(parse_env("ACCESS_TOKEN_TTL", 900)?),
            refresh_token_ttl: Duration::seconds(parse_env("REFRESH_TOKEN_TTL", 604_800)?),
            session_ttl: Duration::seconds(parse_env("SESSION_TTL", 2_592_000)?),
            max_token_lifetime: Duration::seconds(parse_env("MAX_TOKEN_LIFETIME", 604_800)?),
        })
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, TokenError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str("production").unwrap(), Environment::Production);
        assert_eq!(Environment::from_str("PROD").unwrap(), Environment::Production);
        assert_eq!(Environment::from_str("test").unwrap(), Environment::Test);
        assert_eq!(Environment::from_str("dev").unwrap(), Environment::Development);
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::new(Environment::Test);
        assert_eq!(config.access_token_ttl, Duration::minutes(15));
        assert_eq!(config.refresh_token_ttl, Duration::days(7));
        assert_eq!(config.max_token_lifetime, Duration::days(7));
        assert_eq!(config.issuer, "auth-platform");
        assert!(!config.environment.is_production());
    }

    #[test]
    fn test_builder() {
        let config = Config::new(Environment::Production)
            .with_issuer("accounts.example.com")
            .with_audiences(vec!["api".to_string(), "admin".to_string()]);
        assert_eq!(config.issuer, "accounts.example.com");
        assert_eq!(config.audiences.len(), 2);
    }
}
