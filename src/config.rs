//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; SMTP settings are optional and
//! outbound email is disabled when they are absent.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Frontend URL for CORS and email links
    pub frontend_url: String,

    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    /// Identity provider REST endpoint (Identity Toolkit style)
    pub identity_api_url: String,
    /// Identity provider API key
    pub identity_api_key: String,

    // --- SMTP (optional; mailer disabled when host/email/password missing) ---
    pub smtp_host: Option<String>,
    pub smtp_email: Option<String>,
    pub smtp_password: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            identity_api_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            identity_api_key: "test_api_key".to_string(),
            smtp_host: None,
            smtp_email: None,
            smtp_password: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            identity_api_url: env::var("IDENTITY_API_URL")
                .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com/v1".to_string()),
            identity_api_key: env::var("IDENTITY_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("IDENTITY_API_KEY"))?,

            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_email: env::var("SMTP_EMAIL").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("IDENTITY_API_KEY", "test_key");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.identity_api_key, "test_key");
        assert_eq!(config.port, 8080);
        assert!(config.smtp_host.is_none() || config.smtp_host.is_some());
    }

    #[test]
    fn test_default_config_has_no_smtp() {
        let config = Config::default();
        assert!(config.smtp_host.is_none());
        assert!(!config.jwt_signing_key.is_empty());
    }
}
