/// Configuration management for the API server
///
/// Configuration comes from environment variables (a `.env` file is loaded
/// first in development).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: Enables HSTS and strict headers (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 characters (required)
/// - `SCORER_URL`: Endpoint of the AI scoring service
///   (default: http://127.0.0.1:5000/evaluate)
/// - `SCORER_TIMEOUT_SECS`: Scoring request timeout (default: 30)
/// - `PUSH_GATEWAY_URL`: Push gateway endpoint
///   (default: https://exp.host/--/api/v2/push/send)
/// - `PUSH_ENABLED`: Sends pushes when true (default: false)
/// - `PUSH_TIMEOUT_SECS`: Per-token push request timeout (default: 10)
/// - `NOTIFICATION_BUFFER`: Admin channel buffer per subscriber (default: 256)
/// - `RUST_LOG`: Log filter (default: htmlquest_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use htmlquest_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub scorer: ScorerConfig,
    pub push: PushConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` means permissive
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS, strict CSP)
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub gateway_url: String,
    pub enabled: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub buffer: usize,
}

fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` or `JWT_SECRET` is missing, the secret is
    /// shorter than 32 characters, or a numeric/boolean variable does not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = var_or("API_PORT", 8080u16)?;
        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));
        let production = var_or("PRODUCTION", false)?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = var_or("DATABASE_MAX_CONNECTIONS", 10u32)?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let scorer_url =
            env::var("SCORER_URL").unwrap_or_else(|_| "http://127.0.0.1:5000/evaluate".to_string());
        let scorer_timeout = var_or("SCORER_TIMEOUT_SECS", 30u64)?;

        let push_url = env::var("PUSH_GATEWAY_URL")
            .unwrap_or_else(|_| "https://exp.host/--/api/v2/push/send".to_string());
        let push_enabled = var_or("PUSH_ENABLED", false)?;
        let push_timeout = var_or("PUSH_TIMEOUT_SECS", 10u64)?;

        let buffer = var_or("NOTIFICATION_BUFFER", 256usize)?;

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            scorer: ScorerConfig {
                url: scorer_url,
                timeout_secs: scorer_timeout,
            },
            push: PushConfig {
                gateway_url: push_url,
                enabled: push_enabled,
                timeout_secs: push_timeout,
            },
            notifications: NotificationConfig { buffer },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Settings suitable for tests; nothing here touches the environment.
    pub fn for_tests(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: database_url.into(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: jwt_secret.into(),
            },
            scorer: ScorerConfig {
                url: "http://127.0.0.1:9/evaluate".to_string(),
                timeout_secs: 1,
            },
            push: PushConfig {
                gateway_url: "http://127.0.0.1:9/push".to_string(),
                enabled: false,
                timeout_secs: 1,
            },
            notifications: NotificationConfig { buffer: 16 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = Config::for_tests(
            "postgresql://localhost/test",
            "test-secret-key-at-least-32-bytes-long",
        );
        config.api.port = 8080;

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example ,,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(parse_origins("*"), vec!["*".to_string()]);
        assert!(parse_origins("").is_empty());
    }
}
