use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// Base URL of the public card viewer, used to build QR share links
    pub public_app_url: String,
    pub session_secret: String,
    pub session_ttl_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/vcards.db".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let public_app_url = env::var("PUBLIC_APP_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set for session signing")?;

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse()
            .map_err(|_| "Invalid SESSION_TTL_SECS")?;

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            environment,
            public_app_url,
            session_secret,
            session_ttl_secs,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Shareable URL for a public card id
    pub fn share_url(&self, public_id: &str) -> String {
        format!("{}/vcard/{}", self.public_app_url, public_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 9000,
            database_path: "./data/test.db".to_string(),
            allowed_origins: vec![],
            environment: "test".to_string(),
            public_app_url: "https://cards.example.com".to_string(),
            session_secret: "secret".to_string(),
            session_ttl_secs: 60,
        }
    }

    #[test]
    fn test_server_address() {
        assert_eq!(config().server_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_share_url() {
        assert_eq!(
            config().share_url("abc123"),
            "https://cards.example.com/vcard/abc123"
        );
    }
}
