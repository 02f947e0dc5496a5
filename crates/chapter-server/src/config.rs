use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CHAPTER_JWT_SECRET is unset or still a placeholder")]
    MissingSecret,

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub admin_usernames: Vec<String>,
    /// Empty means permissive CORS.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str, default: &str| vars.get(name).cloned().unwrap_or_else(|| default.to_string());

        let jwt_secret = vars.get("CHAPTER_JWT_SECRET").cloned().unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingSecret);
        }

        let host = get("CHAPTER_HOST", "0.0.0.0");
        let port = get("CHAPTER_PORT", "3000");
        let addr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "CHAPTER_HOST/CHAPTER_PORT",
                reason: e.to_string(),
            })?;

        Ok(Self {
            jwt_secret,
            db_path: get("CHAPTER_DB_PATH", "chapter.db").into(),
            addr,
            admin_usernames: split_list(vars.get("CHAPTER_ADMIN_USERNAMES")),
            cors_origins: split_list(vars.get("CHAPTER_CORS_ORIGINS")),
        })
    }
}

fn split_list(raw: Option<&String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults() {
        let config = Config::from_vars(&vars(&[("CHAPTER_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.db_path, PathBuf::from("chapter.db"));
        assert!(config.admin_usernames.is_empty());
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn refuses_placeholder_secret() {
        assert!(matches!(Config::from_vars(&vars(&[])), Err(ConfigError::MissingSecret)));
        assert!(matches!(
            Config::from_vars(&vars(&[("CHAPTER_JWT_SECRET", "dev-secret-change-me")])),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[test]
    fn parses_lists_and_port() {
        let config = Config::from_vars(&vars(&[
            ("CHAPTER_JWT_SECRET", "s3cret"),
            ("CHAPTER_PORT", "8080"),
            ("CHAPTER_ADMIN_USERNAMES", "president, treasurer,,"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.admin_usernames, vec!["president", "treasurer"]);
    }

    #[test]
    fn bad_port_is_reported() {
        let result = Config::from_vars(&vars(&[("CHAPTER_JWT_SECRET", "s3cret"), ("CHAPTER_PORT", "http")]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
