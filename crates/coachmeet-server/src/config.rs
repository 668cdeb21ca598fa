use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Secrets that ship in sample env files and must never reach a server.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("COACHMEET_JWT_SECRET is not set")]
    MissingSecret,
    #[error("COACHMEET_JWT_SECRET is still a placeholder value")]
    PlaceholderSecret,
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub enforce_meet_capacity: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source, `COACHMEET_*` names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("COACHMEET_JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::MissingSecret)?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::PlaceholderSecret);
        }

        let host = lookup("COACHMEET_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("COACHMEET_PORT").unwrap_or_else(|| "3000".into());
        let addr = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                name: "COACHMEET_HOST/COACHMEET_PORT",
                value: format!("{}:{}", host, port),
            })?;

        let db_path = lookup("COACHMEET_DB_PATH").unwrap_or_else(|| "coachmeet.db".into());

        let token_ttl_days = match lookup("COACHMEET_TOKEN_TTL_DAYS") {
            None => 30,
            Some(value) => match value.parse::<i64>() {
                Ok(days) if days > 0 => days,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "COACHMEET_TOKEN_TTL_DAYS",
                        value,
                    });
                }
            },
        };

        let enforce_meet_capacity = match lookup("COACHMEET_ENFORCE_MEET_CAPACITY") {
            None => false,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "COACHMEET_ENFORCE_MEET_CAPACITY",
                        value,
                    });
                }
            },
        };

        Ok(Self {
            addr,
            db_path: PathBuf::from(db_path),
            jwt_secret,
            token_ttl_days,
            enforce_meet_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_with_only_a_secret() {
        let config = load(&[("COACHMEET_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.db_path, PathBuf::from("coachmeet.db"));
        assert_eq!(config.token_ttl_days, 30);
        assert!(!config.enforce_meet_capacity);
    }

    #[test]
    fn secret_is_required_and_not_a_placeholder() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingSecret)));
        assert!(matches!(
            load(&[("COACHMEET_JWT_SECRET", "dev-secret-change-me")]),
            Err(ConfigError::PlaceholderSecret)
        ));
    }

    #[test]
    fn overrides_and_invalid_values() {
        let config = load(&[
            ("COACHMEET_JWT_SECRET", "s3cret"),
            ("COACHMEET_HOST", "127.0.0.1"),
            ("COACHMEET_PORT", "8080"),
            ("COACHMEET_TOKEN_TTL_DAYS", "7"),
            ("COACHMEET_ENFORCE_MEET_CAPACITY", "true"),
        ])
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.token_ttl_days, 7);
        assert!(config.enforce_meet_capacity);

        assert!(matches!(
            load(&[("COACHMEET_JWT_SECRET", "s3cret"), ("COACHMEET_PORT", "http")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            load(&[("COACHMEET_JWT_SECRET", "s3cret"), ("COACHMEET_TOKEN_TTL_DAYS", "0")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
