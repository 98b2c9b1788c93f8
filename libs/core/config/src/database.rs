use crate::{env_parse_or_default, env_required, ConfigError, FromEnv};

/// Connection settings for the relational store holding provider configuration.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            max_connections: 5,
        }
    }
}

impl FromEnv for DatabaseConfig {
    /// Requires DATABASE_URL; DATABASE_MAX_CONNECTIONS defaults to 5
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_required("DATABASE_URL")?,
            max_connections: env_parse_or_default("DATABASE_MAX_CONNECTIONS", 5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_from_env_success() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/wulfvault")),
                ("DATABASE_MAX_CONNECTIONS", None),
            ],
            || {
                let config = DatabaseConfig::from_env().unwrap();
                assert_eq!(config.url, "postgres://localhost/wulfvault");
                assert_eq!(config.max_connections, 5);
            },
        );
    }

    #[test]
    fn test_database_config_from_env_missing() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = DatabaseConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn test_database_config_bad_pool_size() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/wulfvault")),
                ("DATABASE_MAX_CONNECTIONS", Some("many")),
            ],
            || {
                assert!(DatabaseConfig::from_env().is_err());
            },
        );
    }
}
