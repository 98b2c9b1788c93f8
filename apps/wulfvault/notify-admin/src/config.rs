//! Configuration for the notify admin CLI

use core_config::database::DatabaseConfig;
use core_config::{ConfigError, Environment, FromEnv};
use domain_notifications::NotificationServiceConfig;
use sea_orm::ConnectOptions;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub notifications: NotificationServiceConfig,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            database: DatabaseConfig::from_env()?,
            notifications: NotificationServiceConfig::from_env()?,
        })
    }
}

impl Config {
    /// Pool options for a short-lived admin process.
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(&self.database.url);
        options
            .max_connections(self.database.max_connections)
            .min_connections(1)
            .sqlx_logging(!self.environment.is_production());
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("APP_ENV", Some("production")),
                ("DATABASE_URL", Some("postgres://localhost/wulfvault")),
                ("DATABASE_MAX_CONNECTIONS", Some("2")),
                ("PRODUCT_NAME", Some("Acme Vault")),
                ("NOTIFY_SEND_TIMEOUT_SECS", Some("10")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.environment.is_production());
                assert_eq!(config.database.max_connections, 2);
                assert_eq!(config.notifications.product_name, "Acme Vault");
                assert_eq!(config.notifications.send_timeout, Duration::from_secs(10));

                let options = config.connect_options();
                assert_eq!(options.get_url(), "postgres://localhost/wulfvault");
                assert_eq!(options.get_max_connections(), Some(2));
            },
        );
    }

    #[test]
    fn test_config_requires_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            assert!(Config::from_env().is_err());
        });
    }
}
