use anyhow::Context;
use config::{Config, Environment};
use serde::Deserialize;

use crate::livros_repository::PostgresLivrosRepositoryConfig;

/// Process settings, read from environment variables
/// (`PORT`, `USE_IN_MEMORY_DB`, `DB_HOST`, `DB_USERNAME`, `DB_PASSWORD`)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppSettings {
    pub port: u16,
    pub use_in_memory_db: bool,
    pub db_host: String,
    pub db_username: String,
    pub db_password: String,
}

impl AppSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_environment(Environment::default())
    }

    fn from_environment(environment: Environment) -> anyhow::Result<Self> {
        Config::builder()
            .set_default("port", 3000)?
            .set_default("use_in_memory_db", false)?
            .set_default("db_host", "127.0.0.1")?
            .set_default("db_username", "postgres")?
            .set_default("db_password", "postgres")?
            .add_source(environment.try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn postgres_config(&self) -> PostgresLivrosRepositoryConfig {
        PostgresLivrosRepositoryConfig {
            hostname: self.db_host.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
        }
    }
}

#[cfg(test)]
mod app_settings_tests {
    use std::collections::HashMap;

    use config::Environment;

    use crate::app_settings::AppSettings;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Environment::default().source(Some(source))
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = AppSettings::from_environment(environment(&[])).unwrap();
        assert_eq!(
            settings,
            AppSettings {
                port: 3000,
                use_in_memory_db: false,
                db_host: "127.0.0.1".to_string(),
                db_username: "postgres".to_string(),
                db_password: "postgres".to_string(),
            }
        );
    }

    #[test]
    fn test_values_from_environment() {
        let settings = AppSettings::from_environment(environment(&[
            ("PORT", "8081"),
            ("USE_IN_MEMORY_DB", "true"),
            ("DB_HOST", "db"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 8081);
        assert!(settings.use_in_memory_db);
        assert_eq!(settings.db_host, "db");
        assert_eq!(settings.postgres_config().hostname, "db");
    }
}
