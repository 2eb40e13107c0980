use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_parsed, Environment};
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub allowed_origins: Vec<String>,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub inventory: InventoryRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryRules {
    /// Quantities below this (and above zero) are reported as Low Stock.
    pub low_stock_threshold: i64,
    /// Upper bound on time spent retrying transient transaction failures.
    pub transaction_max_elapsed_ms: u64,
}

const DEV_JWT_SECRET: &str = "dev-only-inventory-secret-change-me";

impl InventoryConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let environment = Environment::current()?;
        let is_prod = environment.is_prod();

        let allowed_origins = get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let config = InventoryConfig {
            common: common_config,
            environment,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            allowed_origins,
            mongodb: MongoConfig {
                uri: get_env(
                    "MONGODB_URI",
                    Some("mongodb://localhost:27017/?replicaSet=rs0"),
                    is_prod,
                )?,
                database: get_env("MONGODB_DATABASE", Some("inventory_db"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", Some(DEV_JWT_SECRET), is_prod)?,
                expiry_hours: get_env_parsed("JWT_EXPIRY_HOURS", Some("24"), is_prod)?,
            },
            inventory: InventoryRules {
                low_stock_threshold: get_env_parsed("LOW_STOCK_THRESHOLD", Some("10"), is_prod)?,
                transaction_max_elapsed_ms: get_env_parsed(
                    "TRANSACTION_MAX_ELAPSED_MS",
                    Some("5000"),
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.len() < 16 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be at least 16 characters"
            )));
        }
        if self.jwt.expiry_hours <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_HOURS must be positive"
            )));
        }
        if self.inventory.low_stock_threshold < 1 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LOW_STOCK_THRESHOLD must be at least 1"
            )));
        }
        Ok(())
    }
}
