use crate::core::{money, AppError, Result};
use crate::modules::snapshots::FeeMode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub fees: FeeConfig,
    pub gateway: GatewayConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Platform service-fee settings
#[derive(Debug, Clone, Deserialize)]
pub struct FeeConfig {
    /// Percentage applied when a school has no active rate
    pub default_percentage: Decimal,
    /// Whether the fee is added on top of the tuition amount or deducted from it
    pub mode: FeeMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Result code the gateway uses for a successful payment
    pub success_code: String,
    /// HMAC secret for callback signatures; unsigned callbacks are accepted when unset
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                log_format: env::var("LOG_FORMAT")
                    .unwrap_or_else(|_| "pretty".to_string())
                    .parse()
                    .map_err(AppError::Configuration)?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            fees: FeeConfig {
                default_percentage: env::var("DEFAULT_FEE_PERCENTAGE")
                    .unwrap_or_else(|_| "2.5".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid DEFAULT_FEE_PERCENTAGE".to_string())
                    })?,
                mode: env::var("FEE_MODE")
                    .unwrap_or_else(|_| "additive".to_string())
                    .parse()
                    .map_err(AppError::Configuration)?,
            },
            gateway: GatewayConfig {
                success_code: env::var("GATEWAY_SUCCESS_CODE")
                    .unwrap_or_else(|_| "INS-0".to_string()),
                webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            },
            security: SecurityConfig {
                cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                    .ok()
                    .filter(|s| !s.is_empty()),
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        money::validate_percentage(self.fees.default_percentage).map_err(|_| {
            AppError::Configuration(format!(
                "DEFAULT_FEE_PERCENTAGE must be between 0 and 100, got {}",
                self.fees.default_percentage
            ))
        })?;

        if self.gateway.success_code.trim().is_empty() {
            return Err(AppError::Configuration(
                "GATEWAY_SUCCESS_CODE cannot be empty".to_string(),
            ));
        }

        if self.database.max_connections < self.database.pool_size {
            return Err(AppError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be at least DATABASE_POOL_SIZE".to_string(),
            ));
        }

        if self.database.acquire_timeout_secs == 0 {
            return Err(AppError::Configuration(
                "DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
