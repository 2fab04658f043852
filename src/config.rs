//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. The admin allowlist and
//! commission split live here so that an invalid split is rejected at
//! startup, before any transaction is processed.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

use crate::domain::{CommissionShares, RateSnapshot, UserId};
use crate::error::{ConfigError, Result};
use crate::service::{CommissionConfig, DEFAULT_HISTORY_RETENTION};

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub commission: CommissionSection,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "teamex.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

/// Seed rates and history retention.
#[derive(Debug, Deserialize)]
pub struct RatesConfig {
    #[serde(default = "default_buy_rate")]
    pub default_buy: Decimal,
    #[serde(default = "default_sell_rate")]
    pub default_sell: Decimal,
    #[serde(default = "default_history_retention")]
    pub history_retention: usize,
}

fn default_buy_rate() -> Decimal {
    Decimal::new(805, 1) // 80.5 RUB per USDT
}

fn default_sell_rate() -> Decimal {
    Decimal::new(780, 1) // 78.0 RUB per USDT
}

fn default_history_retention() -> usize {
    DEFAULT_HISTORY_RETENTION
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            default_buy: default_buy_rate(),
            default_sell: default_sell_rate(),
            history_retention: default_history_retention(),
        }
    }
}

/// Commission rate and per-line shares.
#[derive(Debug, Deserialize)]
pub struct CommissionSection {
    #[serde(default = "default_commission_rate")]
    pub rate: Decimal,
    #[serde(default = "default_platform_share")]
    pub platform_share: Decimal,
    #[serde(default = "default_first_line_share")]
    pub first_line_share: Decimal,
    #[serde(default = "default_second_line_share")]
    pub second_line_share: Decimal,
    #[serde(default = "default_third_line_share")]
    pub third_line_share: Decimal,
}

fn default_commission_rate() -> Decimal {
    Decimal::new(1, 2) // 1% of the transaction
}

fn default_platform_share() -> Decimal {
    Decimal::new(30, 2)
}

fn default_first_line_share() -> Decimal {
    Decimal::new(40, 2)
}

fn default_second_line_share() -> Decimal {
    Decimal::new(20, 2)
}

fn default_third_line_share() -> Decimal {
    Decimal::new(10, 2)
}

impl Default for CommissionSection {
    fn default() -> Self {
        Self {
            rate: default_commission_rate(),
            platform_share: default_platform_share(),
            first_line_share: default_first_line_share(),
            second_line_share: default_second_line_share(),
            third_line_share: default_third_line_share(),
        }
    }
}

impl CommissionSection {
    #[must_use]
    pub fn to_commission_config(&self) -> CommissionConfig {
        CommissionConfig {
            rate: self.rate,
            shares: CommissionShares {
                platform: self.platform_share,
                first_line: self.first_line_share,
                second_line: self.second_line_share,
                third_line: self.third_line_share,
            },
        }
    }
}

/// Telegram user ids allowed to mutate rates.
#[derive(Debug, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub user_ids: Vec<String>,
}

impl AdminConfig {
    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.user_ids.iter().map(|id| UserId::new(id.as_str()))
    }
}

#[derive(Debug, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_bot_username")]
    pub bot_username: String,
}

fn default_bot_username() -> String {
    "teamex_bot".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_username: default_bot_username(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.url",
            }
            .into());
        }
        self.default_rates()?;
        self.commission.to_commission_config().validate()?;
        Ok(())
    }

    /// The seed snapshot persisted on first read.
    pub fn default_rates(&self) -> Result<RateSnapshot> {
        Ok(RateSnapshot::try_new(
            self.rates.default_buy,
            self.rates.default_sell,
        )?)
    }
}
