use crate::application::aggregator::TelemetryAggregator;
use crate::application::day_key::{DayKeyError, DayKeyFormat};
use crate::application::tank_service::TankCatalog;
use crate::domain::billing::BillingPolicy;
use crate::domain::tank::Tank;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

const ENV_PREFIX: &str = "TANK";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid billing date key: {0}")]
    DayKey(#[from] DayKeyError),
    #[error("tank '{0}' has a negative or non-finite capacity")]
    Capacity(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxConfig {
    pub influx: InfluxSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
    pub tank_ids_query: String,
    /// Template with `${tank}` and `${days}` placeholders
    pub records_query: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub billing: BillingSettings,
    #[serde(default)]
    pub tanks: Vec<TankConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BillingSettings {
    pub refill_threshold: f64,
    pub unit_price: f64,
    pub date_format: String,
    pub timezone: String,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            refill_threshold: BillingPolicy::DEFAULT_REFILL_THRESHOLD,
            unit_price: BillingPolicy::DEFAULT_UNIT_PRICE,
            date_format: DayKeyFormat::DEFAULT_PATTERN.to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TankConfig {
    pub id: String,
    pub name: Option<String>,
    pub capacity: f64,
}

impl AppConfig {
    pub fn aggregator(&self) -> Result<TelemetryAggregator, ConfigError> {
        let policy = BillingPolicy::new(self.billing.refill_threshold, self.billing.unit_price);
        let day_keys = DayKeyFormat::new(&self.billing.date_format, &self.billing.timezone)?;
        Ok(TelemetryAggregator::new(policy, day_keys))
    }

    pub fn catalog(&self) -> Result<TankCatalog, ConfigError> {
        let tanks = self
            .tanks
            .iter()
            .map(|t| {
                if !t.capacity.is_finite() || t.capacity < 0.0 {
                    return Err(ConfigError::Capacity(t.id.clone()));
                }
                Ok(Tank::new(t.id.clone(), Some(t.capacity)).with_name(t.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TankCatalog::new(tanks))
    }
}

fn builder(file: &str) -> config::ConfigBuilder<config::builder::DefaultState> {
    config::Config::builder()
        .add_source(config::File::with_name(file))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
}

pub fn load_influx_config() -> Result<InfluxConfig, ConfigError> {
    let settings = builder("config/influx").build()?;
    Ok(settings.try_deserialize()?)
}

pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    let settings = builder("config/app").build()?;
    Ok(settings.try_deserialize()?)
}

/// Replace template variables in a query string
pub fn prepare_query(query: &str, vars: &HashMap<String, String>) -> String {
    let mut result = query.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
