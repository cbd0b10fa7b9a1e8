// Repository trait for telemetry data access
use crate::domain::telemetry::TelemetryRecord;
use async_trait::async_trait;

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// List all tank IDs known to the telemetry store
    async fn list_tank_ids(&self) -> anyhow::Result<Vec<String>>;

    /// Raw readings for a tank over the last `days` days, oldest first
    async fn fetch_records(&self, tank_id: &str, days: u32) -> anyhow::Result<Vec<TelemetryRecord>>;
}
