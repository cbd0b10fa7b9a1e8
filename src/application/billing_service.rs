// Billing service - Use cases for daily usage and monthly bills
use crate::application::aggregator::TelemetryAggregator;
use crate::application::clock::Clock;
use crate::application::tank_service::TankCatalog;
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::billing::{DailySummary, MonthlyBill};
use crate::domain::tank::Tank;
use crate::domain::telemetry::records_from_json;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Enough history to cover any calendar month
const MONTH_LOOKBACK_DAYS: u32 = 31;

#[derive(Debug, Clone, Serialize)]
pub struct TankUsage {
    pub tank: Tank,
    pub days: Vec<DailySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TankBill {
    pub tank: Tank,
    pub bill: MonthlyBill,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub days: Vec<DailySummary>,
    pub bill: MonthlyBill,
}

#[derive(Clone)]
pub struct BillingService {
    repository: Arc<dyn TelemetryRepository>,
    aggregator: Arc<TelemetryAggregator>,
    catalog: TankCatalog,
    clock: Arc<dyn Clock>,
}

impl BillingService {
    pub fn new(
        repository: Arc<dyn TelemetryRepository>,
        aggregator: Arc<TelemetryAggregator>,
        catalog: TankCatalog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            aggregator,
            catalog,
            clock,
        }
    }

    pub async fn daily_usage(&self, tank_id: &str, days: u32) -> anyhow::Result<TankUsage> {
        let tank = self.catalog.resolve(tank_id);
        let records = self.repository.fetch_records(tank_id, days).await?;
        tracing::debug!("Fetched {} records for tank {} ({}d)", records.len(), tank_id, days);

        let days = self.aggregator.summarize_by_day(Some(records.as_slice()), tank.capacity);
        Ok(TankUsage { tank, days })
    }

    pub async fn monthly_bill(&self, tank_id: &str) -> anyhow::Result<TankBill> {
        let usage = self.daily_usage(tank_id, MONTH_LOOKBACK_DAYS).await?;
        let bill = self
            .aggregator
            .bill_for_current_month(Some(usage.days.as_slice()), self.clock.as_ref());

        tracing::info!(
            "Monthly bill for tank {}: {:.2} over {} days",
            tank_id,
            bill.total,
            bill.rows.len()
        );

        Ok(TankBill {
            tank: usage.tank,
            bill,
        })
    }

    /// Run the pipeline over an uploaded payload. Malformed input degrades to empty results.
    pub fn summarize_raw(&self, records: &Value, capacity: &Value) -> UsageReport {
        let records = records_from_json(records);
        let capacity = capacity.as_f64().filter(|c| c.is_finite());

        let days = self.aggregator.summarize_by_day(records.as_deref(), capacity);
        let bill = self
            .aggregator
            .bill_for_current_month(Some(days.as_slice()), self.clock.as_ref());

        UsageReport { days, bill }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::FixedClock;
    use crate::domain::telemetry::TelemetryRecord;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    struct OneTank;

    #[async_trait]
    impl TelemetryRepository for OneTank {
        async fn list_tank_ids(&self) -> anyhow::Result<Vec<String>> {
            Ok(vec!["roof".into()])
        }

        async fn fetch_records(&self, tank_id: &str, _days: u32) -> anyhow::Result<Vec<TelemetryRecord>> {
            if tank_id != "roof" {
                anyhow::bail!("no series for {}", tank_id);
            }
            Ok(vec![
                TelemetryRecord::reading(Utc.with_ymd_and_hms(2026, 9, 30, 6, 0, 0).unwrap(), 100.0),
                TelemetryRecord::reading(Utc.with_ymd_and_hms(2026, 10, 1, 6, 0, 0).unwrap(), 99.0),
                TelemetryRecord::reading(Utc.with_ymd_and_hms(2026, 10, 1, 18, 0, 0).unwrap(), 45.0),
            ])
        }
    }

    fn service() -> BillingService {
        BillingService::new(
            Arc::new(OneTank),
            Arc::new(TelemetryAggregator::default()),
            TankCatalog::new(vec![Tank::new("roof".into(), Some(1000.0))]),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap())),
        )
    }

    #[tokio::test]
    async fn test_daily_usage_uses_catalog_capacity() {
        let usage = service().daily_usage("roof", 7).await.unwrap();

        assert_eq!(usage.tank.capacity, Some(1000.0));
        assert_eq!(usage.days.len(), 2);
        assert_eq!(usage.days[0].price, 20.0);
        assert_eq!(usage.days[1].count, 2);
    }

    #[tokio::test]
    async fn test_monthly_bill_excludes_previous_month() {
        let bill = service().monthly_bill("roof").await.unwrap();

        assert_eq!(bill.bill.rows.len(), 1);
        assert_eq!(bill.bill.total, 20.0);
    }

    #[tokio::test]
    async fn test_repository_errors_propagate() {
        assert!(service().daily_usage("missing", 7).await.is_err());
    }

    #[test]
    fn test_summarize_raw_defaults() {
        let report = service().summarize_raw(&json!({ "not": "a list" }), &json!("big"));
        assert!(report.days.is_empty());
        assert_eq!(report.bill.total, 0.0);

        let report = service().summarize_raw(
            &json!([{ "recordedAt": "2026-10-03T10:00:00Z", "level": 100 }]),
            &Value::Null,
        );
        assert_eq!(report.days.len(), 1);
        assert_eq!(report.days[0].price, 0.0);
    }
}
