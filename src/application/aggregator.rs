// Telemetry aggregator - Daily summaries and current-month bill
//
// Stateless: every call recomputes from the full record sequence.
use crate::application::clock::Clock;
use crate::application::day_key::DayKeyFormat;
use crate::domain::billing::{BillingPolicy, DailySummary, DayKey, MonthlyBill};
use crate::domain::telemetry::TelemetryRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct TelemetryAggregator {
    policy: BillingPolicy,
    day_keys: DayKeyFormat,
}

struct DayAccumulator {
    date: DayKey,
    total_level: f64,
    count: u32,
    refill_cycles: u32,
}

impl DayAccumulator {
    fn new(date: DayKey) -> Self {
        Self {
            date,
            total_level: 0.0,
            count: 0,
            refill_cycles: 0,
        }
    }

    fn add(&mut self, level: f64, is_refill: bool) {
        self.total_level += level;
        self.count += 1;
        if is_refill {
            self.refill_cycles += 1;
        }
    }

    fn finish(self, policy: &BillingPolicy, capacity: f64) -> DailySummary {
        DailySummary {
            average_level: self.total_level / self.count as f64,
            price: policy.price(self.refill_cycles, capacity),
            date: self.date,
            total_level: self.total_level,
            count: self.count,
            refill_cycles: self.refill_cycles,
        }
    }
}

impl TelemetryAggregator {
    pub fn new(policy: BillingPolicy, day_keys: DayKeyFormat) -> Self {
        Self { policy, day_keys }
    }

    pub fn policy(&self) -> &BillingPolicy {
        &self.policy
    }

    pub fn day_keys(&self) -> &DayKeyFormat {
        &self.day_keys
    }

    /// Group records by calendar day, in order of first appearance.
    ///
    /// `None` records yield no summaries; a missing capacity bills as 0.
    pub fn summarize_by_day(
        &self,
        records: Option<&[TelemetryRecord]>,
        capacity: Option<f64>,
    ) -> Vec<DailySummary> {
        let Some(records) = records else {
            return Vec::new();
        };
        let capacity = capacity.unwrap_or(0.0);

        let mut slots: HashMap<DayKey, usize> = HashMap::new();
        let mut days: Vec<DayAccumulator> = Vec::new();

        for record in records {
            let key = match record.reading_time() {
                Some(at) => DayKey::Date(self.day_keys.key_for(&at)),
                None => DayKey::Undated,
            };
            let level = record.level();

            let slot = *slots.entry(key.clone()).or_insert_with(|| {
                days.push(DayAccumulator::new(key));
                days.len() - 1
            });
            days[slot].add(level, self.policy.is_refill(level));
        }

        tracing::debug!(
            "Summarized {} records into {} days",
            records.len(),
            days.len()
        );

        days.into_iter()
            .map(|day| day.finish(&self.policy, capacity))
            .collect()
    }

    /// Keep the summaries dated in the clock's current month and total their price.
    pub fn bill_for_current_month(
        &self,
        summaries: Option<&[DailySummary]>,
        clock: &dyn Clock,
    ) -> MonthlyBill {
        let Some(summaries) = summaries else {
            return MonthlyBill::empty();
        };

        let today = self.day_keys.local_date(&clock.now());
        let rows: Vec<DailySummary> = summaries
            .iter()
            .filter(|s| self.is_same_month(&s.date, today))
            .cloned()
            .collect();
        let total = rows.iter().map(|r| r.price).sum();

        MonthlyBill { total, rows }
    }

    fn is_same_month(&self, key: &DayKey, today: NaiveDate) -> bool {
        match key {
            DayKey::Date(key) => self
                .day_keys
                .date_of(key)
                .is_some_and(|d| d.year() == today.year() && d.month() == today.month()),
            DayKey::Undated => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<TelemetryRecord> {
        serde_json::from_value(value).unwrap()
    }

    fn summary(date: &str, price: f64) -> DailySummary {
        DailySummary {
            date: DayKey::Date(date.to_string()),
            total_level: 100.0,
            count: 1,
            average_level: 100.0,
            refill_cycles: 1,
            price,
        }
    }

    fn october() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_empty_input() {
        let aggregator = TelemetryAggregator::default();
        let empty: Vec<TelemetryRecord> = Vec::new();
        assert!(aggregator.summarize_by_day(Some(empty.as_slice()), Some(1000.0)).is_empty());
        assert!(aggregator.summarize_by_day(Some(empty.as_slice()), None).is_empty());
    }

    #[test]
    fn test_single_full_reading() {
        let aggregator = TelemetryAggregator::default();
        let input = records(json!([{ "recordedAt": "2026-10-02T08:00:00Z", "waterLevel": 100 }]));

        let days = aggregator.summarize_by_day(Some(input.as_slice()), Some(1000.0));

        assert_eq!(
            days,
            vec![DailySummary {
                date: DayKey::Date("10/02/2026".into()),
                total_level: 100.0,
                count: 1,
                average_level: 100.0,
                refill_cycles: 1,
                price: 20.0,
            }]
        );
    }

    #[test]
    fn test_threshold_boundary() {
        let aggregator = TelemetryAggregator::default();
        let input = records(json!([
            { "recordedAt": "2026-10-02T08:00:00Z", "level": 98 },
            { "recordedAt": "2026-10-02T09:00:00Z", "level": 97.999 },
        ]));

        let days = aggregator.summarize_by_day(Some(input.as_slice()), Some(1000.0));

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].refill_cycles, 1);
        assert_eq!(days[0].price, 20.0);
    }

    #[test]
    fn test_same_day_readings_merge() {
        let aggregator = TelemetryAggregator::default();
        let input = records(json!([
            { "recordedAt": "2026-10-02T00:05:00Z", "waterLevel": 40 },
            { "timestamp": "2026-10-02T23:55:00Z", "currentLevel": "60" },
        ]));

        let days = aggregator.summarize_by_day(Some(input.as_slice()), Some(1000.0));

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].count, 2);
        assert_eq!(days[0].total_level, 100.0);
        assert_eq!(days[0].average_level, 50.0);
        assert_eq!(days[0].refill_cycles, 0);
        assert_eq!(days[0].price, 0.0);
    }

    #[test]
    fn test_first_seen_order_and_undated_bucket() {
        let aggregator = TelemetryAggregator::default();
        let input = records(json!([
            { "recordedAt": "2026-10-05T10:00:00Z", "level": 99 },
            { "level": 99 },
            { "recordedAt": "2026-10-01T10:00:00Z", "level": 50 },
            { "recordedAt": "not a date", "level": 10 },
            { "recordedAt": "2026-10-05T11:00:00Z", "level": 98.5 },
        ]));

        let days = aggregator.summarize_by_day(Some(input.as_slice()), Some(500.0));
        let keys: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();

        assert_eq!(keys, vec!["10/05/2026", "undated", "10/01/2026"]);
        assert_eq!(days[0].refill_cycles, 2);
        assert_eq!(days[0].price, 20.0);
        assert_eq!(days[1].count, 2);
        assert_eq!(days[1].refill_cycles, 1);
        for day in &days {
            assert!(day.count >= 1);
            assert!(day.refill_cycles <= day.count);
        }
    }

    #[test]
    fn test_missing_levels_count_as_zero() {
        let aggregator = TelemetryAggregator::default();
        let input = records(json!([
            { "recordedAt": "2026-10-02T08:00:00Z" },
            { "recordedAt": "2026-10-02T09:00:00Z", "waterLevel": "n/a" },
            { "recordedAt": "2026-10-02T10:00:00Z", "waterLevel": 90 },
        ]));

        let days = aggregator.summarize_by_day(Some(input.as_slice()), None);

        assert_eq!(days[0].count, 3);
        assert_eq!(days[0].total_level, 90.0);
        assert_eq!(days[0].average_level, 30.0);
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let aggregator = TelemetryAggregator::default();
        let input = records(json!([
            { "recordedAt": "2026-10-02T08:00:00Z", "level": 100 },
            { "recordedAt": "2026-10-03T08:00:00Z", "level": 20 },
        ]));
        let before = input.clone();

        let first = aggregator.summarize_by_day(Some(input.as_slice()), Some(1000.0));
        let second = aggregator.summarize_by_day(Some(input.as_slice()), Some(1000.0));

        assert_eq!(first, second);
        assert_eq!(input, before);
    }

    #[test]
    fn test_monthly_filter() {
        let aggregator = TelemetryAggregator::default();
        let summaries = vec![
            summary("10/01/2026", 20.0),
            summary("09/30/2026", 40.0),
            summary("10/15/2026", 60.0),
            summary("10/15/2025", 80.0),
            DailySummary {
                date: DayKey::Undated,
                ..summary("", 100.0)
            },
        ];

        let bill = aggregator.bill_for_current_month(Some(summaries.as_slice()), &october());

        assert_eq!(bill.total, 80.0);
        let keys: Vec<&str> = bill.rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(keys, vec!["10/01/2026", "10/15/2026"]);
    }

    #[test]
    fn test_month_follows_key_timezone() {
        let aggregator = TelemetryAggregator::new(
            BillingPolicy::default(),
            DayKeyFormat::new("%Y-%m-%d", "Asia/Kolkata").unwrap(),
        );
        // 20:00 UTC on Oct 31 is already Nov 1 in Kolkata
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 31, 20, 0, 0).unwrap());
        let summaries = vec![summary("2026-10-31", 20.0), summary("2026-11-01", 40.0)];

        let bill = aggregator.bill_for_current_month(Some(summaries.as_slice()), &clock);

        assert_eq!(bill.total, 40.0);
        assert_eq!(bill.rows.len(), 1);
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let aggregator = TelemetryAggregator::default();
        let input = records(json!([
            { "recordedAt": "2026-09-29T08:00:00Z", "level": 100 },
            { "recordedAt": "2026-10-02T08:00:00Z", "level": 100 },
            { "recordedAt": "2026-10-02T18:00:00Z", "level": 99 },
            { "recordedAt": "2026-10-03T08:00:00Z", "level": 100 },
        ]));

        let days = aggregator.summarize_by_day(Some(input.as_slice()), Some(2000.0));
        let bill = aggregator.bill_for_current_month(Some(days.as_slice()), &october());

        assert_eq!(days.len(), 3);
        assert_eq!(bill.rows.len(), 2);
        assert_eq!(bill.total, 120.0);
    }

    #[test]
    fn test_missing_inputs_yield_empty_results() {
        let aggregator = TelemetryAggregator::default();
        assert!(aggregator.summarize_by_day(None, None).is_empty());
        assert_eq!(
            aggregator.bill_for_current_month(None, &october()),
            MonthlyBill { total: 0.0, rows: vec![] }
        );
    }
}
