// Billing domain models derived from telemetry
use serde::{Serialize, Serializer};
use std::fmt;

/// Grouping key of a daily summary.
///
/// Records whose reading time cannot be resolved share the `Undated` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DayKey {
    Date(String),
    Undated,
}

impl DayKey {
    pub const UNDATED_LABEL: &'static str = "undated";

    pub fn as_str(&self) -> &str {
        match self {
            DayKey::Date(key) => key,
            DayKey::Undated => Self::UNDATED_LABEL,
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: DayKey,
    pub total_level: f64,
    pub count: u32,
    pub average_level: f64,
    pub refill_cycles: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MonthlyBill {
    pub total: f64,
    pub rows: Vec<DailySummary>,
}

impl MonthlyBill {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Pricing constants applied to refill cycles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillingPolicy {
    /// Readings at or above this level count as a refill cycle
    pub refill_threshold: f64,
    /// Currency units per 1000 volume units refilled
    pub unit_price: f64,
}

impl BillingPolicy {
    pub const DEFAULT_REFILL_THRESHOLD: f64 = 98.0;
    pub const DEFAULT_UNIT_PRICE: f64 = 20.0;

    pub fn new(refill_threshold: f64, unit_price: f64) -> Self {
        Self {
            refill_threshold,
            unit_price,
        }
    }

    pub fn is_refill(&self, level: f64) -> bool {
        level >= self.refill_threshold
    }

    pub fn price(&self, refill_cycles: u32, capacity: f64) -> f64 {
        (refill_cycles as f64 * capacity / 1000.0) * self.unit_price
    }
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_REFILL_THRESHOLD, Self::DEFAULT_UNIT_PRICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_price() {
        let policy = BillingPolicy::default();
        assert_eq!(policy.price(1, 1000.0), 20.0);
        assert_eq!(policy.price(3, 500.0), 30.0);
        assert_eq!(policy.price(0, 1000.0), 0.0);
        assert_eq!(policy.price(2, 0.0), 0.0);
    }

    #[test]
    fn test_refill_threshold_is_inclusive() {
        let policy = BillingPolicy::default();
        assert!(policy.is_refill(98.0));
        assert!(policy.is_refill(100.0));
        assert!(!policy.is_refill(97.999));
    }

    #[test]
    fn test_day_key_serializes_as_string() {
        let json = serde_json::to_string(&vec![DayKey::Date("10/02/2026".into()), DayKey::Undated]).unwrap();
        assert_eq!(json, r#"["10/02/2026","undated"]"#);
    }
}
