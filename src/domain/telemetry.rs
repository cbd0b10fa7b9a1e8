// Telemetry record domain model and field resolution
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Level fields in resolution order. The first one present and not `null` wins.
pub const LEVEL_FIELDS: [LevelField; 3] = [
    LevelField::WaterLevel,
    LevelField::Level,
    LevelField::CurrentLevel,
];

/// Reading time fields in resolution order.
pub const TIME_FIELDS: [TimeField; 2] = [TimeField::RecordedAt, TimeField::Timestamp];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelField {
    WaterLevel,
    Level,
    CurrentLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    RecordedAt,
    Timestamp,
}

/// A raw tank reading as received from the telemetry store or an upload.
///
/// Every field is optional and untyped; nothing is validated until the
/// resolution step (`level`, `reading_time`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelemetryRecord {
    pub recorded_at: Option<Value>,
    pub timestamp: Option<Value>,
    pub water_level: Option<Value>,
    pub level: Option<Value>,
    pub current_level: Option<Value>,
}

impl TelemetryRecord {
    /// Build a record from a typed reading (used by repository adapters)
    pub fn reading(recorded_at: DateTime<Utc>, water_level: f64) -> Self {
        Self {
            recorded_at: Some(Value::String(recorded_at.to_rfc3339())),
            water_level: serde_json::Number::from_f64(water_level).map(Value::Number),
            ..Self::default()
        }
    }

    fn level_field(&self, field: LevelField) -> Option<&Value> {
        match field {
            LevelField::WaterLevel => self.water_level.as_ref(),
            LevelField::Level => self.level.as_ref(),
            LevelField::CurrentLevel => self.current_level.as_ref(),
        }
    }

    fn time_field(&self, field: TimeField) -> Option<&Value> {
        match field {
            TimeField::RecordedAt => self.recorded_at.as_ref(),
            TimeField::Timestamp => self.timestamp.as_ref(),
        }
    }

    /// Resolved level reading. Missing or unparseable values count as 0.
    pub fn level(&self) -> f64 {
        LEVEL_FIELDS
            .iter()
            .find_map(|f| self.level_field(*f).filter(|v| !v.is_null()))
            .map(coerce_level)
            .unwrap_or(0.0)
    }

    /// Resolved reading time, `None` when no time field resolves to an instant.
    pub fn reading_time(&self) -> Option<DateTime<Utc>> {
        TIME_FIELDS
            .iter()
            .find_map(|f| self.time_field(*f).filter(|v| !v.is_null()))
            .and_then(coerce_time)
    }
}

/// Convert an arbitrary JSON payload into records.
///
/// Returns `None` when the payload is not an array.
pub fn records_from_json(value: &Value) -> Option<Vec<TelemetryRecord>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .map(|item| TelemetryRecord::deserialize(item).unwrap_or_default())
            .collect(),
    )
}

fn coerce_level(value: &Value) -> f64 {
    let level = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    if level.is_finite() { level } else { 0.0 }
}

fn coerce_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_time_str(s.trim()),
        Value::Number(n) => epoch_millis(n).and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Whole epoch milliseconds; fractional values truncate toward zero
fn epoch_millis(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|ms| ms.is_finite() && ms.abs() < i64::MAX as f64)
            .map(|ms| ms.trunc() as i64)
    })
}

fn parse_time_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }

    // Naive date-times carry no offset; read them as UTC
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(t.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}
