// InfluxDB repository implementation
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::telemetry::TelemetryRecord;
use crate::infrastructure::config::{prepare_query, InfluxSettings};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct InfluxRepository {
    client: reqwest::Client,
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    tank_ids_query: String,
    records_query: String,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    #[allow(dead_code)]
    name: String,
    columns: Vec<String>,
    values: Vec<Vec<serde_json::Value>>,
}

impl InfluxRepository {
    pub fn new(settings: InfluxSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: settings.host.trim_end_matches('/').to_string(),
            token: settings.token,
            database: settings.database,
            retention_policy: settings.retention_policy,
            tank_ids_query: settings.tank_ids_query,
            records_query: settings.records_query,
        }
    }

    fn build_query_url(&self, query: &str) -> String {
        let encoded_query = urlencoding::encode(query);
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host, self.database, self.retention_policy, encoded_query
        )
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse> {
        let url = self.build_query_url(query);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse InfluxDB response")?;

        if let Some(error) = data.results.first().and_then(|r| r.error.as_ref()) {
            anyhow::bail!("InfluxDB query error: {}", error);
        }

        Ok(data)
    }

    /// Escape a value for use inside a single-quoted InfluxQL string
    fn quote_literal(value: &str) -> String {
        value.replace('\\', "\\\\").replace('\'', "\\'")
    }

    fn records_query_for(&self, tank_id: &str, days: u32) -> String {
        let mut vars = HashMap::new();
        vars.insert("tank".to_string(), Self::quote_literal(tank_id));
        vars.insert("days".to_string(), days.to_string());
        prepare_query(&self.records_query, &vars)
    }

    fn series(response: &InfluxQLResponse) -> impl Iterator<Item = &InfluxQLSeries> {
        response
            .results
            .first()
            .and_then(|r| r.series.as_ref())
            .into_iter()
            .flatten()
    }

    /// Tag values come back as `[key, value]` rows
    fn tank_ids_from(response: &InfluxQLResponse) -> Vec<String> {
        Self::series(response)
            .flat_map(|s| s.values.iter())
            .filter_map(|row| row.get(1).and_then(|v| v.as_str()).map(str::to_string))
            .collect()
    }

    fn records_from(response: &InfluxQLResponse) -> Vec<TelemetryRecord> {
        let mut records = Vec::new();

        for s in Self::series(response) {
            let time_idx = s.columns.iter().position(|c| c == "time").unwrap_or(0);
            let value_idx = s.columns.iter().position(|c| c != "time").unwrap_or(1);

            for row in &s.values {
                let time = row
                    .get(time_idx)
                    .and_then(|v| v.as_str())
                    .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok());
                let value = row.get(value_idx).and_then(|v| v.as_f64());

                match (time, value) {
                    (Some(time), Some(value)) => {
                        records.push(TelemetryRecord::reading(time.with_timezone(&chrono::Utc), value));
                    }
                    _ => tracing::debug!("Skipping incomplete InfluxDB row: {:?}", row),
                }
            }
        }

        records
    }
}

#[async_trait]
impl TelemetryRepository for InfluxRepository {
    async fn list_tank_ids(&self) -> Result<Vec<String>> {
        let response = self.execute_query(&self.tank_ids_query).await?;
        Ok(Self::tank_ids_from(&response))
    }

    async fn fetch_records(&self, tank_id: &str, days: u32) -> Result<Vec<TelemetryRecord>> {
        let query = self.records_query_for(tank_id, days);

        tracing::debug!("Executing records query: {}", query);
        let response = self
            .execute_query(&query)
            .await
            .with_context(|| format!("Failed to fetch records for tank {}", tank_id))?;

        let records = Self::records_from(&response);
        tracing::debug!("Found {} records for tank {}", records.len(), tank_id);
        Ok(records)
    }
}
