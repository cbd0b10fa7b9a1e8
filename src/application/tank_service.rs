// Tank service - Use case for listing tanks
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::tank::Tank;
use std::collections::HashSet;
use std::sync::Arc;

/// Tanks declared in configuration
#[derive(Debug, Clone, Default)]
pub struct TankCatalog {
    tanks: Vec<Tank>,
}

impl TankCatalog {
    pub fn new(tanks: Vec<Tank>) -> Self {
        Self { tanks }
    }

    /// Catalog entry for `id`, or an uncatalogued tank with no capacity
    pub fn resolve(&self, id: &str) -> Tank {
        self.tanks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .unwrap_or_else(|| Tank::new(id.to_string(), None))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tank> {
        self.tanks.iter()
    }
}

#[derive(Clone)]
pub struct TankService {
    repository: Arc<dyn TelemetryRepository>,
    catalog: TankCatalog,
}

impl TankService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, catalog: TankCatalog) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    /// Tanks reporting telemetry, followed by catalogued tanks that have not reported yet
    pub async fn list_tanks(&self) -> anyhow::Result<Vec<Tank>> {
        let ids = self.repository.list_tank_ids().await?;

        let mut seen = HashSet::new();
        let mut tanks: Vec<Tank> = ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .map(|id| self.catalog.resolve(&id))
            .collect();

        tanks.extend(self.catalog.iter().filter(|t| !seen.contains(&t.id)).cloned());

        Ok(tanks)
    }
}
