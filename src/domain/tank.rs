// Tank domain model
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tank {
    pub id: String,
    pub name: String,
    /// Volume units; `None` when the tank is not in the catalog
    pub capacity: Option<f64>,
}

impl Tank {
    pub fn new(id: String, capacity: Option<f64>) -> Self {
        let name = Self::format_name(&id);
        Self { id, name, capacity }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        if let Some(name) = name {
            self.name = name;
        }
        self
    }

    fn format_name(id: &str) -> String {
        // Convert "North_Roof_" to "North Roof"
        id.trim_end_matches('_').replace('_', " ")
    }
}
