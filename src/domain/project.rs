use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Construction project ("obra"); read-only context for filtering and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
}

impl Project {
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            code: self.code.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
        }
    }
}

/// Denormalized display subset carried on each installment so lists render
/// without another lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub code: String,
    pub name: String,
    pub address: String,
}
