use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes suppliers from clients in the shared contacts table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PartyKind {
    #[default]
    Supplier,
    Client,
}

/// Read-only counterpart context; lifecycle owned by the external store.
/// This core only uses it for name lookup and grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    /// Tax id (CNPJ/CPF).
    pub document: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub kind: PartyKind,
}

impl Supplier {
    pub fn new(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            document: document.into(),
            email: None,
            phone: None,
            kind: PartyKind::Supplier,
        }
    }
}
