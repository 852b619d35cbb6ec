//! Persistence boundary: the async row-oriented CRUD contract this core
//! consumes, plus the adapter that keeps the external store's loose status
//! literals out of internal logic.

pub mod json_backend;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{LifecycleStatus, Project, Supplier};
use crate::errors::BackendError;

pub use json_backend::JsonBackend;
pub use memory::MemoryBackend;

pub type Result<T> = std::result::Result<T, BackendError>;

/// Installment row exactly as the external store keeps it. The `status`
/// column is a free string there; [`status_from_literal`] maps it into the
/// typed enum at this boundary and nowhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub supplier_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    pub sequence_number: u32,
    pub total_in_series: u32,
    pub amount: f64,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InstallmentRow {
    /// The stored hint the classifier's paid branch consumes.
    pub fn paid_late_hint(&self) -> bool {
        self.status
            .as_deref()
            .and_then(status_from_literal)
            .map(|status| status == LifecycleStatus::PaidLate)
            .unwrap_or(false)
    }
}

/// Partial update applied by `update-by-id`. Absent fields are left
/// untouched; the double `Option` on nullable columns distinguishes
/// "leave as is" from "set to null".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl InstallmentPatch {
    pub fn apply_to(&self, row: &mut InstallmentRow) {
        if let Some(due_date) = self.due_date {
            row.due_date = due_date;
        }
        if let Some(paid_date) = self.paid_date {
            row.paid_date = paid_date;
        }
        if let Some(amount) = self.amount {
            row.amount = amount;
        }
        if let Some(status) = &self.status {
            row.status = Some(status.clone());
        }
        if let Some(notes) = &self.notes {
            row.notes = notes.clone();
        }
    }
}

/// Row-oriented CRUD contract over the three record kinds this core reads.
/// Implementations must return installments ordered by due date.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn fetch_installments(&self) -> Result<Vec<InstallmentRow>>;
    async fn fetch_suppliers(&self) -> Result<Vec<Supplier>>;
    async fn fetch_projects(&self) -> Result<Vec<Project>>;
    async fn insert_installments(&self, rows: &[InstallmentRow]) -> Result<()>;
    async fn update_installment(&self, id: Uuid, patch: InstallmentPatch) -> Result<()>;
    async fn delete_installment(&self, id: Uuid) -> Result<()>;
}

/// Canonical literal for each status, as written back to the external store.
pub fn status_to_literal(status: LifecycleStatus) -> &'static str {
    match status {
        LifecycleStatus::Awaiting => "a_vencer",
        LifecycleStatus::DueToday => "vence_hoje",
        LifecycleStatus::Overdue => "vencida",
        LifecycleStatus::Paid => "paga",
        LifecycleStatus::PaidLate => "paga_atrasada",
    }
}

/// Maps an external status literal into the typed enum. Unknown literals map
/// to `None`; callers treat that as "no stored hint" rather than an error.
pub fn status_from_literal(raw: &str) -> Option<LifecycleStatus> {
    match raw {
        "a_vencer" => Some(LifecycleStatus::Awaiting),
        "vence_hoje" => Some(LifecycleStatus::DueToday),
        "vencida" => Some(LifecycleStatus::Overdue),
        "paga" => Some(LifecycleStatus::Paid),
        "paga_atrasada" => Some(LifecycleStatus::PaidLate),
        _ => None,
    }
}
