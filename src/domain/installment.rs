use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::ProjectSnapshot;
use super::status::classify;

/// Payment-lifecycle state of a single installment, re-derived from its dates
/// on every load, mutation, and refresh tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LifecycleStatus {
    Awaiting,
    DueToday,
    Overdue,
    Paid,
    PaidLate,
}

impl LifecycleStatus {
    pub fn is_paid(self) -> bool {
        matches!(self, LifecycleStatus::Paid | LifecycleStatus::PaidLate)
    }

    pub fn is_open(self) -> bool {
        !self.is_paid()
    }
}

/// One payable unit ("parcela") of a multi-installment invoice ("boleto").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub supplier_id: Uuid,
    pub project_id: Option<Uuid>,
    /// 1-based position within the invoice's series.
    pub sequence_number: u32,
    pub total_in_series: u32,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    /// Stored hint consumed by the paid branch of the classifier. Determined
    /// once when the payment date is recorded, never re-derived at read time.
    #[serde(default)]
    pub paid_late: bool,
    pub status: LifecycleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Installment {
    pub fn new(
        invoice_id: Uuid,
        supplier_id: Uuid,
        sequence_number: u32,
        total_in_series: u32,
        amount: f64,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            invoice_id,
            supplier_id,
            project_id: None,
            sequence_number,
            total_in_series,
            amount,
            due_date,
            paid_date: None,
            paid_late: false,
            status: classify(due_date, None, false, today),
            notes: None,
            project: None,
            invoice_notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status.is_paid()
    }

    /// Re-derives `status` against the given calendar day. Returns `true`
    /// when the status actually changed.
    pub fn reclassify(&mut self, today: NaiveDate) -> bool {
        let next = classify(self.due_date, self.paid_date, self.paid_late, today);
        if next == self.status {
            false
        } else {
            self.status = next;
            true
        }
    }
}
