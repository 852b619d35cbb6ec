//! Invoice-level view over installments. An invoice ("boleto") is not a
//! stored entity in this core; it is derived by grouping installments that
//! share an invoice id.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Installment;

/// One logical invoice, derived from the installments sharing its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoletoSummary {
    pub invoice_id: Uuid,
    pub supplier_id: Uuid,
    pub project_id: Option<Uuid>,
    pub invoice_notes: Option<String>,
    /// Installments currently present in the working set for this invoice.
    pub installment_count: usize,
    pub paid_count: usize,
    pub total_in_series: u32,
    pub installment_amount: f64,
    /// Per-installment amount times the series length; one figure per
    /// invoice, not per installment.
    pub total_amount: f64,
    pub first_due_date: NaiveDate,
}

/// Groups installments into one summary per distinct invoice id. Shared
/// fields are taken first-seen-wins from the representative installment;
/// within one invoice all installments share the same per-installment amount
/// and series length, so the representative fully determines the totals.
pub fn group_by_invoice(installments: &[Installment]) -> Vec<BoletoSummary> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut summaries: Vec<BoletoSummary> = Vec::new();
    for installment in installments {
        match index.get(&installment.invoice_id) {
            Some(&slot) => {
                let summary = &mut summaries[slot];
                summary.installment_count += 1;
                if installment.is_paid() {
                    summary.paid_count += 1;
                }
            }
            None => {
                index.insert(installment.invoice_id, summaries.len());
                summaries.push(BoletoSummary {
                    invoice_id: installment.invoice_id,
                    supplier_id: installment.supplier_id,
                    project_id: installment.project_id,
                    invoice_notes: installment.invoice_notes.clone(),
                    installment_count: 1,
                    paid_count: usize::from(installment.is_paid()),
                    total_in_series: installment.total_in_series,
                    installment_amount: installment.amount,
                    total_amount: installment.amount * f64::from(installment.total_in_series),
                    first_due_date: installment.due_date,
                });
            }
        }
    }
    summaries
}
