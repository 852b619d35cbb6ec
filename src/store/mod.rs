//! The installment store: single in-memory source of truth for the current
//! working set, mediating every status-affecting mutation against the
//! external persistence collaborator.

pub mod clock;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Months, NaiveDate};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::{classify, Installment, LifecycleStatus, Project, Supplier};
use crate::errors::{BackendError, StoreError, StoreResult};
use crate::filter::InstallmentFilter;
use crate::grouping::{group_by_invoice, BoletoSummary};
use crate::storage::{
    status_to_literal, InstallmentPatch, InstallmentRow, PersistenceBackend,
};
use crate::summary::{SummaryService, SupplierRanking, Totals};

pub use clock::{Clock, FixedClock, SystemClock};

/// Cadence of the background status refresh when none is given.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(60);

/// Loading/error pair mirroring the active fetch, for UI collaborators.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    pub loading: bool,
    pub error: Option<String>,
}

/// Input for registering one invoice ("boleto") split into a monthly series
/// of equal installments.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub supplier_id: Uuid,
    pub project_id: Option<Uuid>,
    pub installment_amount: f64,
    pub first_due_date: NaiveDate,
    pub installments: u32,
    pub notes: Option<String>,
}

#[derive(Default)]
struct WorkingSet {
    installments: Vec<Installment>,
    suppliers: Vec<Supplier>,
    projects: Vec<Project>,
    fetch: FetchState,
}

/// Owns the working set of installments. Every mutation persists first, then
/// performs a full reload, so a caller awaiting a mutation observes the store
/// already consistent with its effect. Subscribers watch a monotonically
/// increasing revision that bumps whenever the set changes.
pub struct InstallmentStore {
    backend: Arc<dyn PersistenceBackend>,
    clock: Arc<dyn Clock>,
    state: RwLock<WorkingSet>,
    revision: watch::Sender<u64>,
    refresh: Mutex<Option<JoinHandle<()>>>,
}

impl InstallmentStore {
    pub fn new(backend: Arc<dyn PersistenceBackend>, clock: Arc<dyn Clock>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            backend,
            clock,
            state: RwLock::new(WorkingSet::default()),
            revision,
            refresh: Mutex::new(None),
        }
    }

    /// Fetches all three record kinds, joins supplier/project context, runs
    /// the classifier on each row, and replaces the working set. On failure
    /// the set becomes empty rather than stale.
    pub async fn load(&self) -> StoreResult<()> {
        {
            let mut state = self.state.write().await;
            state.fetch.loading = true;
            state.fetch.error = None;
        }
        let fetched = self.fetch_snapshot().await;
        let mut state = self.state.write().await;
        state.fetch.loading = false;
        match fetched {
            Ok((installments, suppliers, projects)) => {
                tracing::debug!(count = installments.len(), "working set reloaded");
                state.installments = installments;
                state.suppliers = suppliers;
                state.projects = projects;
                drop(state);
                self.bump();
                Ok(())
            }
            Err(err) => {
                state.installments.clear();
                state.fetch.error = Some(err.to_string());
                drop(state);
                self.bump();
                tracing::warn!(error = %err, "load failed, working set cleared");
                Err(StoreError::load(err))
            }
        }
    }

    async fn fetch_snapshot(
        &self,
    ) -> Result<(Vec<Installment>, Vec<Supplier>, Vec<Project>), BackendError> {
        let rows = self.backend.fetch_installments().await?;
        let suppliers = self.backend.fetch_suppliers().await?;
        let projects = self.backend.fetch_projects().await?;
        let today = self.clock.today();
        let by_id: HashMap<Uuid, &Project> =
            projects.iter().map(|project| (project.id, project)).collect();
        let installments = rows
            .into_iter()
            .map(|row| hydrate(row, &by_id, today))
            .collect();
        Ok((installments, suppliers, projects))
    }

    /// Records a payment date. The late/on-time determination happens here,
    /// exactly once, against the currently stored due date; later
    /// reclassifications preserve it.
    pub async fn set_payment_date(&self, id: Uuid, date: NaiveDate) -> StoreResult<()> {
        let installment = self.require(id).await?;
        let status = if date > installment.due_date {
            LifecycleStatus::PaidLate
        } else {
            LifecycleStatus::Paid
        };
        let patch = InstallmentPatch {
            paid_date: Some(Some(date)),
            status: Some(status_to_literal(status).into()),
            ..Default::default()
        };
        self.persist_and_reload(id, patch).await
    }

    /// Un-marks a payment; the installment returns to the unpaid branch of
    /// the classifier on reload and the late hint is reset.
    pub async fn clear_payment_date(&self, id: Uuid) -> StoreResult<()> {
        self.require(id).await?;
        let patch = InstallmentPatch {
            paid_date: Some(None),
            status: Some(status_to_literal(LifecycleStatus::Awaiting).into()),
            ..Default::default()
        };
        self.persist_and_reload(id, patch).await
    }

    pub async fn set_due_date(&self, id: Uuid, date: NaiveDate) -> StoreResult<()> {
        self.require(id).await?;
        let patch = InstallmentPatch {
            due_date: Some(date),
            ..Default::default()
        };
        self.persist_and_reload(id, patch).await
    }

    pub async fn set_amount(&self, id: Uuid, amount: f64) -> StoreResult<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(StoreError::Validation(
                "amount must be a non-negative finite number".into(),
            ));
        }
        self.require(id).await?;
        let patch = InstallmentPatch {
            amount: Some(amount),
            ..Default::default()
        };
        self.persist_and_reload(id, patch).await
    }

    pub async fn set_notes(&self, id: Uuid, notes: Option<String>) -> StoreResult<()> {
        self.require(id).await?;
        let patch = InstallmentPatch {
            notes: Some(notes),
            ..Default::default()
        };
        self.persist_and_reload(id, patch).await
    }

    /// Manual status override, restricted to pre-payment states. Paid states
    /// are derived exclusively from the payment date and cannot be set here.
    /// The override is persisted and applied in place; it lasts until the
    /// next classification pass, which recomputes from the dates.
    pub async fn set_manual_status(&self, id: Uuid, status: LifecycleStatus) -> StoreResult<()> {
        if status.is_paid() {
            return Err(StoreError::Validation(
                "paid statuses are derived from the payment date".into(),
            ));
        }
        let installment = self.require(id).await?;
        if installment.paid_date.is_some() {
            return Err(StoreError::Validation(
                "installment already has a payment date".into(),
            ));
        }
        let patch = InstallmentPatch {
            status: Some(status_to_literal(status).into()),
            ..Default::default()
        };
        self.backend
            .update_installment(id, patch)
            .await
            .map_err(StoreError::mutation)?;
        let mut state = self.state.write().await;
        if let Some(entry) = state.installments.iter_mut().find(|i| i.id == id) {
            entry.status = status;
        }
        drop(state);
        self.bump();
        tracing::debug!(%id, ?status, "manual status applied");
        Ok(())
    }

    /// Registers an invoice as a monthly series of equal installments and
    /// reloads. Returns the generated invoice id.
    pub async fn register_invoice(&self, draft: NewInvoice) -> StoreResult<Uuid> {
        if draft.installments == 0 {
            return Err(StoreError::Validation(
                "an invoice needs at least one installment".into(),
            ));
        }
        if !draft.installment_amount.is_finite() || draft.installment_amount <= 0.0 {
            return Err(StoreError::Validation(
                "installment amount must be a positive finite number".into(),
            ));
        }
        let invoice_id = Uuid::new_v4();
        let today = self.clock.today();
        let mut rows = Vec::with_capacity(draft.installments as usize);
        for seq in 0..draft.installments {
            let due_date = draft
                .first_due_date
                .checked_add_months(Months::new(seq))
                .ok_or_else(|| StoreError::Validation("due date out of range".into()))?;
            let status = classify(due_date, None, false, today);
            rows.push(InstallmentRow {
                id: Uuid::new_v4(),
                invoice_id,
                supplier_id: draft.supplier_id,
                project_id: draft.project_id,
                sequence_number: seq + 1,
                total_in_series: draft.installments,
                amount: draft.installment_amount,
                due_date,
                paid_date: None,
                status: Some(status_to_literal(status).into()),
                notes: None,
                invoice_notes: draft.notes.clone(),
                created_at: self.clock.now(),
            });
        }
        self.backend
            .insert_installments(&rows)
            .await
            .map_err(StoreError::mutation)?;
        tracing::info!(%invoice_id, installments = rows.len(), "invoice registered");
        self.load().await?;
        Ok(invoice_id)
    }

    /// Deletes one installment; siblings of the same invoice are untouched.
    pub async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.backend
            .delete_installment(id)
            .await
            .map_err(StoreError::mutation)?;
        tracing::debug!(%id, "installment deleted");
        self.load().await
    }

    /// Re-runs the classifier over the in-memory set with the current clock
    /// time, without a full reload. Returns how many statuses changed.
    pub async fn refresh_statuses(&self) -> usize {
        let today = self.clock.today();
        let mut state = self.state.write().await;
        let changed = state
            .installments
            .iter_mut()
            .map(|installment| installment.reclassify(today))
            .filter(|changed| *changed)
            .count();
        drop(state);
        if changed > 0 {
            self.bump();
            tracing::debug!(changed, "periodic refresh updated statuses");
        }
        changed
    }

    /// Spawns the recurring refresh task. The task holds only a weak
    /// reference, so it winds down on its own once the store is dropped;
    /// [`InstallmentStore::shutdown`] stops it eagerly.
    pub fn start_refresh(self: &Arc<Self>, period: Duration) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // An interval's first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else { break };
                store.refresh_statuses().await;
            }
        });
        let mut slot = self.refresh.lock().unwrap();
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Cancels the background refresh task, if one is running.
    pub fn shutdown(&self) {
        if let Some(handle) = self.refresh.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Watch a monotonically increasing revision; it bumps on every change
    /// to the working set.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub async fn installments(&self) -> Vec<Installment> {
        self.state.read().await.installments.clone()
    }

    /// Current installment list narrowed by the given criteria.
    pub async fn filtered(&self, filter: &InstallmentFilter) -> Vec<Installment> {
        filter.apply(&self.state.read().await.installments)
    }

    pub async fn suppliers(&self) -> Vec<Supplier> {
        self.state.read().await.suppliers.clone()
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.state.read().await.projects.clone()
    }

    pub async fn fetch_state(&self) -> FetchState {
        self.state.read().await.fetch.clone()
    }

    pub async fn find(&self, id: Uuid) -> Option<Installment> {
        self.state
            .read()
            .await
            .installments
            .iter()
            .find(|installment| installment.id == id)
            .cloned()
    }

    /// Summary totals over the current working set.
    pub async fn totals(&self) -> Totals {
        SummaryService::totals(&self.state.read().await.installments)
    }

    /// Top-N supplier ranking over the current working set.
    pub async fn top_suppliers(&self, n: usize) -> Vec<SupplierRanking> {
        let state = self.state.read().await;
        SummaryService::top_suppliers(&state.installments, &state.suppliers, n)
    }

    /// Invoice-grouped view of the current working set.
    pub async fn boletos(&self) -> Vec<BoletoSummary> {
        group_by_invoice(&self.state.read().await.installments)
    }

    async fn require(&self, id: Uuid) -> StoreResult<Installment> {
        self.find(id)
            .await
            .ok_or_else(|| StoreError::Validation(format!("unknown installment {id}")))
    }

    async fn persist_and_reload(&self, id: Uuid, patch: InstallmentPatch) -> StoreResult<()> {
        self.backend
            .update_installment(id, patch)
            .await
            .map_err(StoreError::mutation)?;
        tracing::debug!(%id, "installment updated");
        self.load().await
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl Drop for InstallmentStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn hydrate(
    row: InstallmentRow,
    projects: &HashMap<Uuid, &Project>,
    today: NaiveDate,
) -> Installment {
    let paid_late = row.paid_late_hint();
    let status = classify(row.due_date, row.paid_date, paid_late, today);
    let project = row
        .project_id
        .and_then(|id| projects.get(&id))
        .map(|project| project.snapshot());
    Installment {
        id: row.id,
        invoice_id: row.invoice_id,
        supplier_id: row.supplier_id,
        project_id: row.project_id,
        sequence_number: row.sequence_number,
        total_in_series: row.total_in_series,
        amount: row.amount,
        due_date: row.due_date,
        paid_date: row.paid_date,
        paid_late,
        status,
        notes: row.notes,
        project,
        invoice_notes: row.invoice_notes,
        created_at: row.created_at,
    }
}
