use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Project, Supplier};
use crate::errors::BackendError;

use super::{InstallmentPatch, InstallmentRow, PersistenceBackend, Result};

/// In-memory backend used by the test suites and by callers that want the
/// store without a durable collaborator behind it.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    installments: Vec<InstallmentRow>,
    suppliers: Vec<Supplier>,
    projects: Vec<Project>,
    unavailable: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_installments(&self, rows: Vec<InstallmentRow>) {
        self.state.lock().unwrap().installments = rows;
    }

    pub fn seed_suppliers(&self, suppliers: Vec<Supplier>) {
        self.state.lock().unwrap().suppliers = suppliers;
    }

    pub fn seed_projects(&self, projects: Vec<Project>) {
        self.state.lock().unwrap().projects = projects;
    }

    /// Makes every subsequent call fail with [`BackendError::Unavailable`]
    /// until flipped back. Lets tests exercise the store's failure semantics.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn row(&self, id: Uuid) -> Option<InstallmentRow> {
        self.state
            .lock()
            .unwrap()
            .installments
            .iter()
            .find(|row| row.id == id)
            .cloned()
    }

    fn guard(&self, state: &MemoryState) -> Result<()> {
        if state.unavailable {
            Err(BackendError::Unavailable("memory backend offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    async fn fetch_installments(&self) -> Result<Vec<InstallmentRow>> {
        let state = self.state.lock().unwrap();
        self.guard(&state)?;
        let mut rows = state.installments.clone();
        rows.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        Ok(rows)
    }

    async fn fetch_suppliers(&self) -> Result<Vec<Supplier>> {
        let state = self.state.lock().unwrap();
        self.guard(&state)?;
        Ok(state.suppliers.clone())
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        let state = self.state.lock().unwrap();
        self.guard(&state)?;
        Ok(state.projects.clone())
    }

    async fn insert_installments(&self, rows: &[InstallmentRow]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.guard(&state)?;
        state.installments.extend_from_slice(rows);
        Ok(())
    }

    async fn update_installment(&self, id: Uuid, patch: InstallmentPatch) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.guard(&state)?;
        let row = state
            .installments
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(BackendError::NotFound(id))?;
        patch.apply_to(row);
        Ok(())
    }

    async fn delete_installment(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.guard(&state)?;
        let before = state.installments.len();
        state.installments.retain(|row| row.id != id);
        if state.installments.len() == before {
            return Err(BackendError::NotFound(id));
        }
        Ok(())
    }
}
