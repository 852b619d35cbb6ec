use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::domain::{Project, Supplier};
use crate::errors::BackendError;

use super::{InstallmentPatch, InstallmentRow, PersistenceBackend, Result};

const TMP_SUFFIX: &str = "tmp";
const CURRENT_SCHEMA_VERSION: u32 = 1;

/// File-backed reference collaborator: all three record kinds in one JSON
/// document, rewritten atomically (tmp file + rename) on every write.
pub struct JsonBackend {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default = "StoreFile::schema_version_default")]
    schema_version: u32,
    #[serde(default)]
    installments: Vec<InstallmentRow>,
    #[serde(default)]
    suppliers: Vec<Supplier>,
    #[serde(default)]
    projects: Vec<Project>,
}

impl StoreFile {
    fn schema_version_default() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

impl JsonBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StoreFile> {
        match fs::read_to_string(&self.path).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoreFile::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, file: &StoreFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(file)?;
        let tmp = tmp_path(&self.path);
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Replaces the supplier and project context wholesale; their lifecycle
    /// is owned outside this core.
    pub async fn replace_context(
        &self,
        suppliers: Vec<Supplier>,
        projects: Vec<Project>,
    ) -> Result<()> {
        let mut file = self.read().await?;
        file.suppliers = suppliers;
        file.projects = projects;
        self.write(&file).await
    }
}

#[async_trait]
impl PersistenceBackend for JsonBackend {
    async fn fetch_installments(&self) -> Result<Vec<InstallmentRow>> {
        let mut file = self.read().await?;
        file.installments
            .sort_by(|a, b| a.due_date.cmp(&b.due_date));
        Ok(file.installments)
    }

    async fn fetch_suppliers(&self) -> Result<Vec<Supplier>> {
        Ok(self.read().await?.suppliers)
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        Ok(self.read().await?.projects)
    }

    async fn insert_installments(&self, rows: &[InstallmentRow]) -> Result<()> {
        let mut file = self.read().await?;
        file.installments.extend_from_slice(rows);
        self.write(&file).await
    }

    async fn update_installment(&self, id: Uuid, patch: InstallmentPatch) -> Result<()> {
        let mut file = self.read().await?;
        let row = file
            .installments
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(BackendError::NotFound(id))?;
        patch.apply_to(row);
        self.write(&file).await
    }

    async fn delete_installment(&self, id: Uuid) -> Result<()> {
        let mut file = self.read().await?;
        let before = file.installments.len();
        file.installments.retain(|row| row.id != id);
        if file.installments.len() == before {
            return Err(BackendError::NotFound(id));
        }
        self.write(&file).await
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    use super::*;

    fn sample_row(due: NaiveDate) -> InstallmentRow {
        InstallmentRow {
            id: Uuid::new_v4(),
            invoice_id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            project_id: None,
            sequence_number: 1,
            total_in_series: 1,
            amount: 150.0,
            due_date: due,
            paid_date: None,
            status: None,
            notes: None,
            invoice_notes: None,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let temp = TempDir::new().expect("temp dir");
        let backend = JsonBackend::new(temp.path().join("payables.json"));
        let rows = backend.fetch_installments().await.expect("fetch");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn insert_and_fetch_orders_by_due_date() {
        let temp = TempDir::new().expect("temp dir");
        let backend = JsonBackend::new(temp.path().join("payables.json"));
        let late = sample_row(date(2025, 3, 1));
        let early = sample_row(date(2025, 1, 1));
        backend
            .insert_installments(&[late.clone(), early.clone()])
            .await
            .expect("insert");
        let rows = backend.fetch_installments().await.expect("fetch");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, early.id);
        assert_eq!(rows[1].id, late.id);
    }

    #[tokio::test]
    async fn update_patches_only_named_fields() {
        let temp = TempDir::new().expect("temp dir");
        let backend = JsonBackend::new(temp.path().join("payables.json"));
        let row = sample_row(date(2025, 2, 10));
        backend
            .insert_installments(std::slice::from_ref(&row))
            .await
            .expect("insert");
        backend
            .update_installment(
                row.id,
                InstallmentPatch {
                    paid_date: Some(Some(date(2025, 2, 12))),
                    status: Some("paga_atrasada".into()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        let rows = backend.fetch_installments().await.expect("fetch");
        assert_eq!(rows[0].paid_date, Some(date(2025, 2, 12)));
        assert_eq!(rows[0].amount, 150.0);
        assert!(rows[0].paid_late_hint());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let temp = TempDir::new().expect("temp dir");
        let backend = JsonBackend::new(temp.path().join("payables.json"));
        let err = backend
            .delete_installment(Uuid::new_v4())
            .await
            .expect_err("delete should fail");
        assert!(matches!(err, BackendError::NotFound(_)));
    }
}
