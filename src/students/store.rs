//! Student record store with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <base>/students/
//! ├── .sequence      (next id to assign)
//! ├── <id>.json
//! └── ...
//! ```
//!
//! Every lookup is scoped by owner: a record owned by someone else is
//! indistinguishable from a missing one.

use crate::error::{Error, Result};
use crate::storage;
use crate::students::types::*;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

const SEQUENCE_FILE: &str = ".sequence";

struct Inner {
    students: Vec<Student>,
    next_id: u64,
}

/// Student records, cached in memory and written through to disk
pub struct StudentStore {
    dir: PathBuf,
    inner: Arc<RwLock<Inner>>,
}

impl StudentStore {
    /// Open (or create) the store at `dir`
    pub async fn new(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;

        let students: Vec<Student> = storage::load_json_files(&dir);
        let saved = tokio::fs::read_to_string(dir.join(SEQUENCE_FILE))
            .await
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(1);
        let next_id = students
            .iter()
            .map(|s| s.id + 1)
            .max()
            .unwrap_or(1)
            .max(saved);
        tracing::debug!(count = students.len(), next_id, "Loaded student records");

        Ok(Self {
            dir,
            inner: Arc::new(RwLock::new(Inner { students, next_id })),
        })
    }

    /// Owner's records, newest first
    pub async fn list(&self, owner: &str) -> Vec<Student> {
        let inner = self.inner.read().await;
        let mut students: Vec<Student> = inner
            .students
            .iter()
            .filter(|s| s.owner == owner)
            .cloned()
            .collect();
        students.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        students
    }

    /// A single record, only if `owner` owns it
    pub async fn get(&self, owner: &str, id: u64) -> Option<Student> {
        self.inner
            .read()
            .await
            .students
            .iter()
            .find(|s| s.id == id && s.owner == owner)
            .cloned()
    }

    /// Persist a new record; id and creation time are assigned here
    pub async fn insert(&self, owner: &str, fields: StudentFields) -> Result<Student> {
        let mut inner = self.inner.write().await;
        self.save_sequence(inner.next_id + 1).await?;

        let student = Student {
            id: inner.next_id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            birth_date: fields.birth_date,
            phone: fields.phone,
            address: fields.address,
            created_at: Utc::now(),
            owner: owner.to_string(),
        };

        storage::write_json(&self.dir, &student.id.to_string(), &student).await?;
        inner.next_id += 1;
        inner.students.push(student.clone());

        Ok(student)
    }

    /// Overwrite the mutable fields of an owned record
    pub async fn update(&self, owner: &str, id: u64, fields: StudentFields) -> Result<Student> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .students
            .iter_mut()
            .find(|s| s.id == id && s.owner == owner)
            .ok_or(Error::NotFound)?;

        let mut updated = slot.clone();
        updated.apply(fields);
        storage::write_json(&self.dir, &updated.id.to_string(), &updated).await?;
        *slot = updated.clone();

        Ok(updated)
    }

    /// Remove an owned record permanently
    pub async fn delete(&self, owner: &str, id: u64) -> Result<Student> {
        let mut inner = self.inner.write().await;
        let index = inner
            .students
            .iter()
            .position(|s| s.id == id && s.owner == owner)
            .ok_or(Error::NotFound)?;

        storage::remove_json(&self.dir, &id.to_string()).await?;
        Ok(inner.students.remove(index))
    }

    async fn save_sequence(&self, next_id: u64) -> Result<()> {
        let path = self.dir.join(SEQUENCE_FILE);
        tokio::fs::write(&path, next_id.to_string())
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", path.display(), e)))
    }
}
