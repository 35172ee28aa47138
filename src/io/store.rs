// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Filesystem-backed patient catalog.
//!
//! Every patient is a directory below the store root and every document is
//! a regular file inside it. There is no other persistent state.

use crate::models::patient::{Document, PatientId};
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the patient store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid name '{0}'")]
    InvalidName(String),

    #[error("'{0}' already exists")]
    AlreadyExists(String),

    #[error("'{0}' not found")]
    NotFound(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome of a multi-file copy. Individual failures do not stop the copy
/// and nothing is rolled back.
#[derive(Debug, Default)]
pub struct TransferReport {
    pub copied: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl TransferReport {
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty() && self.failed.is_empty()
    }
}

/// Patient folders below a root directory.
#[derive(Debug, Clone)]
pub struct PatientStore {
    root: PathBuf,
}

impl PatientStore {
    /// Open the store, creating the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| StoreError::io(format!("creating {}", root.display()), e))?;
        log::info!("Patient store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patient_path(&self, id: &PatientId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn document_path(&self, id: &PatientId, name: &str) -> PathBuf {
        self.patient_path(id).join(name)
    }

    /// All patient folders, sorted by name in descending order.
    pub fn list_patients(&self) -> Result<Vec<PatientId>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| StoreError::io(format!("listing {}", self.root.display()), e))?;

        let mut patients: Vec<PatientId> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(PatientId::new))
            .collect();
        patients.sort_by(|a, b| b.cmp(a));
        Ok(patients)
    }

    /// Create `<name>_<YYYYmmdd_HHMMSS>`. Fails if the folder already exists.
    pub fn create_patient(&self, name: &str) -> Result<PatientId> {
        let name = validate_name(name)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let id = PatientId::new(format!("{name}_{timestamp}"));
        let path = self.patient_path(&id);

        fs::create_dir(&path).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => StoreError::AlreadyExists(id.to_string()),
            _ => StoreError::io(format!("creating {}", path.display()), e),
        })?;

        log::info!("Created patient {}", id);
        Ok(id)
    }

    /// Remove a patient folder and everything in it.
    pub fn delete_patient(&self, id: &PatientId) -> Result<()> {
        let path = self.existing_patient(id)?;
        fs::remove_dir_all(&path)
            .map_err(|e| StoreError::io(format!("deleting {}", path.display()), e))?;
        log::info!("Deleted patient {}", id);
        Ok(())
    }

    /// Files in a patient folder, sorted by name in descending order.
    pub fn list_documents(&self, id: &PatientId) -> Result<Vec<Document>> {
        let path = self.existing_patient(id)?;
        let entries = fs::read_dir(&path)
            .map_err(|e| StoreError::io(format!("listing {}", path.display()), e))?;

        let mut documents = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            documents.push(Document {
                name,
                path: entry.path(),
                modified: metadata.modified().unwrap_or(std::time::UNIX_EPOCH),
            });
        }
        documents.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(documents)
    }

    /// Copy files into a patient folder, continuing past failures.
    pub fn import_files(&self, id: &PatientId, sources: &[PathBuf]) -> Result<TransferReport> {
        let dest_dir = self.existing_patient(id)?;
        let mut report = TransferReport::default();

        for source in sources {
            let Some(file_name) = source.file_name() else {
                report.failed.push((source.clone(), "not a file".to_string()));
                continue;
            };
            let dest = dest_dir.join(file_name);
            match fs::copy(source, &dest) {
                Ok(_) => report.copied.push(dest),
                Err(e) => {
                    log::warn!("Failed to copy {}: {}", source.display(), e);
                    report.failed.push((source.clone(), e.to_string()));
                }
            }
        }

        log::info!(
            "Imported {} file(s) into {} ({} failed)",
            report.copied.len(),
            id,
            report.failed.len()
        );
        Ok(report)
    }

    /// Copy every document of a patient into `dest_dir`, continuing past
    /// failures. An empty report means there was nothing to export.
    pub fn export_files(&self, id: &PatientId, dest_dir: &Path) -> Result<TransferReport> {
        let documents = self.list_documents(id)?;
        let mut report = TransferReport::default();

        for document in documents {
            let dest = dest_dir.join(&document.name);
            match fs::copy(&document.path, &dest) {
                Ok(_) => report.copied.push(dest),
                Err(e) => {
                    log::warn!("Could not export {}: {}", document.name, e);
                    report.failed.push((document.path, e.to_string()));
                }
            }
        }

        log::info!(
            "Exported {} file(s) of {} to {}",
            report.copied.len(),
            id,
            dest_dir.display()
        );
        Ok(report)
    }

    /// Rename a document. Refuses to overwrite an existing file.
    pub fn rename_document(&self, id: &PatientId, old_name: &str, new_name: &str) -> Result<()> {
        let new_name = validate_name(new_name)?;
        let from = self.existing_document(id, old_name)?;
        let to = self.document_path(id, new_name);
        if to.exists() {
            return Err(StoreError::AlreadyExists(new_name.to_string()));
        }

        fs::rename(&from, &to)
            .map_err(|e| StoreError::io(format!("renaming {old_name}"), e))?;
        log::info!("Renamed {} -> {} in {}", old_name, new_name, id);
        Ok(())
    }

    pub fn delete_document(&self, id: &PatientId, name: &str) -> Result<()> {
        let path = self.existing_document(id, name)?;
        fs::remove_file(&path)
            .map_err(|e| StoreError::io(format!("deleting {name}"), e))?;
        log::info!("Deleted {} from {}", name, id);
        Ok(())
    }

    fn existing_patient(&self, id: &PatientId) -> Result<PathBuf> {
        check_component(id.as_str())?;
        let path = self.patient_path(id);
        if path.is_dir() {
            Ok(path)
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    fn existing_document(&self, id: &PatientId, name: &str) -> Result<PathBuf> {
        check_component(name)?;
        let path = self.existing_patient(id)?.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(StoreError::NotFound(name.to_string()))
        }
    }
}

/// Trimmed new name that stays a single path component.
fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    check_component(trimmed).map_err(|_| StoreError::InvalidName(name.to_string()))?;
    Ok(trimmed)
}

/// Existing names are looked up exactly as given, whitespace included.
fn check_component(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty() || name == "." || name == ".." || name.contains(['/', '\\']);
    if invalid {
        Err(StoreError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, PatientStore) {
        let dir = TempDir::new().unwrap();
        let store = PatientStore::open(dir.path().join("data").join("patients")).unwrap();
        (dir, store)
    }

    fn names(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_open_creates_root() {
        let (_dir, store) = store();
        assert!(store.root().is_dir());
        assert!(store.list_patients().unwrap().is_empty());
    }

    #[test]
    fn test_create_patient_uses_timestamped_folder() {
        let (_dir, store) = store();
        let id = store.create_patient("  Jane Doe ").unwrap();
        assert!(id.as_str().starts_with("Jane Doe_"));
        // name + '_' + YYYYmmdd_HHMMSS
        assert_eq!(id.as_str().len(), "Jane Doe_".len() + 15);
        assert!(store.patient_path(&id).is_dir());
    }

    #[test]
    fn test_create_patient_rejects_bad_names() {
        let (_dir, store) = store();
        assert!(matches!(store.create_patient("   "), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.create_patient("../x"), Err(StoreError::InvalidName(_))));
        assert!(matches!(store.create_patient("a\\b"), Err(StoreError::InvalidName(_))));
    }

    #[test]
    fn test_list_patients_skips_files_and_sorts_descending() {
        let (_dir, store) = store();
        fs::create_dir(store.root().join("alice_1")).unwrap();
        fs::create_dir(store.root().join("bob_1")).unwrap();
        fs::write(store.root().join("stray.txt"), b"x").unwrap();

        let patients = store.list_patients().unwrap();
        assert_eq!(patients, vec![PatientId::new("bob_1"), PatientId::new("alice_1")]);
    }

    #[test]
    fn test_delete_one_of_two_patients() {
        let (_dir, store) = store();
        let alice = PatientId::new("alice_20250101_100000");
        let bob = PatientId::new("bob_20250101_100000");
        fs::create_dir(store.patient_path(&alice)).unwrap();
        fs::create_dir(store.patient_path(&bob)).unwrap();
        fs::write(store.document_path(&bob, "scan.png"), b"png").unwrap();
        fs::write(store.document_path(&alice, "notes.txt"), b"txt").unwrap();

        store.delete_patient(&alice).unwrap();

        assert_eq!(store.list_patients().unwrap(), vec![bob.clone()]);
        assert_eq!(names(&store.list_documents(&bob).unwrap()), ["scan.png"]);
        assert!(matches!(store.delete_patient(&alice), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_import_continues_past_failures() {
        let (dir, store) = store();
        let id = store.create_patient("Ann").unwrap();

        let good = dir.path().join("fundus.png");
        fs::write(&good, b"image").unwrap();
        let missing = dir.path().join("missing.png");

        let report = store.import_files(&id, &[missing.clone(), good]).unwrap();
        assert_eq!(report.copied.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, missing);
        assert_eq!(names(&store.list_documents(&id).unwrap()), ["fundus.png"]);
    }

    #[test]
    fn test_export_copies_all_documents() {
        let (dir, store) = store();
        let id = store.create_patient("Ann").unwrap();
        fs::write(store.document_path(&id, "a.txt"), b"a").unwrap();
        fs::write(store.document_path(&id, "b.pdf"), b"b").unwrap();

        let dest = dir.path().join("out");
        fs::create_dir(&dest).unwrap();
        let report = store.export_files(&id, &dest).unwrap();

        assert_eq!(report.copied.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(fs::read(dest.join("b.pdf")).unwrap(), b"b");
    }

    #[test]
    fn test_export_of_empty_patient_is_empty_report() {
        let (dir, store) = store();
        let id = store.create_patient("Ann").unwrap();
        let report = store.export_files(&id, dir.path()).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_documents_sorted_descending_and_dirs_skipped() {
        let (_dir, store) = store();
        let id = store.create_patient("Ann").unwrap();
        for name in ["b.png", "c.pdf", "a.txt"] {
            fs::write(store.document_path(&id, name), b"x").unwrap();
        }
        fs::create_dir(store.document_path(&id, "nested")).unwrap();

        assert_eq!(names(&store.list_documents(&id).unwrap()), ["c.pdf", "b.png", "a.txt"]);
    }

    #[test]
    fn test_rename_document() {
        let (_dir, store) = store();
        let id = store.create_patient("Ann").unwrap();
        fs::write(store.document_path(&id, "old.png"), b"x").unwrap();
        fs::write(store.document_path(&id, "taken.png"), b"y").unwrap();

        store.rename_document(&id, "old.png", " new.png ").unwrap();
        assert!(store.document_path(&id, "new.png").is_file());
        assert!(!store.document_path(&id, "old.png").exists());

        assert!(matches!(
            store.rename_document(&id, "new.png", "taken.png"),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.rename_document(&id, "new.png", ""),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.rename_document(&id, "ghost.png", "x.png"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_document() {
        let (_dir, store) = store();
        let id = store.create_patient("Ann").unwrap();
        fs::write(store.document_path(&id, "a.txt"), b"a").unwrap();
        fs::write(store.document_path(&id, "b.txt"), b"b").unwrap();

        store.delete_document(&id, "a.txt").unwrap();
        assert_eq!(names(&store.list_documents(&id).unwrap()), ["b.txt"]);
    }

    #[test]
    fn test_listed_names_with_outer_spaces_stay_reachable() {
        let (dir, store) = store();
        let id = store.create_patient("Ann").unwrap();
        let source = dir.path().join(" scan.png");
        fs::write(&source, b"x").unwrap();
        fs::write(dir.path().join("notes.txt "), b"y").unwrap();
        store
            .import_files(&id, &[source, dir.path().join("notes.txt ")])
            .unwrap();

        let listed = store.list_documents(&id).unwrap();
        assert_eq!(names(&listed), ["notes.txt ", " scan.png"]);

        store.rename_document(&id, " scan.png", "scan.png").unwrap();
        assert!(store.document_path(&id, "scan.png").is_file());
        store.delete_document(&id, "notes.txt ").unwrap();
        assert_eq!(names(&store.list_documents(&id).unwrap()), ["scan.png"]);

        assert!(matches!(
            store.delete_document(&id, "scan.png "),
            Err(StoreError::NotFound(_))
        ));
    }
}
