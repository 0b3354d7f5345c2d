use crate::calc::{self, ClassStatistics};
use crate::report::{self, ExportError, ExportPaths};
use crate::student::{Student, ValidationError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// File name of the persisted store inside a workspace directory.
pub const STORE_FILE_NAME: &str = "rollbook.json";

/// I/O or parse failure while loading or saving the store file.
#[derive(Debug)]
pub struct PersistenceError {
    pub path: PathBuf,
    pub message: String,
}

impl PersistenceError {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

impl std::error::Error for PersistenceError {}

/// Failure of an update-shaped operation. Not-found is not an error; it is
/// the `Ok(false)` arm of the operation result.
#[derive(Debug)]
pub enum UpdateError {
    Validation(ValidationError),
    Persistence(PersistenceError),
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateError::Validation(e) => write!(f, "{}", e),
            UpdateError::Persistence(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for UpdateError {}

impl From<ValidationError> for UpdateError {
    fn from(e: ValidationError) -> Self {
        UpdateError::Validation(e)
    }
}

impl From<PersistenceError> for UpdateError {
    fn from(e: PersistenceError) -> Self {
        UpdateError::Persistence(e)
    }
}

/// What to do when the store file cannot be read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// Log and keep going: a failed load starts from an empty collection
    /// (the failure stays inspectable via [`StudentStore::load_warning`]),
    /// a failed save leaves the in-memory state authoritative.
    #[default]
    Lenient,
    /// Load and save failures propagate to the caller.
    Strict,
}

/// Partial update for one student. Each slot is independent; a blank name or
/// class is treated the same as an omitted one and leaves the current value.
/// A supplied grade map replaces the existing grades wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
    pub name: Option<String>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub grades: Option<BTreeMap<String, f64>>,
}

/// Ordered collection of students bound to a JSON file. Every mutating
/// operation writes the whole collection back before reporting success;
/// insertion order is the display order.
pub struct StudentStore {
    path: PathBuf,
    students: Vec<Student>,
    recovery: RecoveryMode,
    load_warning: Option<String>,
}

impl StudentStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        Self::open_with(path, RecoveryMode::default())
    }

    pub fn open_with(
        path: impl Into<PathBuf>,
        recovery: RecoveryMode,
    ) -> Result<Self, PersistenceError> {
        let mut store = Self {
            path: path.into(),
            students: Vec::new(),
            recovery,
            load_warning: None,
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn recovery(&self) -> RecoveryMode {
        self.recovery
    }

    /// Set when a lenient open had to fall back to an empty collection.
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    fn load(&mut self) -> Result<(), PersistenceError> {
        if !self.path.exists() {
            // First run: seed the file so every later open takes the same path.
            return self.persist();
        }

        let raw = match std::fs::read_to_string(&self.path) {
            Ok(v) => v,
            Err(e) => {
                return self.recover_load(PersistenceError::new(
                    &self.path,
                    format!("read failed: {}", e),
                ))
            }
        };

        let text = if raw.trim().is_empty() { "[]" } else { raw.as_str() };
        match serde_json::from_str::<Vec<Student>>(text) {
            Ok(students) => {
                self.students = students;
                Ok(())
            }
            Err(e) => self.recover_load(PersistenceError::new(
                &self.path,
                format!("parse failed: {}", e),
            )),
        }
    }

    fn recover_load(&mut self, err: PersistenceError) -> Result<(), PersistenceError> {
        match self.recovery {
            RecoveryMode::Strict => Err(err),
            RecoveryMode::Lenient => {
                warn!(path = %self.path.display(), "store load failed, starting empty: {}", err.message);
                self.students.clear();
                self.load_warning = Some(err.message);
                Ok(())
            }
        }
    }

    fn write_all(&self) -> Result<(), PersistenceError> {
        let body = serde_json::to_string_pretty(&self.students)
            .map_err(|e| PersistenceError::new(&self.path, format!("serialize failed: {}", e)))?;
        std::fs::write(&self.path, body)
            .map_err(|e| PersistenceError::new(&self.path, format!("write failed: {}", e)))
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        match self.write_all() {
            Ok(()) => Ok(()),
            Err(e) => match self.recovery {
                RecoveryMode::Strict => Err(e),
                RecoveryMode::Lenient => {
                    error!(path = %self.path.display(), "store save failed: {}", e.message);
                    Ok(())
                }
            },
        }
    }

    /// Appends and persists. `Ok(false)` when the id is already taken; in
    /// that case nothing is mutated and nothing is written.
    pub fn add(&mut self, student: Student) -> Result<bool, PersistenceError> {
        if self.students.iter().any(|s| s.id() == student.id()) {
            return Ok(false);
        }
        self.students.push(student);
        self.persist()?;
        Ok(true)
    }

    /// Removes by id, preserving the order of the remainder. `Ok(false)`
    /// when the id is unknown.
    pub fn remove(&mut self, id: &str) -> Result<bool, PersistenceError> {
        let Some(idx) = self.students.iter().position(|s| s.id() == id) else {
            return Ok(false);
        };
        self.students.remove(idx);
        self.persist()?;
        Ok(true)
    }

    pub fn find(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id() == id)
    }

    /// Applies a patch to one student. Validation failures abort before any
    /// field is changed (grade replacement is validated as a whole set), so
    /// a failed update never leaves a half-patched record.
    pub fn update(&mut self, id: &str, patch: &StudentPatch) -> Result<bool, UpdateError> {
        let Some(student) = self.students.iter_mut().find(|s| s.id() == id) else {
            return Ok(false);
        };

        if let Some(grades) = &patch.grades {
            student.replace_grades(grades)?;
        }
        if let Some(name) = patch.name.as_deref() {
            if !name.trim().is_empty() {
                student.set_name(name)?;
            }
        }
        if let Some(class_name) = patch.class_name.as_deref() {
            if !class_name.trim().is_empty() {
                student.set_class(class_name)?;
            }
        }

        self.persist()?;
        Ok(true)
    }

    /// Records one subject mark and persists. `Ok(false)` when the id is
    /// unknown; a validation failure leaves both memory and file untouched.
    pub fn add_grade(
        &mut self,
        id: &str,
        subject: &str,
        score: f64,
    ) -> Result<bool, UpdateError> {
        let Some(student) = self.students.iter_mut().find(|s| s.id() == id) else {
            return Ok(false);
        };
        student.add_grade(subject, score)?;
        self.persist()?;
        Ok(true)
    }

    /// Ordered view of the whole collection. Internal state cannot be
    /// mutated through it; clone individual records to take ownership.
    pub fn all(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn top_n(&self, n: usize) -> Vec<&Student> {
        calc::top_students(&self.students, n)
    }

    pub fn by_class(&self, class_name: &str) -> Vec<&Student> {
        calc::students_in_class(&self.students, class_name)
    }

    pub fn class_statistics(&self, class_name: &str) -> ClassStatistics {
        calc::class_statistics(class_name, &self.students)
    }

    pub fn export_report(&self, prefix: &str) -> Result<ExportPaths, ExportError> {
        report::export_report(&self.students, prefix)
    }
}
