use crate::student::Student;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "id,name,class,average,status,subjects";

/// Export failure. Unlike store load/save, report export never soft-fails: a
/// partially written report is worse than no report.
#[derive(Debug)]
pub struct ExportError {
    path: PathBuf,
    source: std::io::Error,
}

impl ExportError {
    fn new(path: &Path, source: std::io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to write {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPaths {
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
}

/// Writes `{prefix}.json` (same shape as the store file) and `{prefix}.csv`
/// (one row per student, subjects flattened into a single delimited field).
pub fn export_report(students: &[Student], prefix: &str) -> Result<ExportPaths, ExportError> {
    let json_path = PathBuf::from(format!("{}.json", prefix));
    let csv_path = PathBuf::from(format!("{}.csv", prefix));

    if let Some(parent) = json_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::new(parent, e))?;
        }
    }

    let body = serde_json::to_string_pretty(students)
        .map_err(|e| ExportError::new(&json_path, e.into()))?;
    std::fs::write(&json_path, body).map_err(|e| ExportError::new(&json_path, e))?;

    std::fs::write(&csv_path, render_csv(students)).map_err(|e| ExportError::new(&csv_path, e))?;

    Ok(ExportPaths {
        json_path,
        csv_path,
    })
}

fn render_csv(students: &[Student]) -> String {
    let mut lines = Vec::with_capacity(students.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for s in students {
        let subjects = s
            .grades()
            .iter()
            .map(|(subject, score)| format!("{}:{}", subject, score))
            .collect::<Vec<_>>()
            .join(";");
        lines.push(format!(
            "{},{},{},{:.2},{},{}",
            csv_quote(s.id()),
            csv_quote(s.name()),
            csv_quote(s.class_name()),
            s.average(),
            csv_quote(s.status().as_str()),
            csv_quote(&subjects),
        ));
    }
    lines.join("\n")
}

/// String fields are always quoted so `,` and `;` inside names survive;
/// embedded quotes are doubled.
fn csv_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
