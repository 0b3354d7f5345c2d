use crate::student::Student;
use anyhow::{anyhow, Context};
use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DATA_ENTRY: &str = "data/rollbook.json";
pub const BUNDLE_FORMAT_V1: &str = "rollbook-store-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

/// Bundles the store file into a zip with a manifest carrying a SHA-256 of
/// the data, so an import can detect a truncated or altered bundle.
pub fn export_store_bundle(store_path: &Path, out_path: &Path) -> anyhow::Result<ExportSummary> {
    if !store_path.is_file() {
        return Err(anyhow!(
            "store file not found: {}",
            store_path.to_string_lossy()
        ));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let data = std::fs::read(store_path)
        .with_context(|| format!("failed to read store {}", store_path.to_string_lossy()))?;

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": Utc::now().to_rfc3339(),
        "sha256": hex_digest(&data),
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DATA_ENTRY, opts)
        .context("failed to start data entry")?;
    zip.write_all(&data).context("failed to write data entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
    })
}

/// Restores a bundle over the store file. A bare JSON store file is accepted
/// as a legacy input; either way the payload is parse-checked before it
/// replaces anything.
pub fn import_store_bundle(in_path: &Path, store_path: &Path) -> anyhow::Result<ImportSummary> {
    if let Some(parent) = store_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    if !is_zip_file(in_path)? {
        let raw = std::fs::read_to_string(in_path)
            .with_context(|| format!("failed to read input {}", in_path.to_string_lossy()))?;
        serde_json::from_str::<Vec<Student>>(&raw)
            .context("input is not a valid store file")?;
        std::fs::copy(in_path, store_path).with_context(|| {
            format!(
                "failed to copy store from {} to {}",
                in_path.to_string_lossy(),
                store_path.to_string_lossy()
            )
        })?;
        return Ok(ImportSummary {
            bundle_format_detected: "bare-json".to_string(),
        });
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut data = Vec::new();
    archive
        .by_name(DATA_ENTRY)
        .context("bundle missing data/rollbook.json")?
        .read_to_end(&mut data)
        .context("failed to read data entry")?;

    if let Some(expected) = manifest.get("sha256").and_then(|v| v.as_str()) {
        let actual = hex_digest(&data);
        if actual != expected {
            return Err(anyhow!(
                "bundle checksum mismatch: manifest {} != data {}",
                expected,
                actual
            ));
        }
    }

    serde_json::from_slice::<Vec<Student>>(&data)
        .context("bundle data is not a valid store file")?;

    let tmp_dst = store_path.with_extension("json.importing");
    if tmp_dst.exists() {
        let _ = std::fs::remove_file(&tmp_dst);
    }
    std::fs::write(&tmp_dst, &data).with_context(|| {
        format!("failed to write temp store {}", tmp_dst.to_string_lossy())
    })?;
    if store_path.exists() {
        std::fs::remove_file(store_path).with_context(|| {
            format!(
                "failed to remove existing store {}",
                store_path.to_string_lossy()
            )
        })?;
    }
    std::fs::rename(&tmp_dst, store_path).with_context(|| {
        format!(
            "failed to move imported store to {}",
            store_path.to_string_lossy()
        )
    })?;

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
    })
}

fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StudentStore, STORE_FILE_NAME};

    #[test]
    fn bundle_round_trip_restores_students() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join(STORE_FILE_NAME);

        let mut store = StudentStore::open(&store_path).unwrap();
        let mut s = Student::new("S1", "Ana", "10A").unwrap();
        s.add_grade("Math", 88.0).unwrap();
        store.add(s.clone()).unwrap();
        drop(store);

        let bundle = dir.path().join("backup.zip");
        let summary = export_store_bundle(&store_path, &bundle).expect("export bundle");
        assert_eq!(summary.bundle_format, BUNDLE_FORMAT_V1);
        assert_eq!(summary.entry_count, 2);

        let restored_dir = tempfile::tempdir().unwrap();
        let restored_path = restored_dir.path().join(STORE_FILE_NAME);
        let imported = import_store_bundle(&bundle, &restored_path).expect("import bundle");
        assert_eq!(imported.bundle_format_detected, BUNDLE_FORMAT_V1);

        let restored = StudentStore::open(&restored_path).unwrap();
        assert_eq!(restored.all(), &[s]);
    }

    #[test]
    fn import_accepts_bare_json_store() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("old-rollbook.json");
        std::fs::write(
            &input,
            r#"[{"id":"S1","name":"Ana","class":"10A","grades":{"Math":80}}]"#,
        )
        .unwrap();

        let store_path = dir.path().join(STORE_FILE_NAME);
        let imported = import_store_bundle(&input, &store_path).expect("import bare json");
        assert_eq!(imported.bundle_format_detected, "bare-json");

        let store = StudentStore::open(&store_path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn import_rejects_invalid_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join(STORE_FILE_NAME);

        let not_a_store = dir.path().join("junk.json");
        std::fs::write(&not_a_store, "{\"not\":\"a list\"}").unwrap();
        assert!(import_store_bundle(&not_a_store, &store_path).is_err());

        // A record with an out-of-range grade must not replace the store.
        let tampered = dir.path().join("tampered.json");
        std::fs::write(
            &tampered,
            r#"[{"id":"S1","name":"Ana","class":"10A","grades":{"Math":999}}]"#,
        )
        .unwrap();
        assert!(import_store_bundle(&tampered, &store_path).is_err());
        assert!(!store_path.exists());
    }
}
