use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::store::{StudentStore, STORE_FILE_NAME};
use serde_json::json;
use std::path::Path;

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match required_str(req, "outPath") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match backup::export_store_bundle(store.path(), Path::new(&out_path)) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
                "outPath": out_path,
            }),
        ),
        Err(e) => err(&req.id, "backup_failed", format!("{:#}", e), None),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match required_str(req, "inPath") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let recovery = match &state.store {
        Some(store) => store.recovery(),
        None => Default::default(),
    };

    let store_path = workspace.join(STORE_FILE_NAME);
    let summary = match backup::import_store_bundle(Path::new(&in_path), &store_path) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "backup_failed", format!("{:#}", e), None),
    };

    // Reopen so the in-memory collection reflects the imported file.
    match StudentStore::open_with(&store_path, recovery) {
        Ok(store) => {
            let student_count = store.len();
            state.store = Some(store);
            ok(
                &req.id,
                json!({
                    "bundleFormatDetected": summary.bundle_format_detected,
                    "studentCount": student_count,
                }),
            )
        }
        Err(e) => err(&req.id, "store_load_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
