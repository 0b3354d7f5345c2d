use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{RecoveryMode, StudentStore, STORE_FILE_NAME};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "studentCount": state.store.as_ref().map(|s| s.len()),
        }),
    )
}

fn parse_recovery(req: &Request) -> Result<RecoveryMode, serde_json::Value> {
    match req
        .params
        .get("recovery")
        .and_then(|v| v.as_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        None | Some("lenient") => Ok(RecoveryMode::Lenient),
        Some("strict") => Ok(RecoveryMode::Strict),
        Some(other) => Err(err(
            &req.id,
            "bad_params",
            "recovery must be one of: lenient, strict",
            Some(json!({ "recovery": other })),
        )),
    }
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    let recovery = match parse_recovery(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if let Err(e) = std::fs::create_dir_all(&path) {
        return err(
            &req.id,
            "store_load_failed",
            format!("failed to create workspace: {}", e),
            None,
        );
    }

    match StudentStore::open_with(path.join(STORE_FILE_NAME), recovery) {
        Ok(store) => {
            state.workspace = Some(path.clone());
            let mut result = json!({
                "workspacePath": path.to_string_lossy(),
                "studentCount": store.len(),
            });
            // Lenient opens surface the swallowed load failure so the front
            // end may render it; callers are free to ignore it.
            if let Some(warning) = store.load_warning() {
                result["loadWarning"] = json!(warning);
            }
            state.store = Some(store);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "store_load_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
