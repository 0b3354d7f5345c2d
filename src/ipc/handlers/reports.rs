use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, store_ref};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_reports_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let prefix = match required_str(req, "outPrefix") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.export_report(&prefix) {
        Ok(paths) => ok(
            &req.id,
            json!({
                "jsonPath": paths.json_path.to_string_lossy(),
                "csvPath": paths.csv_path.to_string_lossy(),
            }),
        ),
        Err(e) => err(
            &req.id,
            "export_failed",
            e.to_string(),
            Some(json!({ "path": e.path().to_string_lossy() })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.export" => Some(handle_reports_export(state, req)),
        _ => None,
    }
}
