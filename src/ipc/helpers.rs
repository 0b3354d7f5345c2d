use super::error::err;
use super::types::{AppState, Request};
use crate::store::StudentStore;
use crate::student::Student;
use serde_json::json;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

pub fn store_ref<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a StudentStore, serde_json::Value> {
    state
        .store
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn store_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut StudentStore, serde_json::Value> {
    state
        .store
        .as_mut()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// Stored fields plus the derived values every front end needs; rendering
/// (number formatting, labels) stays on the caller's side.
pub fn student_json(s: &Student) -> serde_json::Value {
    json!({
        "id": s.id(),
        "name": s.name(),
        "class": s.class_name(),
        "grades": s.grades(),
        "average": s.average(),
        "status": s.status().as_str(),
    })
}
