use crate::student::ValidationError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Validation failures carry the offending field so a front end can point
/// at the exact input.
pub fn validation(id: &str, e: &ValidationError) -> serde_json::Value {
    err(
        id,
        "validation_failed",
        e.message.clone(),
        Some(json!({ "field": e.field })),
    )
}
