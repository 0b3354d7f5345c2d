use crate::ipc::error::{err, ok, validation};
use crate::ipc::helpers::{required_str, store_mut};
use crate::ipc::types::{AppState, Request};
use crate::store::UpdateError;
use serde_json::json;

fn handle_grades_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let subject = match required_str(req, "subject") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(score) = req.params.get("score").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "score must be a number", None);
    };

    let store = match store_mut(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    // The store persists the grade itself; front ends need no separate save.
    match store.add_grade(&student_id, &subject, score) {
        Ok(true) => {
            let (average, status) = match store.find(&student_id) {
                Some(s) => (s.average(), s.status().as_str()),
                None => (0.0, "fail"),
            };
            ok(
                &req.id,
                json!({
                    "studentId": student_id,
                    "average": average,
                    "status": status,
                }),
            )
        }
        Ok(false) => err(&req.id, "not_found", "student not found", None),
        Err(UpdateError::Validation(e)) => validation(&req.id, &e),
        Err(UpdateError::Persistence(e)) => err(&req.id, "persist_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.set" => Some(handle_grades_set(state, req)),
        _ => None,
    }
}
