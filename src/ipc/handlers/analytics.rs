use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, store_ref, student_json};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const DEFAULT_TOP_LIMIT: i64 = 3;

fn handle_analytics_top(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let limit = match req.params.get("limit") {
        None => DEFAULT_TOP_LIMIT,
        Some(v) => match v.as_i64() {
            Some(n) => n,
            None => return err(&req.id, "bad_params", "limit must be an integer", None),
        },
    };
    // Negative limits behave like zero rather than erroring.
    let n = limit.max(0) as usize;

    let students: Vec<serde_json::Value> = store
        .top_n(n)
        .into_iter()
        .map(student_json)
        .collect();
    ok(&req.id, json!({ "students": students }))
}

fn handle_analytics_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_name = match required_str(req, "className") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let students: Vec<serde_json::Value> = store
        .by_class(&class_name)
        .into_iter()
        .map(student_json)
        .collect();
    ok(
        &req.id,
        json!({ "className": class_name, "students": students }),
    )
}

fn handle_analytics_class_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_name = match required_str(req, "className") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let stats = store.class_statistics(&class_name);
    ok(
        &req.id,
        json!({
            "className": stats.class_name,
            "totalStudents": stats.total_students,
            "averageClassScore": stats.average_class_score,
            "passCount": stats.pass_count,
            "failCount": stats.fail_count,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.top" => Some(handle_analytics_top(state, req)),
        "analytics.class" => Some(handle_analytics_class(state, req)),
        "analytics.classStats" => Some(handle_analytics_class_stats(state, req)),
        _ => None,
    }
}
