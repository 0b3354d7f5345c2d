use crate::ipc::error::{err, ok, validation};
use crate::ipc::helpers::{optional_str, required_str, store_mut, store_ref, student_json};
use crate::ipc::types::{AppState, Request};
use crate::store::{StudentPatch, UpdateError};
use crate::student::Student;
use serde_json::json;
use uuid::Uuid;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let students: Vec<serde_json::Value> = store.all().iter().map(student_json).collect();
    ok(&req.id, json!({ "students": students }))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_name = match required_str(req, "class") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Front ends may supply their own id (imports, roster numbers); without
    // one we mint a uuid.
    let id = match optional_str(req, "id").filter(|v| !v.trim().is_empty()) {
        Some(v) => v,
        None => Uuid::new_v4().to_string(),
    };

    let store = match store_mut(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let student = match Student::new(&id, &name, &class_name) {
        Ok(s) => s,
        Err(e) => return validation(&req.id, &e),
    };
    let student_id = student.id().to_string();

    match store.add(student) {
        Ok(true) => ok(&req.id, json!({ "studentId": student_id })),
        Ok(false) => err(
            &req.id,
            "duplicate_id",
            format!("student id already in use: {}", student_id),
            None,
        ),
        Err(e) => err(&req.id, "persist_failed", e.to_string(), None),
    }
}

fn handle_students_find(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.find(&student_id) {
        Some(s) => ok(&req.id, json!({ "student": student_json(s) })),
        None => err(&req.id, "not_found", "student not found", None),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // The patch shape ignores unrelated params (like studentId itself); a
    // wrongly typed slot is a protocol error, not a validation failure.
    let patch: StudentPatch = match serde_json::from_value(req.params.clone()) {
        Ok(p) => p,
        Err(e) => return err(&req.id, "bad_params", format!("invalid patch: {}", e), None),
    };

    let store = match store_mut(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.update(&student_id, &patch) {
        Ok(true) => match store.find(&student_id) {
            Some(s) => ok(&req.id, json!({ "student": student_json(s) })),
            None => ok(&req.id, json!({ "updated": true })),
        },
        Ok(false) => err(&req.id, "not_found", "student not found", None),
        Err(UpdateError::Validation(e)) => validation(&req.id, &e),
        Err(UpdateError::Persistence(e)) => err(&req.id, "persist_failed", e.to_string(), None),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let store = match store_mut(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.remove(&student_id) {
        Ok(true) => ok(&req.id, json!({ "deleted": true })),
        Ok(false) => err(&req.id, "not_found", "student not found", None),
        Err(e) => err(&req.id, "persist_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.find" => Some(handle_students_find(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
