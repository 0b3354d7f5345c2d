
use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn student_crud_over_ipc() {
    let workspace = temp_dir("rollbook-students-crud");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "id": "S1", "name": "Ana", "class": "10A" }),
    );
    assert_eq!(created.get("studentId").and_then(|v| v.as_str()), Some("S1"));

    // Same id again is a soft duplicate failure, not a validation error.
    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "id": "S1", "name": "Ben", "class": "10B" }),
    );
    assert_eq!(code, "duplicate_id");

    let found = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.find",
        json!({ "studentId": "S1" }),
    );
    let student = found.get("student").expect("student");
    assert_eq!(student.get("name").and_then(|v| v.as_str()), Some("Ana"));
    assert_eq!(student.get("class").and_then(|v| v.as_str()), Some("10A"));
    assert_eq!(student.get("average").and_then(|v| v.as_f64()), Some(0.0));
    assert_eq!(student.get("status").and_then(|v| v.as_str()), Some("fail"));

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "students.find",
        json!({ "studentId": "missing" }),
    );
    assert_eq!(code, "not_found");

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.delete",
        json!({ "studentId": "S1" }),
    );
    assert_eq!(deleted.get("deleted").and_then(|v| v.as_bool()), Some(true));

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "students.delete",
        json!({ "studentId": "S1" }),
    );
    assert_eq!(code, "not_found");
}

#[test]
fn create_without_id_generates_one() {
    let workspace = temp_dir("rollbook-students-genid");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "name": "Ana", "class": "10A" }),
    );
    let id = created
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("generated id");
    assert!(!id.trim().is_empty());

    let found = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.find",
        json!({ "studentId": id }),
    );
    assert_eq!(
        found
            .get("student")
            .and_then(|s| s.get("name"))
            .and_then(|v| v.as_str()),
        Some("Ana")
    );
}

#[test]
fn create_with_blank_fields_fails_validation() {
    let workspace = temp_dir("rollbook-students-blank");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let (code, error) = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "name": "   ", "class": "10A" }),
    );
    assert_eq!(code, "validation_failed");
    assert_eq!(
        error
            .get("details")
            .and_then(|d| d.get("field"))
            .and_then(|v| v.as_str()),
        Some("name")
    );

    // Missing keys are a protocol error, distinguishable from validation.
    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "name": "Ana" }),
    );
    assert_eq!(code, "bad_params");
}

#[test]
fn update_patches_fields_independently() {
    let workspace = temp_dir("rollbook-students-update");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "id": "S1", "name": "Ana", "class": "10A" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.set",
        json!({ "studentId": "S1", "subject": "Math", "score": 80 }),
    );

    // Blank name leaves the current one; class changes.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.update",
        json!({ "studentId": "S1", "name": "", "class": "11B" }),
    );
    let student = updated.get("student").expect("student");
    assert_eq!(student.get("name").and_then(|v| v.as_str()), Some("Ana"));
    assert_eq!(student.get("class").and_then(|v| v.as_str()), Some("11B"));

    // A supplied grade map replaces the whole set.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.update",
        json!({ "studentId": "S1", "grades": { "Sci": 65, "Art": 90 } }),
    );
    let grades = updated
        .get("student")
        .and_then(|s| s.get("grades"))
        .and_then(|v| v.as_object())
        .expect("grades");
    assert_eq!(grades.len(), 2);
    assert!(grades.get("Math").is_none());

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "students.update",
        json!({ "studentId": "nope", "name": "X" }),
    );
    assert_eq!(code, "not_found");
}

#[test]
fn update_with_invalid_grades_is_rejected_and_keeps_old_grades() {
    let workspace = temp_dir("rollbook-students-update-invalid");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "id": "S1", "name": "Ana", "class": "10A" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.set",
        json!({ "studentId": "S1", "subject": "Math", "score": 80 }),
    );

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "students.update",
        json!({ "studentId": "S1", "grades": { "Sci": 130 } }),
    );
    assert_eq!(code, "validation_failed");

    let found = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.find",
        json!({ "studentId": "S1" }),
    );
    let grades = found
        .get("student")
        .and_then(|s| s.get("grades"))
        .and_then(|v| v.as_object())
        .expect("grades");
    assert_eq!(grades.get("Math").and_then(|v| v.as_f64()), Some(80.0));
    assert_eq!(grades.len(), 1);

    // Wrongly typed grades are a protocol error.
    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "students.update",
        json!({ "studentId": "S1", "grades": { "Sci": "eighty" } }),
    );
    assert_eq!(code, "bad_params");
}

#[test]
fn list_preserves_insertion_order() {
    let workspace = temp_dir("rollbook-students-order");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    for (i, id) in ["S3", "S1", "S2"].iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{}", i),
            "students.create",
            json!({ "id": id, "name": format!("Student {}", id), "class": "10A" }),
        );
    }

    let listed = request_ok(&mut stdin, &mut reader, "9", "students.list", json!({}));
    let ids: Vec<String> = listed
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students array")
        .iter()
        .map(|s| s.get("id").and_then(|v| v.as_str()).unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["S3", "S1", "S2"]);
}
