use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::SubjectType;
use rusqlite::OptionalExtension;
use serde_json::json;
use uuid::Uuid;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    match db::load_subjects(conn) {
        Ok(subjects) => ok(&req.id, json!({ "subjects": subjects })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let code = match req.params.get("code").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing code", None),
    };
    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing name", None),
    };
    if code.is_empty() || name.is_empty() {
        return err(&req.id, "bad_params", "code and name must not be empty", None);
    }
    let subject_type = match req
        .params
        .get("subjectType")
        .and_then(|v| v.as_str())
        .and_then(SubjectType::parse)
    {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing or unknown subjectType", None),
    };

    let duplicate: Option<i64> = match conn
        .query_row("SELECT 1 FROM subjects WHERE code = ?", [&code], |r| {
            r.get(0)
        })
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if duplicate.is_some() {
        return err(
            &req.id,
            "duplicate_code",
            format!("subject code {code} already exists"),
            None,
        );
    }

    let boards = req
        .params
        .get("boards")
        .cloned()
        .unwrap_or_else(|| json!(["central"]));
    let grades = req
        .params
        .get("grades")
        .cloned()
        .unwrap_or_else(|| json!([]));

    let subject_id = Uuid::new_v4().to_string();
    if let Err(e) = conn.execute(
        "INSERT INTO subjects(id, code, name, subject_type, boards, grades, status)
         VALUES(?, ?, ?, ?, ?, ?, 'active')",
        (
            &subject_id,
            &code,
            &name,
            subject_type.as_str(),
            boards.to_string(),
            grades.to_string(),
        ),
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "subjects" })),
        );
    }

    ok(&req.id, json!({ "subjectId": subject_id, "code": code }))
}

/// Refuses deletion while any curriculum row still references the subject.
/// Class deletion deliberately has no such guard.
fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let subject_id = match req.params.get("subjectId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing subjectId", None),
    };

    let usage: i64 = match conn.query_row(
        "SELECT COUNT(*) FROM curriculum_rows WHERE subject_id = ?",
        [&subject_id],
        |r| r.get(0),
    ) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if usage > 0 {
        return err(
            &req.id,
            "in_use",
            format!("subject is mapped in {usage} curriculum row(s)"),
            Some(json!({ "usageCount": usage })),
        );
    }

    let deleted = match conn.execute("DELETE FROM subjects WHERE id = ?", [&subject_id]) {
        Ok(n) => n,
        Err(e) => return err(&req.id, "db_delete_failed", e.to_string(), None),
    };
    if deleted == 0 {
        return err(&req.id, "not_found", "subject not found", None);
    }

    ok(&req.id, json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        _ => None,
    }
}
