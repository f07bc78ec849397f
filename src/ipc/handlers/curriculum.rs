use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::validate::curriculum::{apply_marks_edit, validate_mapping};
use crate::wizard::MappingWizardStep;
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn row_class_id(conn: &Connection, row_id: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT class_id FROM curriculum_rows WHERE id = ?",
        [row_id],
        |r| r.get(0),
    )
    .optional()
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };
    match db::load_curriculum_rows(conn, &class_id) {
        Ok(rows) => ok(&req.id, json!({ "rows": rows })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

/// Replaces the class's subject selection: rows for unselected subjects are
/// dropped, rows for newly selected subjects are created with the next free
/// display order and zeroed marks. Existing rows keep their edits.
fn handle_select_subjects(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };
    let subject_ids: Vec<String> = match req.params.get("subjectIds").and_then(|v| v.as_array()) {
        Some(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        None => return err(&req.id, "bad_params", "missing subjectIds", None),
    };

    let existing = match db::load_curriculum_rows(conn, &class_id) {
        Ok(rows) => rows,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };

    for row in &existing {
        if !subject_ids.contains(&row.subject_id) {
            if let Err(e) = tx.execute("DELETE FROM curriculum_rows WHERE id = ?", [&row.id]) {
                let _ = tx.rollback();
                return err(&req.id, "db_delete_failed", e.to_string(), None);
            }
        }
    }

    let mut next_order = existing
        .iter()
        .filter(|r| subject_ids.contains(&r.subject_id))
        .map(|r| r.display_order)
        .max()
        .unwrap_or(0)
        + 1;
    let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for subject_id in &subject_ids {
        if !seen.insert(subject_id.as_str()) {
            continue;
        }
        if existing.iter().any(|r| &r.subject_id == subject_id) {
            continue;
        }
        let row_id = Uuid::new_v4().to_string();
        if let Err(e) = tx.execute(
            "INSERT INTO curriculum_rows(id, class_id, subject_id, display_order, is_optional, updated_at)
             VALUES(?, ?, ?, ?, 0, ?)",
            (&row_id, &class_id, subject_id, next_order, now()),
        ) {
            let _ = tx.rollback();
            return err(
                &req.id,
                "db_insert_failed",
                e.to_string(),
                Some(json!({ "table": "curriculum_rows", "subjectId": subject_id })),
            );
        }
        next_order += 1;
    }

    if let Err(e) = tx.commit() {
        return err(&req.id, "db_tx_failed", e.to_string(), None);
    }

    match db::load_curriculum_rows(conn, &class_id) {
        Ok(rows) => ok(&req.id, json!({ "rows": rows })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

/// Raw-marks edit: total and pass marks are re-derived through the engine.
/// Any manual pass-marks override is reset here, and only here.
fn handle_update_marks(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let row_id = match req.params.get("rowId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing rowId", None),
    };
    let theory = req.params.get("theoryMarks").and_then(|v| v.as_i64());
    let practical = req.params.get("practicalMarks").and_then(|v| v.as_i64());
    let ia = req.params.get("iaMarks").and_then(|v| v.as_i64());
    let (Some(theory), Some(practical), Some(ia)) = (theory, practical, ia) else {
        return err(
            &req.id,
            "bad_params",
            "theoryMarks, practicalMarks and iaMarks are required",
            None,
        );
    };
    if theory < 0 || practical < 0 || ia < 0 {
        return err(&req.id, "bad_params", "marks must not be negative", None);
    }

    let class_id = match row_class_id(conn, &row_id) {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "not_found", "curriculum row not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = match db::load_curriculum_rows(conn, &class_id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let Some(mut row) = rows.into_iter().find(|r| r.id == row_id) else {
        return err(&req.id, "not_found", "curriculum row not found", None);
    };

    apply_marks_edit(&mut row, theory, practical, ia);

    if let Err(e) = conn.execute(
        "UPDATE curriculum_rows
         SET theory_marks = ?, practical_marks = ?, ia_marks = ?,
             total_marks = ?, pass_marks = ?, updated_at = ?
         WHERE id = ?",
        (
            row.max_theory_marks,
            row.max_practical_marks,
            row.max_ia_marks,
            row.total_max_marks,
            row.pass_marks,
            now(),
            &row_id,
        ),
    ) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }

    ok(&req.id, json!({ "row": row }))
}

/// Manual pass-marks override. Does not touch the marks components and is
/// never re-derived by later non-marks edits.
fn handle_set_pass_marks(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let row_id = match req.params.get("rowId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing rowId", None),
    };
    let pass_marks = match req.params.get("passMarks").and_then(|v| v.as_i64()) {
        Some(v) if v >= 0 => v,
        _ => return err(&req.id, "bad_params", "passMarks must be a non-negative integer", None),
    };

    let updated = match conn.execute(
        "UPDATE curriculum_rows SET pass_marks = ?, updated_at = ? WHERE id = ?",
        (pass_marks, now(), &row_id),
    ) {
        Ok(n) => n,
        Err(e) => return err(&req.id, "db_update_failed", e.to_string(), None),
    };
    if updated == 0 {
        return err(&req.id, "not_found", "curriculum row not found", None);
    }

    ok(&req.id, json!({ "rowId": row_id, "passMarks": pass_marks }))
}

/// Structural row edits (order, optional flag, hours). Deliberately leaves
/// total and pass marks alone.
fn handle_update_row(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let row_id = match req.params.get("rowId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing rowId", None),
    };

    let class_id = match row_class_id(conn, &row_id) {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "not_found", "curriculum row not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    if let Some(display_order) = req.params.get("displayOrder").and_then(|v| v.as_i64()) {
        if let Err(e) = conn.execute(
            "UPDATE curriculum_rows SET display_order = ?, updated_at = ? WHERE id = ?",
            (display_order, now(), &row_id),
        ) {
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }
    if let Some(is_optional) = req.params.get("isOptional").and_then(|v| v.as_bool()) {
        if let Err(e) = conn.execute(
            "UPDATE curriculum_rows SET is_optional = ?, updated_at = ? WHERE id = ?",
            (is_optional as i64, now(), &row_id),
        ) {
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }
    if let Some(hours) = req.params.get("teachingHoursPerWeek").and_then(|v| v.as_i64()) {
        if let Err(e) = conn.execute(
            "UPDATE curriculum_rows SET hours_per_week = ?, updated_at = ? WHERE id = ?",
            (hours, now(), &row_id),
        ) {
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }

    let rows = match db::load_curriculum_rows(conn, &class_id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match rows.into_iter().find(|r| r.id == row_id) {
        Some(row) => ok(&req.id, json!({ "row": row })),
        None => err(&req.id, "not_found", "curriculum row not found", None),
    }
}

/// Step gate for the mapping wizard. No step blocks a forward transition;
/// everything is checked once at final save.
fn handle_validate_step(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_session", "open a session first", None);
    }
    let step = match req
        .params
        .get("step")
        .and_then(|v| v.as_str())
        .and_then(MappingWizardStep::parse)
    {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing or unknown step", None),
    };
    ok(
        &req.id,
        json!({ "step": step.as_str(), "valid": true, "fieldErrors": [] }),
    )
}

/// Final save of the mapping wizard: the full accumulated row set goes
/// through the validator once; nothing is committed on a failing report.
fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };

    let rows = match db::load_curriculum_rows(conn, &class_id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let report = validate_mapping(&rows);
    if !report.is_valid {
        return ok(&req.id, json!({ "saved": false, "report": report }));
    }

    if let Err(e) = conn.execute(
        "UPDATE curriculum_rows SET updated_at = ? WHERE class_id = ?",
        (now(), &class_id),
    ) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }

    ok(&req.id, json!({ "saved": true, "report": report }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "curriculum.open" => Some(handle_open(state, req)),
        "curriculum.selectSubjects" => Some(handle_select_subjects(state, req)),
        "curriculum.updateMarks" => Some(handle_update_marks(state, req)),
        "curriculum.setPassMarks" => Some(handle_set_pass_marks(state, req)),
        "curriculum.updateRow" => Some(handle_update_row(state, req)),
        "curriculum.validateStep" => Some(handle_validate_step(state, req)),
        "curriculum.save" => Some(handle_save(state, req)),
        _ => None,
    }
}
