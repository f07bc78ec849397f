use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::ClassStatus;
use crate::validate::conflict::{check_room_conflict, check_teacher_conflict};
use crate::wizard::{self, ClassDraft, ClassWizardStep};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn parse_draft(req: &Request) -> Result<ClassDraft, serde_json::Value> {
    let Some(raw) = req.params.get("draft") else {
        return Err(err(&req.id, "bad_params", "missing params.draft", None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("bad draft: {e}"), None))
}

fn class_exists(conn: &Connection, class_id: &str) -> Result<bool, rusqlite::Error> {
    conn.query_row("SELECT 1 FROM classes WHERE id = ?", [class_id], |r| {
        r.get::<_, i64>(0)
    })
    .optional()
    .map(|v| v.is_some())
}

/// Room and teacher exclusivity checks against the current snapshot.
/// Returns the error envelope to send when a conflict blocks the save.
fn check_conflicts(
    conn: &Connection,
    req: &Request,
    draft: &ClassDraft,
    exclude_class_id: Option<&str>,
) -> Result<(), serde_json::Value> {
    let classes = match db::load_classes(conn) {
        Ok(v) => v,
        Err(e) => return Err(err(&req.id, "db_query_failed", e.to_string(), None)),
    };

    if let Some(room_id) = draft.room_id.as_deref() {
        if let Some(conflict) = check_room_conflict(room_id, &classes, exclude_class_id) {
            return Err(err(
                &req.id,
                "conflict",
                conflict.message.clone(),
                Some(json!({ "kind": "room", "conflict": conflict })),
            ));
        }
    }
    if let Some(teacher_id) = draft.class_teacher_id.as_deref() {
        if let Some(conflict) = check_teacher_conflict(teacher_id, &classes, exclude_class_id) {
            return Err(err(
                &req.id,
                "conflict",
                conflict.message.clone(),
                Some(json!({ "kind": "teacher", "conflict": conflict })),
            ));
        }
    }
    Ok(())
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };

    let classes = match db::load_classes(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let rows: Vec<serde_json::Value> = classes
        .iter()
        .map(|c| {
            let subject_count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM curriculum_rows WHERE class_id = ?",
                    [&c.id],
                    |r| r.get(0),
                )
                .unwrap_or(0);
            let mut v = serde_json::to_value(c).unwrap_or_else(|_| json!({}));
            v["label"] = json!(c.label());
            v["subjectCount"] = json!(subject_count);
            v
        })
        .collect();

    ok(&req.id, json!({ "classes": rows }))
}

fn handle_classes_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };

    let classes = match db::load_classes(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match classes.iter().find(|c| c.id == class_id) {
        Some(c) => {
            let mut v = serde_json::to_value(c).unwrap_or_else(|_| json!({}));
            v["label"] = json!(c.label());
            ok(&req.id, json!({ "class": v }))
        }
        None => err(&req.id, "not_found", "class not found", None),
    }
}

/// Pure wizard gate check for one step; nothing is persisted.
fn handle_validate_step(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_session", "open a session first", None);
    }
    let step = match req
        .params
        .get("step")
        .and_then(|v| v.as_str())
        .and_then(ClassWizardStep::parse)
    {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing or unknown step", None),
    };
    let draft = match parse_draft(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let field_errors = wizard::validate_step(step, &draft);
    ok(
        &req.id,
        json!({
            "step": step.as_str(),
            "valid": field_errors.is_empty(),
            "fieldErrors": field_errors
        }),
    )
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let draft = match parse_draft(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let save_as_draft = req
        .params
        .get("saveAsDraft")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    // Save-as-draft bypasses every step gate and all conflict checks;
    // the class only starts competing for resources once it goes Active.
    if !save_as_draft {
        let field_errors = wizard::validate_all_steps(&draft);
        if !field_errors.is_empty() {
            return err(
                &req.id,
                "validation_failed",
                "class draft is incomplete",
                Some(json!({ "fieldErrors": field_errors })),
            );
        }
        if let Err(resp) = check_conflicts(conn, req, &draft, None) {
            return resp;
        }
    }

    let status = if save_as_draft {
        ClassStatus::Draft
    } else {
        ClassStatus::Active
    };
    let class_id = Uuid::new_v4().to_string();
    let board_category = draft
        .board_category
        .unwrap_or(crate::model::BoardCategory::Central);

    if let Err(e) = conn.execute(
        "INSERT INTO classes(id, academic_year, grade, section, board_category, board_state,
                             board_name, room_id, class_teacher_id, co_teacher_id, status,
                             capacity, enrollment, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)",
        (
            &class_id,
            &draft.academic_year,
            &draft.grade,
            &draft.section,
            board_category.as_str(),
            &draft.board_state,
            &draft.board_name,
            &draft.room_id,
            &draft.class_teacher_id,
            &draft.co_teacher_id,
            status.as_str(),
            draft.capacity.unwrap_or(0),
            now(),
        ),
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "classes" })),
        );
    }

    ok(
        &req.id,
        json!({ "classId": class_id, "status": status.as_str() }),
    )
}

fn handle_classes_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };
    let draft = match parse_draft(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let save_as_draft = req
        .params
        .get("saveAsDraft")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    match class_exists(conn, &class_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "class not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    if !save_as_draft {
        let field_errors = wizard::validate_all_steps(&draft);
        if !field_errors.is_empty() {
            return err(
                &req.id,
                "validation_failed",
                "class draft is incomplete",
                Some(json!({ "fieldErrors": field_errors })),
            );
        }
        if let Err(resp) = check_conflicts(conn, req, &draft, Some(&class_id)) {
            return resp;
        }
    }

    let status = if save_as_draft {
        ClassStatus::Draft
    } else {
        ClassStatus::Active
    };
    let board_category = draft
        .board_category
        .unwrap_or(crate::model::BoardCategory::Central);

    // Room, teacher and the rest of the class land in one statement, so a
    // failed save can never leave a partially applied assignment behind.
    if let Err(e) = conn.execute(
        "UPDATE classes SET academic_year = ?, grade = ?, section = ?, board_category = ?,
                            board_state = ?, board_name = ?, room_id = ?, class_teacher_id = ?,
                            co_teacher_id = ?, status = ?, capacity = ?, updated_at = ?
         WHERE id = ?",
        (
            &draft.academic_year,
            &draft.grade,
            &draft.section,
            board_category.as_str(),
            &draft.board_state,
            &draft.board_name,
            &draft.room_id,
            &draft.class_teacher_id,
            &draft.co_teacher_id,
            status.as_str(),
            draft.capacity.unwrap_or(0),
            now(),
            &class_id,
        ),
    ) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }

    ok(
        &req.id,
        json!({ "classId": class_id, "status": status.as_str() }),
    )
}

fn handle_classes_archive(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };

    let updated = match conn.execute(
        "UPDATE classes SET status = 'archived', updated_at = ? WHERE id = ?",
        (now(), &class_id),
    ) {
        Ok(n) => n,
        Err(e) => return err(&req.id, "db_update_failed", e.to_string(), None),
    };
    if updated == 0 {
        return err(&req.id, "not_found", "class not found", None);
    }

    ok(&req.id, json!({ "classId": class_id, "status": "archived" }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };

    match class_exists(conn, &class_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "class not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    // Unconditional: no usage check on dependents, unlike subjects.delete.
    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };
    if let Err(e) = tx.execute("DELETE FROM curriculum_rows WHERE class_id = ?", [&class_id]) {
        let _ = tx.rollback();
        return err(&req.id, "db_delete_failed", e.to_string(), None);
    }
    if let Err(e) = tx.execute("DELETE FROM classes WHERE id = ?", [&class_id]) {
        let _ = tx.rollback();
        return err(&req.id, "db_delete_failed", e.to_string(), None);
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_tx_failed", e.to_string(), None);
    }

    ok(&req.id, json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.get" => Some(handle_classes_get(state, req)),
        "classes.validateStep" => Some(handle_validate_step(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.update" => Some(handle_classes_update(state, req)),
        "classes.archive" => Some(handle_classes_archive(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
