use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::GradingScale;
use crate::validate::grading::validate_scale;
use serde_json::json;
use uuid::Uuid;

fn handle_scales_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    match db::load_scales(conn) {
        Ok(scales) => ok(&req.id, json!({ "scales": scales })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

/// Validates and upserts a grading scale. The persisted band order is the
/// validator's sorted output, never the submission order.
fn handle_scales_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let Some(raw) = req.params.get("scale") else {
        return err(&req.id, "bad_params", "missing params.scale", None);
    };

    let mut submitted = raw.clone();
    if !submitted.is_object() {
        return err(&req.id, "bad_params", "scale must be an object", None);
    }
    let is_new = submitted
        .get("id")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().is_empty())
        .unwrap_or(true);
    if is_new {
        submitted["id"] = json!(Uuid::new_v4().to_string());
    }

    let scale: GradingScale = match serde_json::from_value(submitted) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("bad scale: {e}"), None),
    };

    let validated = match validate_scale(scale) {
        Ok(v) => v,
        Err(reasons) => {
            return err(
                &req.id,
                "validation_failed",
                "grading scale is invalid",
                Some(json!({ "reasons": reasons })),
            )
        }
    };

    let bands = match serde_json::to_string(&validated.grade_bands) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "internal", e.to_string(), None),
    };
    let grade_levels = match serde_json::to_string(&validated.grade_levels) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "internal", e.to_string(), None),
    };

    if let Err(e) = conn.execute(
        "INSERT INTO grading_scales(id, name, board, scale_type, grade_levels, is_default, status, grade_bands)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             board = excluded.board,
             scale_type = excluded.scale_type,
             grade_levels = excluded.grade_levels,
             is_default = excluded.is_default,
             status = excluded.status,
             grade_bands = excluded.grade_bands",
        (
            &validated.id,
            &validated.name,
            &validated.board,
            validated.scale_type.as_str(),
            &grade_levels,
            validated.is_default as i64,
            &validated.status,
            &bands,
        ),
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "grading_scales" })),
        );
    }

    ok(&req.id, json!({ "scale": validated, "created": is_new }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grading.scales.list" => Some(handle_scales_list(state, req)),
        "grading.scales.save" => Some(handle_scales_save(state, req)),
        _ => None,
    }
}
