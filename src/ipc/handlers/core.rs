use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "sessionOpen": state.db.is_some()
        }),
    )
}

/// Creates the in-memory session store and seeds the static lookups.
/// Re-opening discards the previous session.
fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    match db::open_session() {
        Ok(conn) => {
            let counts = |table: &str| -> i64 {
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
                    .unwrap_or(0)
            };
            let result = json!({
                "rooms": counts("rooms"),
                "teachers": counts("teachers"),
                "subjects": counts("subjects"),
                "gradingScales": counts("grading_scales"),
            });
            state.db = Some(conn);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "session_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.open" => Some(handle_session_open(state, req)),
        _ => None,
    }
}
