use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{ClassSection, ClassStatus, RoomStatus};
use crate::validate::conflict::{check_room_conflict, check_teacher_conflict, classify_teacher_load};
use serde_json::json;

/// Derived occupancy for a room: stored Maintenance wins, otherwise the
/// Active class holding it (if any) makes it "assigned". There is no stored
/// back-reference to fall out of sync.
fn room_view(room: &crate::model::Room, classes: &[ClassSection]) -> serde_json::Value {
    let holder = classes
        .iter()
        .find(|c| c.status == ClassStatus::Active && c.room_id.as_deref() == Some(room.id.as_str()));
    let effective = if room.status == RoomStatus::Maintenance {
        room.status.as_str()
    } else if holder.is_some() {
        "assigned"
    } else {
        "available"
    };

    let mut v = serde_json::to_value(room).unwrap_or_else(|_| json!({}));
    v["label"] = json!(room.label());
    v["effectiveStatus"] = json!(effective);
    v["assignedClassId"] = json!(holder.map(|c| c.id.clone()));
    v["assignedClassLabel"] = json!(holder.map(|c| c.label()));
    v
}

fn handle_rooms_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let (rooms, classes) = match (db::load_rooms(conn), db::load_classes(conn)) {
        (Ok(r), Ok(c)) => (r, c),
        (Err(e), _) | (_, Err(e)) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows: Vec<serde_json::Value> = rooms.iter().map(|r| room_view(r, &classes)).collect();
    ok(&req.id, json!({ "rooms": rows }))
}

/// Selectable-room annotation for the wizard's room step. `classId` is the
/// class being edited, if any; its own room never conflicts with itself.
fn handle_rooms_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let exclude = req.params.get("classId").and_then(|v| v.as_str());
    let (rooms, classes) = match (db::load_rooms(conn), db::load_classes(conn)) {
        (Ok(r), Ok(c)) => (r, c),
        (Err(e), _) | (_, Err(e)) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let options: Vec<serde_json::Value> = rooms
        .iter()
        .map(|room| {
            let conflict = check_room_conflict(&room.id, &classes, exclude);
            let under_maintenance = room.status == RoomStatus::Maintenance;
            let selectable = !under_maintenance
                && conflict.as_ref().map(|c| !c.blocks_selection).unwrap_or(true);
            json!({
                "roomId": room.id,
                "label": room.label(),
                "capacity": room.capacity,
                "underMaintenance": under_maintenance,
                "selectable": selectable,
                "conflict": conflict,
            })
        })
        .collect();

    ok(&req.id, json!({ "options": options }))
}

fn handle_teachers_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let (teachers, classes) = match (db::load_teachers(conn), db::load_classes(conn)) {
        (Ok(t), Ok(c)) => (t, c),
        (Err(e), _) | (_, Err(e)) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let rows: Vec<serde_json::Value> = teachers
        .iter()
        .map(|t| {
            let led: Vec<String> = classes
                .iter()
                .filter(|c| {
                    c.status == ClassStatus::Active
                        && c.class_teacher_id.as_deref() == Some(t.id.as_str())
                })
                .map(|c| c.label())
                .collect();
            let mut v = serde_json::to_value(t).unwrap_or_else(|_| json!({}));
            v["load"] = json!(classify_teacher_load(&t.id, &classes).as_str());
            v["leadsClasses"] = json!(led);
            v
        })
        .collect();

    ok(&req.id, json!({ "teachers": rows }))
}

/// Selectable-teacher annotation for the wizard's teacher step. A teacher
/// at the cap stays selectable on the class that already holds them.
fn handle_teachers_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let exclude = req.params.get("classId").and_then(|v| v.as_str());
    let (teachers, classes) = match (db::load_teachers(conn), db::load_classes(conn)) {
        (Ok(t), Ok(c)) => (t, c),
        (Err(e), _) | (_, Err(e)) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let options: Vec<serde_json::Value> = teachers
        .iter()
        .map(|teacher| {
            let conflict = check_teacher_conflict(&teacher.id, &classes, exclude);
            json!({
                "teacherId": teacher.id,
                "name": teacher.name,
                "department": teacher.department,
                "load": classify_teacher_load(&teacher.id, &classes).as_str(),
                "selectable": conflict.is_none(),
                "conflict": conflict,
            })
        })
        .collect();

    ok(&req.id, json!({ "options": options }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "rooms.list" => Some(handle_rooms_list(state, req)),
        "rooms.options" => Some(handle_rooms_options(state, req)),
        "teachers.list" => Some(handle_teachers_list(state, req)),
        "teachers.options" => Some(handle_teachers_options(state, req)),
        _ => None,
    }
}
