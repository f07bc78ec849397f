use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn create_class(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    section: &str,
    room_id: Option<&str>,
    teacher_id: Option<&str>,
) -> String {
    let result = request_ok(
        stdin,
        reader,
        id,
        "classes.create",
        json!({
            "draft": {
                "academicYear": "2026-27",
                "grade": "6",
                "section": section,
                "boardCategory": "central",
                "roomId": room_id,
                "classTeacherId": teacher_id,
                "assignTeacherLater": teacher_id.is_none(),
                "capacity": 40
            }
        }),
    );
    result
        .get("classId")
        .and_then(|v| v.as_str())
        .expect("classId")
        .to_string()
}

#[test]
fn second_active_class_cannot_take_an_occupied_room() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({}));

    let _a = create_class(
        &mut stdin,
        &mut reader,
        "2",
        "A",
        Some("room-a101"),
        Some("tch-sharma"),
    );

    let blocked = request(
        &mut stdin,
        &mut reader,
        "3",
        "classes.create",
        json!({
            "draft": {
                "academicYear": "2026-27",
                "grade": "6",
                "section": "B",
                "roomId": "room-a101",
                "assignTeacherLater": true
            }
        }),
    );
    assert_eq!(blocked["ok"], json!(false));
    assert_eq!(blocked["error"]["code"], json!("conflict"));
    assert_eq!(blocked["error"]["details"]["kind"], json!("room"));
    let message = blocked["error"]["message"].as_str().expect("message");
    assert!(message.contains("Grade 6 - A"), "{}", message);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn room_options_reflect_occupancy_maintenance_and_self_exclusion() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({}));

    let class_a = create_class(
        &mut stdin,
        &mut reader,
        "2",
        "A",
        Some("room-a101"),
        Some("tch-sharma"),
    );

    let options = request_ok(&mut stdin, &mut reader, "3", "rooms.options", json!({}));
    let find = |id: &str| -> serde_json::Value {
        options["options"]
            .as_array()
            .expect("options array")
            .iter()
            .find(|o| o["roomId"] == json!(id))
            .cloned()
            .unwrap_or_else(|| panic!("room {id} missing"))
    };
    assert_eq!(find("room-a101")["selectable"], json!(false));
    assert_eq!(find("room-a102")["selectable"], json!(true));
    // Maintenance blocks selection even without a holder.
    assert_eq!(find("room-b102")["selectable"], json!(false));
    assert_eq!(find("room-b102")["underMaintenance"], json!(true));

    // Editing class A: its own room is not a conflict against itself.
    let own = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "rooms.options",
        json!({ "classId": class_a }),
    );
    let a101 = own["options"]
        .as_array()
        .expect("options array")
        .iter()
        .find(|o| o["roomId"] == json!("room-a101"))
        .expect("room-a101");
    assert_eq!(a101["selectable"], json!(true));

    let rooms = request_ok(&mut stdin, &mut reader, "5", "rooms.list", json!({}));
    let a101_view = rooms["rooms"]
        .as_array()
        .expect("rooms array")
        .iter()
        .find(|r| r["id"] == json!("room-a101"))
        .expect("room-a101");
    assert_eq!(a101_view["effectiveStatus"], json!("assigned"));
    assert_eq!(a101_view["assignedClassLabel"], json!("Grade 6 - A"));

    // Archiving the holder releases the room; only Active classes occupy.
    let archived = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "classes.archive",
        json!({ "classId": class_a }),
    );
    assert_eq!(archived["status"], json!("archived"));
    let rooms = request_ok(&mut stdin, &mut reader, "7", "rooms.list", json!({}));
    let a101_after = rooms["rooms"]
        .as_array()
        .expect("rooms array")
        .iter()
        .find(|r| r["id"] == json!("room-a101"))
        .expect("room-a101");
    assert_eq!(a101_after["effectiveStatus"], json!("available"));
    assert_eq!(a101_after["assignedClassLabel"], json!(null));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn teacher_at_cap_blocks_new_classes_but_keeps_existing_selection() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({}));

    let _a = create_class(&mut stdin, &mut reader, "2", "A", None, Some("tch-iyer"));
    let _b = create_class(&mut stdin, &mut reader, "3", "B", None, Some("tch-iyer"));
    let class_c = create_class(&mut stdin, &mut reader, "4", "C", None, Some("tch-iyer"));

    let teachers = request_ok(&mut stdin, &mut reader, "5", "teachers.list", json!({}));
    let iyer = teachers["teachers"]
        .as_array()
        .expect("teachers array")
        .iter()
        .find(|t| t["id"] == json!("tch-iyer"))
        .expect("tch-iyer");
    assert_eq!(iyer["load"], json!("overloaded"));
    assert_eq!(iyer["leadsClasses"].as_array().map(|a| a.len()), Some(3));

    // A fourth different class may not take them.
    let blocked = request(
        &mut stdin,
        &mut reader,
        "6",
        "classes.create",
        json!({
            "draft": {
                "academicYear": "2026-27",
                "grade": "6",
                "section": "D",
                "classTeacherId": "tch-iyer"
            }
        }),
    );
    assert_eq!(blocked["ok"], json!(false));
    assert_eq!(blocked["error"]["code"], json!("conflict"));
    assert_eq!(blocked["error"]["details"]["kind"], json!("teacher"));

    // Options for a brand-new class agree with the hard check.
    let options = request_ok(&mut stdin, &mut reader, "7", "teachers.options", json!({}));
    let iyer_option = options["options"]
        .as_array()
        .expect("options array")
        .iter()
        .find(|o| o["teacherId"] == json!("tch-iyer"))
        .expect("tch-iyer option");
    assert_eq!(iyer_option["selectable"], json!(false));
    assert_eq!(iyer_option["load"], json!("overloaded"));

    // But on one of their existing classes the teacher stays selectable.
    let own_options = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "teachers.options",
        json!({ "classId": class_c }),
    );
    let iyer_own = own_options["options"]
        .as_array()
        .expect("options array")
        .iter()
        .find(|o| o["teacherId"] == json!("tch-iyer"))
        .expect("tch-iyer option");
    assert_eq!(iyer_own["selectable"], json!(true));

    // Re-saving class C with the same teacher is allowed at the cap.
    let resaved = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "classes.update",
        json!({
            "classId": class_c,
            "draft": {
                "academicYear": "2026-27",
                "grade": "6",
                "section": "C",
                "classTeacherId": "tch-iyer",
                "capacity": 40
            }
        }),
    );
    assert_eq!(resaved["status"], json!("active"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn wizard_step_gates_and_draft_bypass() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(&mut stdin, &mut reader, "1", "session.open", json!({}));

    let missing_section = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.validateStep",
        json!({
            "step": "basic_info",
            "draft": { "grade": "6", "section": "" }
        }),
    );
    assert_eq!(missing_section["valid"], json!(false));
    assert_eq!(
        missing_section["fieldErrors"][0]["field"],
        json!("section")
    );

    let state_board = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "classes.validateStep",
        json!({
            "step": "basic_info",
            "draft": { "grade": "6", "section": "A", "boardCategory": "state_board" }
        }),
    );
    assert_eq!(state_board["valid"], json!(false));
    let fields: Vec<&str> = state_board["fieldErrors"]
        .as_array()
        .expect("fieldErrors")
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["boardState", "boardName"]);

    let assign_later = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "classes.validateStep",
        json!({
            "step": "teacher_assignment",
            "draft": { "assignTeacherLater": true }
        }),
    );
    assert_eq!(assign_later["valid"], json!(true));

    // A non-draft save of the same incomplete payload is refused...
    let refused = request(
        &mut stdin,
        &mut reader,
        "5",
        "classes.create",
        json!({ "draft": { "grade": "6" } }),
    );
    assert_eq!(refused["ok"], json!(false));
    assert_eq!(refused["error"]["code"], json!("validation_failed"));

    // ...while save-as-draft bypasses every gate and forces Draft status.
    let drafted = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "classes.create",
        json!({ "saveAsDraft": true, "draft": { "grade": "6" } }),
    );
    assert_eq!(drafted["status"], json!("draft"));

    drop(stdin);
    let _ = child.wait();
}
