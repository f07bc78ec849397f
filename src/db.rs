use crate::model::{
    ClassSection, ClassStatus, CurriculumSubjectConfig, GradeBand, GradingScale, Room, RoomStatus,
    ScaleType, SubjectMaster, SubjectType, Teacher,
};
use anyhow::{anyhow, Context};
use rusqlite::Connection;

/// Opens a fresh in-memory session store and seeds the static lookups the
/// console starts from. Nothing here is durable; the session lives as long
/// as the sidecar process.
pub fn open_session() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE rooms(
            id TEXT PRIMARY KEY,
            block TEXT NOT NULL,
            floor INTEGER NOT NULL,
            room_no TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            status TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE teachers(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            department TEXT NOT NULL,
            is_class_teacher INTEGER NOT NULL
        )",
        [],
    )?;

    // No assigned-class column on rooms or teachers: the authoritative link
    // lives on classes, and occupancy/load are computed views over it.
    conn.execute(
        "CREATE TABLE classes(
            id TEXT PRIMARY KEY,
            academic_year TEXT NOT NULL,
            grade TEXT NOT NULL,
            section TEXT NOT NULL,
            board_category TEXT NOT NULL,
            board_state TEXT,
            board_name TEXT,
            room_id TEXT REFERENCES rooms(id),
            class_teacher_id TEXT REFERENCES teachers(id),
            co_teacher_id TEXT REFERENCES teachers(id),
            status TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            enrollment INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute("CREATE INDEX idx_classes_room ON classes(room_id)", [])?;
    conn.execute(
        "CREATE INDEX idx_classes_teacher ON classes(class_teacher_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE subjects(
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            subject_type TEXT NOT NULL,
            boards TEXT NOT NULL,
            grades TEXT NOT NULL,
            status TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE grading_scales(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            board TEXT NOT NULL,
            scale_type TEXT NOT NULL,
            grade_levels TEXT NOT NULL,
            is_default INTEGER NOT NULL,
            status TEXT NOT NULL,
            grade_bands TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE curriculum_rows(
            id TEXT PRIMARY KEY,
            class_id TEXT NOT NULL REFERENCES classes(id),
            subject_id TEXT NOT NULL REFERENCES subjects(id),
            display_order INTEGER NOT NULL,
            is_optional INTEGER NOT NULL,
            theory_marks INTEGER NOT NULL DEFAULT 0,
            practical_marks INTEGER NOT NULL DEFAULT 0,
            ia_marks INTEGER NOT NULL DEFAULT 0,
            total_marks INTEGER NOT NULL DEFAULT 0,
            pass_marks INTEGER NOT NULL DEFAULT 0,
            hours_per_week INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT,
            UNIQUE(class_id, subject_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX idx_curriculum_class ON curriculum_rows(class_id)",
        [],
    )?;

    seed(&conn)?;
    Ok(conn)
}

/// Static lookups the console ships with. Fixed ids so tests and the UI
/// can reference seeded entities deterministically.
fn seed(conn: &Connection) -> anyhow::Result<()> {
    let rooms: [(&str, &str, i64, &str, i64, &str); 5] = [
        ("room-a101", "A", 1, "101", 40, "available"),
        ("room-a102", "A", 1, "102", 40, "available"),
        ("room-a201", "A", 2, "201", 35, "available"),
        ("room-b101", "B", 1, "101", 45, "available"),
        ("room-b102", "B", 1, "102", 30, "maintenance"),
    ];
    for (id, block, floor, room_no, capacity, status) in rooms {
        conn.execute(
            "INSERT INTO rooms(id, block, floor, room_no, capacity, status) VALUES(?, ?, ?, ?, ?, ?)",
            (id, block, floor, room_no, capacity, status),
        )?;
    }

    let teachers: [(&str, &str, &str, i64); 6] = [
        ("tch-sharma", "R. Sharma", "Mathematics", 1),
        ("tch-iyer", "K. Iyer", "Science", 1),
        ("tch-verma", "S. Verma", "English", 1),
        ("tch-khan", "A. Khan", "Social Science", 1),
        ("tch-rao", "P. Rao", "Computer Science", 0),
        ("tch-nair", "M. Nair", "Arts", 0),
    ];
    for (id, name, department, is_class_teacher) in teachers {
        conn.execute(
            "INSERT INTO teachers(id, name, department, is_class_teacher) VALUES(?, ?, ?, ?)",
            (id, name, department, is_class_teacher),
        )?;
    }

    let subjects: [(&str, &str, &str, &str); 6] = [
        ("sub-math", "MATH101", "Mathematics", "theory"),
        ("sub-sci", "SCI101", "Science", "theory"),
        ("sub-eng", "ENG101", "English", "language"),
        ("sub-sci-pr", "SCI1PR", "Science Practical", "practical"),
        ("sub-cs", "CS101", "Computer Science", "elective"),
        ("sub-art", "ART101", "Art & Craft", "co_scholastic"),
    ];
    let boards = serde_json::to_string(&["central", "state_board"])?;
    let grades = serde_json::to_string(&["6", "7", "8", "9", "10"])?;
    for (id, code, name, subject_type) in subjects {
        conn.execute(
            "INSERT INTO subjects(id, code, name, subject_type, boards, grades, status)
             VALUES(?, ?, ?, ?, ?, ?, 'active')",
            (id, code, name, subject_type, &boards, &grades),
        )?;
    }

    let default_bands = [
        ("A1", 91.0, 100.0),
        ("A2", 81.0, 90.0),
        ("B1", 71.0, 80.0),
        ("B2", 61.0, 70.0),
        ("C1", 51.0, 60.0),
        ("C2", 41.0, 50.0),
        ("D", 33.0, 40.0),
        ("E", 0.0, 32.0),
    ];
    let bands: Vec<GradeBand> = default_bands
        .iter()
        .map(|(grade, min, max)| GradeBand {
            grade: grade.to_string(),
            min_value: *min,
            max_value: *max,
            points: None,
            remarks: None,
        })
        .collect();
    conn.execute(
        "INSERT INTO grading_scales(id, name, board, scale_type, grade_levels, is_default, status, grade_bands)
         VALUES(?, ?, ?, ?, ?, 1, 'active', ?)",
        (
            "scale-standard",
            "Standard Percentage Scale",
            "central",
            "percentage",
            &grades,
            serde_json::to_string(&bands)?,
        ),
    )?;

    Ok(())
}

type ClassRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    i64,
    i64,
);

pub fn load_classes(conn: &Connection) -> anyhow::Result<Vec<ClassSection>> {
    let mut stmt = conn.prepare(
        "SELECT id, academic_year, grade, section, board_category, board_state, board_name,
                room_id, class_teacher_id, co_teacher_id, status, capacity, enrollment
         FROM classes
         ORDER BY grade, section",
    )?;
    let raw: Vec<ClassRow> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
                row.get(11)?,
                row.get(12)?,
            ))
        })?
        .collect::<Result<_, _>>()?;

    raw.into_iter()
        .map(
            |(
                id,
                academic_year,
                grade,
                section,
                board_category,
                board_state,
                board_name,
                room_id,
                class_teacher_id,
                co_teacher_id,
                status,
                capacity,
                enrollment,
            )| {
                Ok(ClassSection {
                    id,
                    academic_year,
                    grade,
                    section,
                    board_category: crate::model::BoardCategory::parse(&board_category)
                        .ok_or_else(|| anyhow!("unknown board category: {board_category}"))?,
                    board_state,
                    board_name,
                    room_id,
                    class_teacher_id,
                    co_teacher_id,
                    status: ClassStatus::parse(&status)
                        .ok_or_else(|| anyhow!("unknown class status: {status}"))?,
                    capacity,
                    enrollment,
                })
            },
        )
        .collect()
}

pub fn load_rooms(conn: &Connection) -> anyhow::Result<Vec<Room>> {
    let mut stmt = conn.prepare(
        "SELECT id, block, floor, room_no, capacity, status FROM rooms ORDER BY block, room_no",
    )?;
    let raw: Vec<(String, String, i64, String, i64, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?
        .collect::<Result<_, _>>()?;

    raw.into_iter()
        .map(|(id, block, floor, room_no, capacity, status)| {
            Ok(Room {
                id,
                block,
                floor,
                room_no,
                capacity,
                status: RoomStatus::parse(&status)
                    .ok_or_else(|| anyhow!("unknown room status: {status}"))?,
            })
        })
        .collect()
}

pub fn load_teachers(conn: &Connection) -> anyhow::Result<Vec<Teacher>> {
    let mut stmt =
        conn.prepare("SELECT id, name, department, is_class_teacher FROM teachers ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Teacher {
                id: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                is_class_teacher: row.get::<_, i64>(3)? != 0,
            })
        })?
        .collect::<Result<_, _>>()?;
    Ok(rows)
}

pub fn load_subjects(conn: &Connection) -> anyhow::Result<Vec<SubjectMaster>> {
    let mut stmt = conn.prepare(
        "SELECT id, code, name, subject_type, boards, grades, status FROM subjects ORDER BY code",
    )?;
    let raw: Vec<(String, String, String, String, String, String, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?
        .collect::<Result<_, _>>()?;

    raw.into_iter()
        .map(|(id, code, name, subject_type, boards, grades, status)| {
            Ok(SubjectMaster {
                id,
                code,
                name,
                subject_type: SubjectType::parse(&subject_type)
                    .ok_or_else(|| anyhow!("unknown subject type: {subject_type}"))?,
                boards: serde_json::from_str(&boards).context("subject boards")?,
                grades: serde_json::from_str(&grades).context("subject grades")?,
                status,
            })
        })
        .collect()
}

pub fn load_scales(conn: &Connection) -> anyhow::Result<Vec<GradingScale>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, board, scale_type, grade_levels, is_default, status, grade_bands
         FROM grading_scales
         ORDER BY name",
    )?;
    let raw: Vec<(String, String, String, String, String, i64, String, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
            ))
        })?
        .collect::<Result<_, _>>()?;

    raw.into_iter()
        .map(
            |(id, name, board, scale_type, grade_levels, is_default, status, bands)| {
                Ok(GradingScale {
                    id,
                    name,
                    board,
                    scale_type: ScaleType::parse(&scale_type)
                        .ok_or_else(|| anyhow!("unknown scale type: {scale_type}"))?,
                    grade_levels: serde_json::from_str(&grade_levels).context("grade levels")?,
                    is_default: is_default != 0,
                    status,
                    grade_bands: serde_json::from_str(&bands).context("grade bands")?,
                })
            },
        )
        .collect()
}

type CurriculumRow = (
    String,
    String,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
);

/// Curriculum rows for a class, joined with the subject master for the
/// name and type the validator needs.
pub fn load_curriculum_rows(
    conn: &Connection,
    class_id: &str,
) -> anyhow::Result<Vec<CurriculumSubjectConfig>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.class_id, r.subject_id, s.name, s.subject_type,
                r.display_order, r.is_optional,
                r.theory_marks, r.practical_marks, r.ia_marks,
                r.total_marks, r.pass_marks, r.hours_per_week
         FROM curriculum_rows r
         JOIN subjects s ON s.id = r.subject_id
         WHERE r.class_id = ?
         ORDER BY r.display_order",
    )?;
    let raw: Vec<CurriculumRow> = stmt
        .query_map([class_id], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
                row.get(11)?,
                row.get(12)?,
            ))
        })?
        .collect::<Result<_, _>>()?;

    raw.into_iter()
        .map(
            |(
                id,
                class_id,
                subject_id,
                subject_name,
                subject_type,
                display_order,
                is_optional,
                theory,
                practical,
                ia,
                total,
                pass,
                hours,
            )| {
                Ok(CurriculumSubjectConfig {
                    id,
                    class_id,
                    subject_id,
                    subject_name,
                    subject_type: SubjectType::parse(&subject_type)
                        .ok_or_else(|| anyhow!("unknown subject type: {subject_type}"))?,
                    display_order,
                    is_optional: is_optional != 0,
                    max_theory_marks: theory,
                    max_practical_marks: practical,
                    max_ia_marks: ia,
                    total_max_marks: total,
                    pass_marks: pass,
                    teaching_hours_per_week: hours,
                })
            },
        )
        .collect()
}
