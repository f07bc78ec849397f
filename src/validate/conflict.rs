use super::Conflict;
use crate::model::{ClassSection, ClassStatus, TeacherLoad};

/// Policy cap on simultaneous Active class-teacher assignments.
pub const CLASS_TEACHER_CAP: usize = 3;

/// At most one Active class may hold a room. Any other Active class already
/// referencing the candidate room is a conflict, named in the message.
pub fn check_room_conflict(
    candidate_room_id: &str,
    classes: &[ClassSection],
    exclude_class_id: Option<&str>,
) -> Option<Conflict> {
    classes
        .iter()
        .find(|c| {
            c.status == ClassStatus::Active
                && c.room_id.as_deref() == Some(candidate_room_id)
                && Some(c.id.as_str()) != exclude_class_id
        })
        .map(|c| Conflict {
            with_class_id: c.id.clone(),
            with_class_label: c.label(),
            message: format!("Room is already assigned to {}", c.label()),
            blocks_selection: true,
        })
}

/// Number of Active classes led by the teacher. The class being edited is
/// deliberately NOT excluded here; the cap counts every active assignment.
pub fn active_lead_count(teacher_id: &str, classes: &[ClassSection]) -> usize {
    classes
        .iter()
        .filter(|c| {
            c.status == ClassStatus::Active && c.class_teacher_id.as_deref() == Some(teacher_id)
        })
        .count()
}

pub fn classify_teacher_load(teacher_id: &str, classes: &[ClassSection]) -> TeacherLoad {
    match active_lead_count(teacher_id, classes) {
        0 => TeacherLoad::Available,
        n if n < CLASS_TEACHER_CAP => TeacherLoad::Busy,
        _ => TeacherLoad::Overloaded,
    }
}

/// Workload cap check for selecting a class teacher. The count includes the
/// edited class's own assignment, but a teacher already selected on the
/// edited class is never blocked by it: a teacher at the cap stays pickable
/// on their existing class while new over-assignment elsewhere is refused.
pub fn check_teacher_conflict(
    candidate_teacher_id: &str,
    classes: &[ClassSection],
    exclude_class_id: Option<&str>,
) -> Option<Conflict> {
    let count = active_lead_count(candidate_teacher_id, classes);
    if count < CLASS_TEACHER_CAP {
        return None;
    }

    if let Some(exclude_id) = exclude_class_id {
        let already_selected = classes.iter().any(|c| {
            c.id == exclude_id && c.class_teacher_id.as_deref() == Some(candidate_teacher_id)
        });
        if already_selected {
            return None;
        }
    }

    let led = classes.iter().find(|c| {
        c.status == ClassStatus::Active
            && c.class_teacher_id.as_deref() == Some(candidate_teacher_id)
    })?;

    Some(Conflict {
        with_class_id: led.id.clone(),
        with_class_label: led.label(),
        message: format!(
            "Teacher is already class teacher of {} active classes (including {})",
            count,
            led.label()
        ),
        blocks_selection: true,
    })
}
