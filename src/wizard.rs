use crate::model::BoardCategory;
use serde::{Deserialize, Serialize};

/// Linear steps of the class creation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassWizardStep {
    BasicInfo,
    RoomAssignment,
    TeacherAssignment,
    CapacitySettings,
    CustomFields,
}

impl ClassWizardStep {
    pub const ALL: [ClassWizardStep; 5] = [
        Self::BasicInfo,
        Self::RoomAssignment,
        Self::TeacherAssignment,
        Self::CapacitySettings,
        Self::CustomFields,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basic_info" => Some(Self::BasicInfo),
            "room_assignment" => Some(Self::RoomAssignment),
            "teacher_assignment" => Some(Self::TeacherAssignment),
            "capacity_settings" => Some(Self::CapacitySettings),
            "custom_fields" => Some(Self::CustomFields),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BasicInfo => "basic_info",
            Self::RoomAssignment => "room_assignment",
            Self::TeacherAssignment => "teacher_assignment",
            Self::CapacitySettings => "capacity_settings",
            Self::CustomFields => "custom_fields",
        }
    }
}

/// Linear steps of the subject mapping wizard. None of these gate a
/// forward transition; the full row set is validated once at final save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingWizardStep {
    TermStructure,
    SelectSubjects,
    ConfigureRules,
    Review,
}

impl MappingWizardStep {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "term_structure" => Some(Self::TermStructure),
            "select_subjects" => Some(Self::SelectSubjects),
            "configure_rules" => Some(Self::ConfigureRules),
            "review" => Some(Self::Review),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TermStructure => "term_structure",
            Self::SelectSubjects => "select_subjects",
            Self::ConfigureRules => "configure_rules",
            Self::Review => "review",
        }
    }
}

/// Accumulated form state for a class being created or edited.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassDraft {
    pub academic_year: String,
    pub grade: String,
    pub section: String,
    pub board_category: Option<BoardCategory>,
    pub board_state: Option<String>,
    pub board_name: Option<String>,
    pub room_id: Option<String>,
    pub class_teacher_id: Option<String>,
    pub co_teacher_id: Option<String>,
    pub assign_teacher_later: bool,
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn missing(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn blank_opt(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Gate for a forward transition out of a step. Only BasicInfo and
/// TeacherAssignment block; the other steps always pass. "Save as Draft"
/// bypasses these gates entirely (handled by the caller).
pub fn validate_step(step: ClassWizardStep, draft: &ClassDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match step {
        ClassWizardStep::BasicInfo => {
            if blank(&draft.grade) {
                errors.push(FieldError::missing("grade", "Grade is required"));
            }
            if blank(&draft.section) {
                errors.push(FieldError::missing("section", "Section is required"));
            }
            if draft.board_category == Some(BoardCategory::StateBoard) {
                if blank_opt(&draft.board_state) {
                    errors.push(FieldError::missing(
                        "boardState",
                        "State is required for a state board",
                    ));
                }
                if blank_opt(&draft.board_name) {
                    errors.push(FieldError::missing(
                        "boardName",
                        "Board name is required for a state board",
                    ));
                }
            }
        }
        ClassWizardStep::TeacherAssignment => {
            if draft.class_teacher_id.is_none() && !draft.assign_teacher_later {
                errors.push(FieldError::missing(
                    "classTeacherId",
                    "Select a class teacher or choose to assign later",
                ));
            }
        }
        ClassWizardStep::RoomAssignment
        | ClassWizardStep::CapacitySettings
        | ClassWizardStep::CustomFields => {}
    }
    errors
}

/// All step gates in wizard order, for a final (non-draft) save.
pub fn validate_all_steps(draft: &ClassDraft) -> Vec<FieldError> {
    ClassWizardStep::ALL
        .iter()
        .flat_map(|step| validate_step(*step, draft))
        .collect()
}
