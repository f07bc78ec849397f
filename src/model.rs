use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    Draft,
    Active,
    Archived,
}

impl ClassStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

/// Stored room status. "Assigned" is never stored: occupancy is derived
/// from the classes that reference the room (see handlers::rooms_teachers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Maintenance,
}

impl RoomStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Maintenance => "maintenance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardCategory {
    Central,
    StateBoard,
    International,
}

impl BoardCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "central" => Some(Self::Central),
            "state_board" => Some(Self::StateBoard),
            "international" => Some(Self::International),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Central => "central",
            Self::StateBoard => "state_board",
            Self::International => "international",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    Percentage,
    Gpa,
    GradeOnly,
    DirectGrading,
}

impl ScaleType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "percentage" => Some(Self::Percentage),
            "gpa" => Some(Self::Gpa),
            "grade_only" => Some(Self::GradeOnly),
            "direct_grading" => Some(Self::DirectGrading),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Gpa => "gpa",
            Self::GradeOnly => "grade_only",
            Self::DirectGrading => "direct_grading",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Theory,
    Practical,
    Language,
    CoScholastic,
    Elective,
}

impl SubjectType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "theory" => Some(Self::Theory),
            "practical" => Some(Self::Practical),
            "language" => Some(Self::Language),
            "co_scholastic" => Some(Self::CoScholastic),
            "elective" => Some(Self::Elective),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Theory => "theory",
            Self::Practical => "practical",
            Self::Language => "language",
            Self::CoScholastic => "co_scholastic",
            Self::Elective => "elective",
        }
    }
}

/// Teacher workload classification surfaced next to selectable options
/// before the user picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherLoad {
    Available,
    Busy,
    Overloaded,
}

impl TeacherLoad {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Overloaded => "overloaded",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSection {
    pub id: String,
    pub academic_year: String,
    pub grade: String,
    pub section: String,
    pub board_category: BoardCategory,
    pub board_state: Option<String>,
    pub board_name: Option<String>,
    pub room_id: Option<String>,
    pub class_teacher_id: Option<String>,
    pub co_teacher_id: Option<String>,
    pub status: ClassStatus,
    pub capacity: i64,
    pub enrollment: i64,
}

impl ClassSection {
    /// Display label used in conflict messages and derived occupancy views.
    pub fn label(&self) -> String {
        format!("Grade {} - {}", self.grade, self.section)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub block: String,
    pub floor: i64,
    pub room_no: String,
    pub capacity: i64,
    pub status: RoomStatus,
}

impl Room {
    pub fn label(&self) -> String {
        format!("{}-{}", self.block, self.room_no)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub department: String,
    pub is_class_teacher: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub grade: String,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingScale {
    pub id: String,
    pub name: String,
    pub board: String,
    pub scale_type: ScaleType,
    #[serde(default)]
    pub grade_levels: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_active")]
    pub status: String,
    #[serde(default)]
    pub grade_bands: Vec<GradeBand>,
}

fn default_active() -> String {
    "active".to_string()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMaster {
    pub id: String,
    pub code: String,
    pub name: String,
    pub subject_type: SubjectType,
    pub boards: Vec<String>,
    pub grades: Vec<String>,
    pub status: String,
}

/// One row per (class, subject) pairing in the curriculum mapping.
/// `total_max_marks` and `pass_marks` are derived on raw-marks edits only;
/// `pass_marks` stays manually overridable in between.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumSubjectConfig {
    pub id: String,
    pub class_id: String,
    pub subject_id: String,
    pub subject_name: String,
    pub subject_type: SubjectType,
    pub display_order: i64,
    pub is_optional: bool,
    pub max_theory_marks: i64,
    pub max_practical_marks: i64,
    pub max_ia_marks: i64,
    pub total_max_marks: i64,
    pub pass_marks: i64,
    pub teaching_hours_per_week: i64,
}
