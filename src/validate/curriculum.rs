use super::{MappingReport, RowError};
use crate::model::{CurriculumSubjectConfig, SubjectType};
use std::collections::BTreeMap;

/// Default pass marks for a marks total: 33%, rounded up.
pub fn default_pass_marks(total_max_marks: i64) -> i64 {
    (0.33 * total_max_marks as f64).ceil() as i64
}

/// Applies a raw-marks edit: stores the components, recomputes the total
/// and resets pass marks to the 33% default. This is the ONLY path that
/// re-derives pass marks; a manual override set afterwards is kept until
/// the next raw-marks edit.
pub fn apply_marks_edit(
    row: &mut CurriculumSubjectConfig,
    theory: i64,
    practical: i64,
    ia: i64,
) {
    row.max_theory_marks = theory;
    row.max_practical_marks = practical;
    row.max_ia_marks = ia;
    row.total_max_marks = theory + practical + ia;
    row.pass_marks = default_pass_marks(row.total_max_marks);
}

/// Validates a class's full curriculum row set. Per-row checks accumulate
/// into the report keyed by row id; set-level checks may attach errors to
/// several rows (duplicate display order) or to the class as a whole
/// (no core subject). The total is recomputed from the components rather
/// than trusted from the row.
pub fn validate_mapping(rows: &[CurriculumSubjectConfig]) -> MappingReport {
    let mut report = MappingReport::default();

    for row in rows {
        let total = row.max_theory_marks + row.max_practical_marks + row.max_ia_marks;
        if total <= 0 {
            report.push_row_error(
                row.id.as_str(),
                RowError::new("invalid_marks_config", "Invalid Marks Config"),
            );
            report.push_row_error(
                row.id.as_str(),
                RowError::new("invalid_total", "Total marks must be greater than 0"),
            );
        }
        if row.teaching_hours_per_week <= 0 {
            report.push_row_error(
                row.id.as_str(),
                RowError::new(
                    "invalid_hours",
                    "Teaching hours per week must be greater than 0",
                ),
            );
        }
        if row.subject_type == SubjectType::Theory && row.is_optional {
            report.push_row_error(
                row.id.as_str(),
                RowError::new("core_optional", "Core subject cannot be optional"),
            );
        }
    }

    let mut by_order: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
    for row in rows {
        by_order.entry(row.display_order).or_default().push(&row.id);
    }
    for (order, ids) in &by_order {
        if ids.len() < 2 {
            continue;
        }
        for id in ids {
            report.push_row_error(
                id,
                RowError::new("duplicate_order", format!("Duplicate order {}", order)),
            );
        }
    }

    // Set-level invariant with no owning row. Fires on an empty row set
    // too, matching the source's all-rows-optional check.
    if rows.iter().all(|r| r.is_optional) {
        report
            .class_errors
            .push("At least one core subject is required".to_string());
    }

    report.is_valid = report.row_errors.is_empty() && report.class_errors.is_empty();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, subject_type: SubjectType) -> CurriculumSubjectConfig {
        CurriculumSubjectConfig {
            id: id.to_string(),
            class_id: "cls-1".to_string(),
            subject_id: format!("sub-{id}"),
            subject_name: id.to_uppercase(),
            subject_type,
            display_order: 1,
            is_optional: false,
            max_theory_marks: 80,
            max_practical_marks: 0,
            max_ia_marks: 20,
            total_max_marks: 100,
            pass_marks: 33,
            teaching_hours_per_week: 5,
        }
    }

    #[test]
    fn pass_marks_default_rounds_up_from_33_percent() {
        assert_eq!(default_pass_marks(80), 27);
        assert_eq!(default_pass_marks(50), 17);
        assert_eq!(default_pass_marks(0), 0);
    }

    #[test]
    fn marks_edit_recomputes_total_and_resets_pass_marks() {
        let mut r = row("math", SubjectType::Theory);
        r.pass_marks = 50; // manual override
        apply_marks_edit(&mut r, 80, 0, 0);
        assert_eq!(r.total_max_marks, 80);
        assert_eq!(r.pass_marks, 27);
    }

    #[test]
    fn zero_total_row_gets_generic_marker_and_total_error() {
        let mut r = row("art", SubjectType::CoScholastic);
        r.max_theory_marks = 0;
        r.max_ia_marks = 0;
        let report = validate_mapping(&[r]);
        assert!(!report.is_valid);
        let errors = &report.row_errors["art"];
        assert!(errors.iter().any(|e| e.code == "invalid_marks_config"));
        assert!(errors.iter().any(|e| e.code == "invalid_total"));
    }

    #[test]
    fn stored_total_is_not_trusted() {
        // Components say 0 even though the stored total claims 100.
        let mut r = row("art", SubjectType::CoScholastic);
        r.max_theory_marks = 0;
        r.max_ia_marks = 0;
        r.total_max_marks = 100;
        let report = validate_mapping(&[r]);
        assert!(!report.is_valid);
    }

    #[test]
    fn zero_hours_row_is_rejected() {
        let mut r = row("math", SubjectType::Theory);
        r.teaching_hours_per_week = 0;
        let report = validate_mapping(&[r]);
        assert!(report.row_errors["math"]
            .iter()
            .any(|e| e.code == "invalid_hours"));
    }

    #[test]
    fn theory_row_may_not_be_optional() {
        let mut r = row("math", SubjectType::Theory);
        r.is_optional = true;
        r.display_order = 99;
        r.max_theory_marks = 0;
        r.max_ia_marks = 0;
        let report = validate_mapping(&[r]);
        // Fires regardless of what else is wrong with the row.
        assert!(report.row_errors["math"]
            .iter()
            .any(|e| e.code == "core_optional"));
    }

    #[test]
    fn duplicate_display_order_marks_every_sharing_row() {
        let a = row("a", SubjectType::Theory);
        let b = row("b", SubjectType::Language);
        let mut c = row("c", SubjectType::Elective);
        c.display_order = 2;
        let report = validate_mapping(&[a, b, c]);
        assert!(!report.is_valid);
        assert!(report.row_errors["a"].iter().any(|e| e.code == "duplicate_order"));
        assert!(report.row_errors["b"].iter().any(|e| e.code == "duplicate_order"));
        assert!(!report.row_errors.contains_key("c"));
    }

    #[test]
    fn all_optional_rows_fail_at_class_level() {
        let mut a = row("a", SubjectType::Elective);
        a.is_optional = true;
        let mut b = row("b", SubjectType::CoScholastic);
        b.is_optional = true;
        b.display_order = 2;
        let report = validate_mapping(&[a, b]);
        assert!(!report.is_valid);
        assert_eq!(
            report.class_errors,
            vec!["At least one core subject is required".to_string()]
        );
        // Per-row marks were fine; no row owns this failure.
        assert!(report.row_errors.is_empty());
    }

    #[test]
    fn valid_row_set_passes() {
        let a = row("a", SubjectType::Theory);
        let mut b = row("b", SubjectType::Practical);
        b.display_order = 2;
        let report = validate_mapping(&[a, b]);
        assert!(report.is_valid);
        assert!(report.row_errors.is_empty());
        assert!(report.class_errors.is_empty());
    }
}
