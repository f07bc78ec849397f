use crate::model::{GradeBand, GradingScale, ScaleType};

/// Validates a grading scale and, on success, returns it with its bands
/// replaced by the min-value-sorted list. The sort is part of the contract:
/// callers persist the sorted order, and gap semantics below are defined
/// against the sorted sequence.
///
/// Checks run in stages; a failing stage returns every reason it found and
/// later stages do not run. Overlapping bands are NOT rejected, matching
/// the source system (gaps only).
pub fn validate_scale(mut scale: GradingScale) -> Result<GradingScale, Vec<String>> {
    if scale.name.trim().is_empty() {
        return Err(vec!["Scale name is required".to_string()]);
    }

    let mut bands = std::mem::take(&mut scale.grade_bands);
    bands.sort_by(|a, b| a.min_value.total_cmp(&b.min_value));

    let mut reasons: Vec<String> = Vec::new();
    for band in &bands {
        if band.grade.trim().is_empty() {
            reasons.push("Every band needs a grade label".to_string());
            continue;
        }
        if band.min_value > band.max_value {
            reasons.push(format!(
                "Band '{}' has a minimum ({}) greater than its maximum ({})",
                band.grade, band.min_value, band.max_value
            ));
        }
    }
    if !reasons.is_empty() {
        return Err(reasons);
    }

    if scale.scale_type == ScaleType::Percentage {
        if let Err(coverage) = check_percentage_coverage(&bands) {
            return Err(coverage);
        }
    }

    scale.grade_bands = bands;
    Ok(scale)
}

/// Percentage scales must cover 0..100 with no gap wider than 1 unit
/// between adjacent sorted bands.
fn check_percentage_coverage(bands: &[GradeBand]) -> Result<(), Vec<String>> {
    let (first, last) = match (bands.first(), bands.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(vec!["A percentage scale needs at least one band".to_string()]),
    };

    let mut reasons: Vec<String> = Vec::new();
    if first.min_value != 0.0 {
        reasons.push(format!(
            "Scale must start at 0% (band '{}' starts at {})",
            first.grade, first.min_value
        ));
    }
    if last.max_value != 100.0 {
        reasons.push(format!(
            "Scale must end at 100% (band '{}' ends at {})",
            last.grade, last.max_value
        ));
    }
    for pair in bands.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.min_value > prev.max_value + 1.0 {
            reasons.push(format!(
                "Gap between '{}' (up to {}) and '{}' (from {})",
                prev.grade, prev.max_value, next.grade, next.min_value
            ));
        }
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(grade: &str, min: f64, max: f64) -> GradeBand {
        GradeBand {
            grade: grade.to_string(),
            min_value: min,
            max_value: max,
            points: None,
            remarks: None,
        }
    }

    fn percentage_scale(bands: Vec<GradeBand>) -> GradingScale {
        GradingScale {
            id: "gs-1".to_string(),
            name: "Standard Scale".to_string(),
            board: "cbse".to_string(),
            scale_type: ScaleType::Percentage,
            grade_levels: vec!["6".to_string()],
            is_default: false,
            status: "active".to_string(),
            grade_bands: bands,
        }
    }

    #[test]
    fn contiguous_percentage_bands_validate_and_stay_sorted() {
        let scale = percentage_scale(vec![
            band("E", 0.0, 32.0),
            band("D", 33.0, 40.0),
            band("A", 41.0, 100.0),
        ]);
        let out = validate_scale(scale).expect("valid scale");
        let grades: Vec<&str> = out.grade_bands.iter().map(|b| b.grade.as_str()).collect();
        assert_eq!(grades, vec!["E", "D", "A"]);
    }

    #[test]
    fn unsorted_input_comes_back_sorted_by_min_value() {
        let scale = percentage_scale(vec![
            band("A", 41.0, 100.0),
            band("E", 0.0, 32.0),
            band("D", 33.0, 40.0),
        ]);
        let out = validate_scale(scale).expect("valid scale");
        let mins: Vec<f64> = out.grade_bands.iter().map(|b| b.min_value).collect();
        assert_eq!(mins, vec![0.0, 33.0, 41.0]);
    }

    #[test]
    fn gap_wider_than_one_unit_is_rejected_naming_both_grades() {
        let scale = percentage_scale(vec![band("E", 0.0, 32.0), band("A", 40.0, 100.0)]);
        let reasons = validate_scale(scale).expect_err("gap");
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("'E'"), "{}", reasons[0]);
        assert!(reasons[0].contains("'A'"), "{}", reasons[0]);
    }

    #[test]
    fn one_unit_seam_is_not_a_gap() {
        let scale = percentage_scale(vec![band("E", 0.0, 32.0), band("A", 33.0, 100.0)]);
        assert!(validate_scale(scale).is_ok());
    }

    #[test]
    fn percentage_scale_must_start_at_zero() {
        let scale = percentage_scale(vec![band("B", 10.0, 50.0), band("A", 51.0, 100.0)]);
        let reasons = validate_scale(scale).expect_err("start");
        assert!(reasons[0].contains("start at 0%"), "{}", reasons[0]);
    }

    #[test]
    fn percentage_scale_must_end_at_hundred() {
        let scale = percentage_scale(vec![band("E", 0.0, 50.0), band("A", 51.0, 90.0)]);
        let reasons = validate_scale(scale).expect_err("end");
        assert!(reasons[0].contains("end at 100%"), "{}", reasons[0]);
    }

    #[test]
    fn overlapping_bands_are_accepted_as_is() {
        // Known source asymmetry: gaps are rejected, overlaps are not.
        let scale = percentage_scale(vec![band("E", 0.0, 40.0), band("A", 35.0, 100.0)]);
        assert!(validate_scale(scale).is_ok());
    }

    #[test]
    fn empty_name_short_circuits_before_band_checks() {
        let mut scale = percentage_scale(vec![band("E", 5.0, 1.0)]);
        scale.name = "  ".to_string();
        let reasons = validate_scale(scale).expect_err("name");
        assert_eq!(reasons, vec!["Scale name is required".to_string()]);
    }

    #[test]
    fn inverted_band_is_rejected_naming_the_band() {
        let scale = percentage_scale(vec![band("E", 0.0, 32.0), band("X", 50.0, 40.0)]);
        let reasons = validate_scale(scale).expect_err("inverted");
        assert!(reasons[0].contains("'X'"), "{}", reasons[0]);
    }

    #[test]
    fn band_checks_accumulate_within_the_stage() {
        let scale = percentage_scale(vec![band("", 0.0, 10.0), band("X", 50.0, 40.0)]);
        let reasons = validate_scale(scale).expect_err("two reasons");
        assert_eq!(reasons.len(), 2);
    }

    #[test]
    fn non_percentage_scale_skips_coverage_checks() {
        let mut scale = percentage_scale(vec![band("A", 3.5, 4.0)]);
        scale.scale_type = ScaleType::Gpa;
        assert!(validate_scale(scale).is_ok());
    }

    #[test]
    fn percentage_scale_with_no_bands_is_rejected() {
        let scale = percentage_scale(vec![]);
        let reasons = validate_scale(scale).expect_err("empty");
        assert!(reasons[0].contains("at least one band"));
    }
}
