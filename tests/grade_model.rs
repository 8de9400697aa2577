use gradeflow::grade::{ascii_histogram, round, GradeDetails, GradePart};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn totals_sum_grades_and_treat_missing_maxima_as_zero() {
    let details = GradeDetails::from_parts(vec![
        GradePart::new("p1", 3.0, Some(7.0), vec![]),
        GradePart::new("p2", 0.0, Some(2.0), vec![]),
        GradePart::new("penalty", -1.0, None, vec!["late".into()]),
    ]);

    assert_eq!(details.grade(), 2.0);
    assert_eq!(details.max_grade(), 9.0);
}

#[test]
fn total_never_drops_below_zero() {
    let details = GradeDetails::from_parts(vec![
        GradePart::new("p1", 1.0, Some(5.0), vec![]),
        GradePart::new("penalty", -4.0, None, vec![]),
    ]);

    assert_eq!(details.grade(), 0.0);
    assert_eq!(details.max_grade(), 5.0);
}

#[test]
fn totals_are_rounded_to_two_decimals() {
    let details = GradeDetails::from_parts(vec![
        GradePart::new("a", 0.1, Some(0.333), vec![]),
        GradePart::new("b", 0.2, Some(0.333), vec![]),
    ]);

    assert_eq!(details.grade(), 0.3);
    assert_eq!(details.max_grade(), 0.67);
    assert_eq!(round(2.345678, 3), 2.346);
}

#[test]
fn empty_details_are_worth_nothing() {
    let details = GradeDetails::new();
    assert!(details.is_empty());
    assert_eq!(details.grade(), 0.0);
    assert_eq!(details.max_grade(), 0.0);
}

#[test]
fn bounded_parts_are_clamped() {
    let over = GradePart::bounded("over", 12.0, 0.0, Some(10.0), vec![]);
    let under = GradePart::bounded("under", -3.0, -1.0, Some(10.0), vec![]);
    let penalty = GradePart::bounded("penalty", 2.0, -5.0, None, vec![]);

    assert_eq!(over.grade, 10.0);
    assert_eq!(under.grade, -1.0);
    assert_eq!(penalty.grade, 0.0);
}

#[test]
fn failure_details_carry_the_message() {
    let details = GradeDetails::failure("Unable to clone");

    assert_eq!(details.parts().len(), 1);
    assert_eq!(details.grade(), 0.0);
    assert_eq!(details.parts()[0].comments, vec!["Unable to clone".to_string()]);
}

#[test]
fn parts_serialise_in_camel_case() {
    let details = GradeDetails::from_parts(vec![GradePart::new(
        "build",
        5.0,
        Some(10.0),
        vec!["Test failures".into()],
    )]);

    let value = serde_json::to_value(&details).unwrap();

    assert_eq!(
        value,
        json!({
            "parts": [
                { "id": "build", "grade": 5.0, "maxGrade": 10.0, "comments": ["Test failures"] }
            ]
        })
    );
}

#[test]
fn histogram_without_values_reports_no_results() {
    assert_eq!(ascii_histogram(&[]), "no results.");
}

#[test]
fn histogram_renders_bars_counts_and_axis() {
    let rendered = ascii_histogram(&[1.0, 1.2, 2.4]);

    let expected = [
        "66% │   2  ",
        "60% │   ┬  ",
        "53% │   ║  ",
        "46% │   ║  ",
        "40% │   ║  ",
        "33% │   ║ 1",
        "26% │   ║ ┬",
        "20% │   ║ ║",
        "13% │   ║ ║",
        " 6% │   ║ ║",
        " 0% │ 0 ║ ║",
        "    └──────",
        "      0 1 2",
    ]
    .join("\n");

    assert_eq!(rendered, expected);
}

#[test]
fn histogram_marks_empty_buckets_with_zero() {
    let rendered = ascii_histogram(&[0.0, 0.1, 4.0, 4.0, 4.0, 2.0]);

    let expected = [
        "50% │         3",
        "45% │         ┬",
        "40% │         ║",
        "35% │ 2       ║",
        "30% │ ┬       ║",
        "25% │ ║       ║",
        "20% │ ║   1   ║",
        "15% │ ║   ┬   ║",
        "10% │ ║   ║   ║",
        " 5% │ ║   ║   ║",
        " 0% │ ║ 0 ║ 0 ║",
        "    └──────────",
        "      0 1 2 3 4",
    ]
    .join("\n");

    assert_eq!(rendered, expected);
}

#[test]
fn histogram_has_one_column_per_bucket_up_to_the_highest() {
    let rendered = ascii_histogram(&[7.0]);
    let axis = rendered.lines().last().unwrap();

    assert_eq!(axis.split_whitespace().count(), 8);
    assert!(axis.trim_end().ends_with('7'));
}

proptest! {
    #[test]
    fn grade_is_the_clamped_rounded_sum(
        parts in prop::collection::vec((-20.0f64..20.0, prop::option::of(0.0f64..20.0)), 0..10)
    ) {
        let details = GradeDetails::from_parts(
            parts
                .iter()
                .enumerate()
                .map(|(i, (grade, max))| GradePart::new(format!("p{i}"), *grade, *max, vec![]))
                .collect(),
        );

        let sum: f64 = parts.iter().map(|(g, _)| *g).sum();
        let max_sum: f64 = parts.iter().map(|(_, m)| m.unwrap_or(0.0)).sum();

        prop_assert_eq!(details.grade(), round(sum, 2).max(0.0));
        prop_assert_eq!(details.max_grade(), round(max_sum, 2));
        prop_assert!(details.grade() >= 0.0);
    }

    #[test]
    fn bounded_grade_stays_within_bounds(
        grade in -50.0f64..50.0,
        min in -10.0f64..0.0,
        max in 0.0f64..20.0,
    ) {
        let part = GradePart::bounded("p", grade, min, Some(max), vec![]);
        prop_assert!(part.grade >= min);
        prop_assert!(part.grade <= max);
    }
}
