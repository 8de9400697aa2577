// src/grade/histogram.rs

//! ASCII rendering of a grade distribution.

use std::collections::BTreeMap;

/// Glyph for a bar whose top falls in the row just above its count label.
const BAR_TOP: &str = "┬";
/// Glyph for the body of a bar.
const BAR_BODY: &str = "║";

/// Render `values` as a vertical histogram.
///
/// Values are bucketed by rounding to the nearest integer. The grid has 11
/// rows, from 100% down to 0% of the modal bucket, and one column per
/// integer bucket from 0 to the highest observed bucket. Each bar shows its
/// occurrence count on its top row, with `┬`/`║` glyphs below it.
///
/// ```text
/// 50% │         3
/// 45% │         ┬
/// ...
///  0% │ ║ 0 ║ 0 ║
///     └──────────
///       0 1 2 3 4
/// ```
pub fn ascii_histogram(values: &[f64]) -> String {
    let mut occurrences_by_bucket: BTreeMap<i64, usize> = BTreeMap::new();
    for value in values {
        *occurrences_by_bucket.entry(bucket_of(*value)).or_default() += 1;
    }

    let max_occurrences = occurrences_by_bucket.values().copied().max().unwrap_or(0);
    if max_occurrences == 0 {
        return "no results.".to_string();
    }
    let max_bucket = values.iter().map(|v| bucket_of(*v)).max().unwrap_or(0).max(0);

    let column_width = max_occurrences
        .to_string()
        .len()
        .max(max_bucket.to_string().len())
        + 1;
    let max_occ = max_occurrences as f64;

    let mut out = String::new();
    for i in (0..=10i64).rev() {
        let label = (i as usize * 10 * max_occurrences) / values.len();
        out.push_str(&format!("{label:>2}% │"));

        let previous_up = (i + 1) as f64 * 0.1;
        let up = i as f64 * 0.1;
        let low = (i - 1) as f64 * 0.1;

        for bucket in 0..=max_bucket {
            let occurrences = occurrences_by_bucket.get(&bucket).copied().unwrap_or(0);
            let occ = occurrences as f64;
            let cell = if occ > low * max_occ {
                if occ <= up * max_occ {
                    occurrences.to_string()
                } else if occ <= previous_up * max_occ {
                    BAR_TOP.to_string()
                } else {
                    BAR_BODY.to_string()
                }
            } else {
                String::new()
            };
            out.push_str(&format!("{cell:>column_width$}"));
        }
        out.push('\n');
    }

    out.push_str("    └");
    for _ in 0..=max_bucket {
        out.push_str(&"─".repeat(column_width));
    }
    out.push('\n');
    out.push_str("     ");
    for bucket in 0..=max_bucket {
        out.push_str(&format!("{bucket:>column_width$}"));
    }

    out
}

fn bucket_of(value: f64) -> i64 {
    value.round() as i64
}
