//! Shared utility functions.

use crate::period::{Granularity, Period};

/// Truncates a display name to `max_chars` characters, ending in `…`.
pub fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let mut truncated: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Long label for a period: `"Jan 2019"` or `"Q1 2019"`.
pub fn period_label(period: &Period) -> String {
    match period.granularity() {
        Granularity::Monthly => period.first_day().format("%b %Y").to_string(),
        Granularity::Quarterly => format!("Q{} {}", period.quarter_number(), period.year()),
    }
}

/// Axis label for a period: `"Jan '19"` or `"Q1 '19"`.
pub fn short_period_label(period: &Period) -> String {
    match period.granularity() {
        Granularity::Monthly => period.first_day().format("%b '%y").to_string(),
        Granularity::Quarterly => {
            format!("Q{} '{:02}", period.quarter_number(), period.year() % 100)
        }
    }
}

/// `numerator / denominator`, dividing by 1 when the denominator is zero.
#[allow(clippy::cast_precision_loss)]
pub fn safe_ratio(numerator: u64, denominator: u64) -> f64 {
    numerator as f64 / denominator.max(1) as f64
}

/// Median of the values; the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
