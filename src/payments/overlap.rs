// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::DateRange;

pub const DAYS_PER_WEEK: i64 = 7;

/// Intersection of an agreement range with the reporting window.
pub fn overlap(range: &DateRange, window: &DateRange) -> Option<DateRange> {
    let start = range.start.max(window.start);
    let end = range.end.min(window.end);
    if start > end {
        return None;
    }
    Some(DateRange::new(start, end))
}

/// Days covered by an inclusive range. The window end counts as a whole day,
/// so the ceiling of the elapsed time is `end - start + 1`.
pub fn overlap_days(o: &DateRange) -> i64 {
    (o.end - o.start).num_days() + 1
}

/// Billing weeks for a day count; a started week is a full week.
pub fn weeks_for_days(days: i64) -> i64 {
    if days <= 0 {
        return 0;
    }
    (days + DAYS_PER_WEEK - 1) / DAYS_PER_WEEK
}

/// Sum of billing weeks over every range that intersects the window. Ranges
/// are rounded independently, so two 3-day pieces bill two weeks.
pub fn weeks_in_range(ranges: &[DateRange], window: &DateRange) -> i64 {
    ranges
        .iter()
        .filter(|r| r.start <= r.end)
        .filter_map(|r| overlap(r, window))
        .map(|o| weeks_for_days(overlap_days(&o)))
        .sum()
}
