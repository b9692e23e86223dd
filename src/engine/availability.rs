use chrono::{DateTime, TimeDelta, Utc};

use crate::model::*;

use super::conflict::{find_conflicts, has_conflict, live_contracts};

// ── Availability Algorithm ────────────────────────────────────────

/// Evaluate one unit's contracts against a requested range.
///
/// The two optional computations are skipped entirely when not requested:
/// without `include_conflicts` the verdict comes from a short-circuiting scan,
/// and the next-available search only runs for unavailable units.
pub fn evaluate(
    contracts: &[Contract],
    requested: &DateRange,
    options: &AvailabilityOptions,
) -> AvailabilityResult {
    let (available, conflicts) = if options.include_conflicts {
        let conflicts = find_conflicts(contracts, requested);
        (conflicts.is_empty(), conflicts)
    } else {
        (!has_conflict(contracts, requested), Vec::new())
    };

    let next_available = if !available && options.calculate_next_available {
        next_available(contracts, requested)
    } else {
        None
    };

    AvailabilityResult {
        available,
        conflicts,
        next_available,
    }
}

/// Earliest range of `requested.duration()` starting at or after
/// `requested.start` that no live contract overlaps.
///
/// Contracts ending at or before `requested.start` are ignored. Returns `None`
/// only if the window would overflow the representable time range.
pub fn next_available(contracts: &[Contract], requested: &DateRange) -> Option<DateRange> {
    let occupied: Vec<DateRange> = live_contracts(contracts)
        .map(|c| c.occupied_range)
        .filter(|r| r.end > requested.start)
        .collect();
    let merged = merge(&occupied);
    first_free_window(&merged, requested.start, requested.duration())
}

/// Walk sorted, disjoint `occupied` ranges from `from` and return the first
/// gap (between ranges or after the last one) at least `duration` long.
pub fn first_free_window(
    occupied: &[DateRange],
    from: DateTime<Utc>,
    duration: TimeDelta,
) -> Option<DateRange> {
    let mut cursor = from;
    for range in occupied {
        if range.end <= cursor {
            continue;
        }
        if range.start > cursor && range.start - cursor >= duration {
            break;
        }
        cursor = cursor.max(range.end);
    }
    let end = cursor.checked_add_signed(duration)?;
    Some(DateRange::new(cursor, end))
}

/// Sort by start, then merge overlapping/adjacent ranges.
pub fn merge(ranges: &[DateRange]) -> Vec<DateRange> {
    #[cfg(test)]
    work::add(&work::RANGES_MERGED, ranges.len());
    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|r| (r.start, r.end));
    merge_overlapping(&sorted)
}

/// Merge sorted overlapping/adjacent ranges into disjoint ranges.
pub fn merge_overlapping(sorted: &[DateRange]) -> Vec<DateRange> {
    let mut merged: Vec<DateRange> = Vec::new();
    for &range in sorted {
        if let Some(last) = merged.last_mut()
            && range.start <= last.end
        {
            last.end = last.end.max(range.end);
            continue;
        }
        merged.push(range);
    }
    merged
}
