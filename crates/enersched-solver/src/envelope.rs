//! Right-shift envelope primitives shared by the fixed-order scheduler
//! variants.
//!
//! The *right-shift envelope* of a prefix with the operation at
//! `for_position` pinned to time `t` is the latest realizable placement of
//! the earlier operations that still respects their latest start times: each
//! predecessor sits at `min(latest, successor start - processing time)`.

use enersched_core::{interval_intersection, Instance, MeteringInterval, StartTimes};

/// Propagate a right-shift envelope leftward from `for_position` pinned at
/// `t`.
///
/// When `interval` is given, propagation stops at the first predecessor whose
/// envelope span no longer reaches into it; entries further left keep stale
/// values and must not be read.
pub fn right_shift_start_times(
    instance: &Instance,
    ordered: &[usize],
    latest: &StartTimes,
    right_shift: &mut StartTimes,
    for_position: usize,
    t: i64,
    interval: Option<&MeteringInterval>,
) {
    right_shift[ordered[for_position]] = t;
    for position in (0..for_position).rev() {
        let operation = ordered[position];
        let next = ordered[position + 1];
        let processing_time = instance.operation(operation).processing_time;

        right_shift[operation] = latest[operation].min(right_shift[next] - processing_time);

        if let Some(interval) = interval {
            if right_shift[operation] + processing_time <= interval.start {
                break;
            }
        }
    }
}

/// Energy consumed inside `interval` by the prefix `0..=up_to_position`
/// placed at `times`.
///
/// Scans right to left and stops at the first operation completing at or
/// before the interval start; callers guarantee the placement is
/// non-decreasing along the permutation.
pub fn energy_in_interval(
    instance: &Instance,
    ordered: &[usize],
    times: &StartTimes,
    up_to_position: usize,
    interval: &MeteringInterval,
) -> f64 {
    let mut energy = 0.0;
    for position in (0..=up_to_position).rev() {
        let operation = instance.operation(ordered[position]);
        let start = times[operation.index];
        let completion = start + operation.processing_time;

        if completion <= interval.start {
            break;
        }

        let intersection = interval_intersection(interval.start, interval.end, start, completion);
        energy += intersection as f64 * operation.power_consumption;
    }

    energy
}
