//! Robust fixed-order scheduling.
//!
//! Given a permutation of all operations, compute the pointwise-earliest
//! start times such that
//!
//! 1. consecutive operations do not overlap in the nominal schedule,
//! 2. every realization under delay vectors in `[0, max_deviation]^N`
//!    respects every metering-interval energy cap,
//! 3. no operation starts before its release time.
//!
//! If some operation cannot start by the instance's maximum start time, the
//! order is infeasible.
//!
//! Two implementations of the same capability exist: a reference
//! [`BaselineOrderSchedule`] that walks candidate placements one time unit at
//! a time over the shared envelope primitives, and an
//! [`OptimisedOrderSchedule`] that sweeps metering intervals backward from
//! the predecessor's latest completion, shifting the envelope left in larger
//! steps. Both return identical start times on every feasible order; the
//! baseline is retained as a cross-validation oracle.

use crate::envelope;
use crate::Feasibility;
use enersched_core::{interval_intersection, Instance, MeteringInterval, StartTimes};

/// Incremental contract of the fixed-order scheduler.
///
/// `append_position` extends a prefix schedule in place and only depends on
/// state recorded for earlier positions, which is what lets branch-and-bound
/// re-append different candidates at the same position without undo.
pub trait OrderSchedule {
    /// Extend the prefix schedule with the operation at `position` of
    /// `ordered`.
    fn append_position(&mut self, ordered: &[usize], position: usize) -> Feasibility;

    /// Start times computed so far, indexed by operation index.
    fn start_times(&self) -> &StartTimes;

    /// Schedule the first `prefix_len` positions, stopping at the first
    /// infeasible one.
    fn create_prefix(&mut self, ordered: &[usize], prefix_len: usize) -> Feasibility {
        for position in 0..prefix_len {
            if self.append_position(ordered, position) == Feasibility::Infeasible {
                return Feasibility::Infeasible;
            }
        }
        Feasibility::Feasible
    }

    /// Schedule the whole permutation.
    fn create(&mut self, ordered: &[usize]) -> Feasibility {
        self.create_prefix(ordered, ordered.len())
    }
}

/// The variant used by all search layers.
pub type DefaultOrderSchedule<'a> = OptimisedOrderSchedule<'a>;

/// Run-time selectable variant, used where the two implementations are
/// cross-validated against each other.
pub enum OrderScheduleVariant<'a> {
    Baseline(BaselineOrderSchedule<'a>),
    Optimised(OptimisedOrderSchedule<'a>),
}

impl<'a> OrderScheduleVariant<'a> {
    pub fn baseline(instance: &'a Instance) -> Self {
        Self::Baseline(BaselineOrderSchedule::new(instance))
    }

    pub fn optimised(instance: &'a Instance) -> Self {
        Self::Optimised(OptimisedOrderSchedule::new(instance))
    }
}

impl OrderSchedule for OrderScheduleVariant<'_> {
    fn append_position(&mut self, ordered: &[usize], position: usize) -> Feasibility {
        match self {
            Self::Baseline(alg) => alg.append_position(ordered, position),
            Self::Optimised(alg) => alg.append_position(ordered, position),
        }
    }

    fn start_times(&self) -> &StartTimes {
        match self {
            Self::Baseline(alg) => alg.start_times(),
            Self::Optimised(alg) => alg.start_times(),
        }
    }
}

// ============================================================================
// Baseline variant
// ============================================================================

/// Reference implementation: walks the predecessor's candidate latest start
/// down one unit at a time, recomputing the right-shift envelope and the
/// energy budget of the touched metering interval at every step.
pub struct BaselineOrderSchedule<'a> {
    instance: &'a Instance,
    start_times: StartTimes,
    latest_start_times: StartTimes,
    right_shift_start_times: StartTimes,
}

impl<'a> BaselineOrderSchedule<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        let n = instance.num_operations();
        Self {
            instance,
            start_times: StartTimes::zeroed(n),
            latest_start_times: StartTimes::zeroed(n),
            right_shift_start_times: StartTimes::zeroed(n),
        }
    }

    fn refresh_latest(&mut self, ordered: &[usize], position: usize) {
        self.start_times.latest_start_time_at(
            self.instance,
            ordered,
            position,
            &mut self.latest_start_times,
        );
    }
}

impl OrderSchedule for BaselineOrderSchedule<'_> {
    fn append_position(&mut self, ordered: &[usize], position: usize) -> Feasibility {
        let ins = self.instance;
        let operation = ordered[position];
        let op = *ins.operation(operation);
        self.start_times[operation] = op.release_time;

        // Earliest robust start due to the preceding operations.
        if position > 0 {
            let prev = ordered[position - 1];
            let prev_processing = ins.operation(prev).processing_time;
            self.start_times[operation] =
                op.release_time.max(self.start_times[prev] + prev_processing);

            let mut t = self.latest_start_times[prev];
            let t_min = self.latest_start_times[prev].min(
                self.start_times[prev]
                    .max(op.release_time - prev_processing),
            );
            while t >= t_min {
                let interval_index = ins
                    .last_interval_touching(t + prev_processing)
                    .expect("prefix envelope stays within the horizon");
                let interval = *ins.metering_interval(interval_index);

                envelope::right_shift_start_times(
                    ins,
                    ordered,
                    &self.latest_start_times,
                    &mut self.right_shift_start_times,
                    position - 1,
                    t,
                    Some(&interval),
                );
                let consumed = envelope::energy_in_interval(
                    ins,
                    ordered,
                    &self.right_shift_start_times,
                    position - 1,
                    &interval,
                );
                let max_possible_intersection =
                    ((interval.max_energy_consumption - consumed) / op.power_consumption) as i64;

                if op.processing_time <= max_possible_intersection {
                    // The interval has room for the whole operation no matter
                    // how the prefix shifts; jump left of it.
                    t = interval.start - prev_processing - 1;
                } else if max_possible_intersection
                    >= interval.end - (self.right_shift_start_times[prev] + prev_processing)
                {
                    t -= 1;
                } else {
                    self.start_times[operation] = op
                        .release_time
                        .max(interval.end - max_possible_intersection);
                    break;
                }
            }
        }

        // Earliest robust start due to the operation itself.
        self.refresh_latest(ordered, position);
        if let Some(first_index) = ins.interval_containing(self.start_times[operation]) {
            for interval_index in first_index..ins.num_metering_intervals() {
                let interval = *ins.metering_interval(interval_index);

                let max_nonviolating_intersection =
                    (interval.max_energy_consumption / op.power_consumption) as i64;
                let max_intersection = op.processing_time.min(interval_intersection(
                    interval.start,
                    interval.end,
                    self.start_times[operation],
                    self.latest_start_times[operation] + op.processing_time,
                ));

                if max_intersection == 0 {
                    break;
                }
                if max_nonviolating_intersection < max_intersection {
                    self.start_times[operation] = interval.end - max_nonviolating_intersection;
                    self.refresh_latest(ordered, position);
                }
            }
        }

        if self.start_times[operation] > ins.max_start_time() {
            Feasibility::Infeasible
        } else {
            Feasibility::Feasible
        }
    }

    fn start_times(&self) -> &StartTimes {
        &self.start_times
    }
}

// ============================================================================
// Optimised variant
// ============================================================================

/// Production implementation: sweeps metering intervals backward from the
/// one containing the predecessor's latest completion, maintaining a
/// right-shift envelope that is stepped left whole operations at a time
/// wherever the energy budget allows it.
pub struct OptimisedOrderSchedule<'a> {
    instance: &'a Instance,
    start_times: StartTimes,
    latest_start_times: StartTimes,
    right_shift_start_times: StartTimes,
}

impl<'a> OptimisedOrderSchedule<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        let n = instance.num_operations();
        Self {
            instance,
            start_times: StartTimes::zeroed(n),
            latest_start_times: StartTimes::zeroed(n),
            right_shift_start_times: StartTimes::zeroed(n),
        }
    }

    fn refresh_latest(&mut self, ordered: &[usize], position: usize) {
        self.start_times.latest_start_time_at(
            self.instance,
            ordered,
            position,
            &mut self.latest_start_times,
        );
    }

    /// Envelope propagation local to one metering interval: pin
    /// `for_position` at `t`, pack predecessors right against it (stopping
    /// once they start at or left of the interval), then replay successors up
    /// to `up_to_position` at their earliest (stopping once one completes at
    /// or past the interval end).
    fn compute_right_shift(
        &mut self,
        ordered: &[usize],
        for_position: usize,
        up_to_position: usize,
        t: i64,
        interval: &MeteringInterval,
    ) {
        let ins = self.instance;
        self.right_shift_start_times[ordered[for_position]] = t;

        for position in (0..for_position).rev() {
            let operation = ordered[position];
            let next = ordered[position + 1];
            let processing_time = ins.operation(operation).processing_time;

            self.right_shift_start_times[operation] = self.latest_start_times[operation]
                .min(self.right_shift_start_times[next] - processing_time);

            if self.right_shift_start_times[operation] <= interval.start {
                break;
            }
        }

        for position in for_position + 1..=up_to_position {
            let operation = ordered[position];
            let prev = ordered[position - 1];
            let prev_processing = ins.operation(prev).processing_time;

            self.right_shift_start_times[operation] = self.start_times[operation]
                .max(self.right_shift_start_times[prev] + prev_processing);

            if interval.end
                <= self.right_shift_start_times[operation]
                    + ins.operation(operation).processing_time
            {
                break;
            }
        }
    }

    /// Earliest position of the envelope whose span still reaches into
    /// `interval`.
    fn first_intersecting_position(
        &self,
        ordered: &[usize],
        up_to_position: usize,
        interval: &MeteringInterval,
    ) -> Option<usize> {
        let mut first_intersecting = None;
        for position in (0..=up_to_position).rev() {
            let operation = ordered[position];
            let start = self.right_shift_start_times[operation];
            let completion = start + self.instance.operation(operation).processing_time;

            let intersection =
                interval_intersection(interval.start, interval.end, start, completion);
            if intersection == 0 {
                if first_intersecting.is_some() {
                    return first_intersecting;
                }
            } else {
                first_intersecting = Some(position);
            }

            if start <= interval.start {
                break;
            }
        }

        first_intersecting
    }

    /// Leftmost admissible placement for the first intersecting operation:
    /// out of the interval if its envelope allows, but never before its
    /// baseline start.
    fn left_shift_start(&self, ordered: &[usize], position: usize, interval: &MeteringInterval) -> i64 {
        let operation = ordered[position];
        self.start_times[operation]
            .max(interval.start.min(self.right_shift_start_times[operation]))
    }

    /// Earliest start of the operation at `for_position` given the energy the
    /// enveloped prefix `first_intersecting..for_position` consumes in
    /// `interval`.
    fn earliest_start_due_preceding(
        &self,
        ordered: &[usize],
        first_intersecting_position: usize,
        for_position: usize,
        interval: &MeteringInterval,
    ) -> i64 {
        let ins = self.instance;
        let op = ins.operation(ordered[for_position]);

        let mut consumed = 0.0;
        for position in (first_intersecting_position..for_position).rev() {
            let operation = ins.operation(ordered[position]);
            let start = self.right_shift_start_times[operation.index];
            let completion = start + operation.processing_time;
            let intersection =
                interval_intersection(interval.start, interval.end, start, completion);
            consumed += intersection as f64 * operation.power_consumption;
        }

        let remaining = (interval.max_energy_consumption - consumed).max(0.0);
        let max_intersection = (remaining / op.power_consumption) as i64;

        let mut earliest_start = self.start_times[op.index];
        if max_intersection < op.processing_time {
            earliest_start = earliest_start.max(interval.end - max_intersection);
        }
        earliest_start
    }
}

impl OrderSchedule for OptimisedOrderSchedule<'_> {
    fn append_position(&mut self, ordered: &[usize], position: usize) -> Feasibility {
        let ins = self.instance;
        let operation = ordered[position];
        let op = *ins.operation(operation);

        if position == 0 {
            self.start_times[operation] = op.release_time;
        } else {
            let prev = ordered[position - 1];
            let prev_processing = ins.operation(prev).processing_time;

            self.start_times[operation] =
                op.release_time.max(self.start_times[prev] + prev_processing);

            // Causal sweep: walk metering intervals backward from the one the
            // predecessor's latest completion still touches.
            let prev_latest_completion = self.latest_start_times[prev] + prev_processing;
            let mut interval_index = ins
                .last_interval_touching(prev_latest_completion)
                .expect("prefix envelope stays within the horizon");
            let mut stop = false;

            while !stop {
                let interval = *ins.metering_interval(interval_index);

                // Latest start of the predecessor that still touches this
                // interval.
                let t = (interval.end - prev_processing - 1).min(self.latest_start_times[prev]);
                if t < self.start_times[prev] {
                    break;
                }

                self.compute_right_shift(ordered, position - 1, position - 1, t, &interval);
                let mut first_intersecting = self
                    .first_intersecting_position(ordered, position - 1, &interval)
                    .expect("pinned predecessor intersects its own interval");
                let left_shifted = self.left_shift_start(ordered, first_intersecting, &interval);
                self.compute_right_shift(
                    ordered,
                    first_intersecting,
                    position - 1,
                    left_shifted,
                    &interval,
                );

                let mut continue_with_previous_interval = false;
                while !stop && !continue_with_previous_interval {
                    let earliest_start = self.earliest_start_due_preceding(
                        ordered,
                        first_intersecting,
                        position,
                        &interval,
                    );

                    if first_intersecting == position {
                        // Everything before was pushed out to the left of the
                        // interval.
                        if interval.start < earliest_start {
                            self.start_times[operation] = earliest_start;
                            stop = true;
                        } else {
                            continue_with_previous_interval = true;
                        }
                    } else if self.right_shift_start_times[prev] + prev_processing < earliest_start
                    {
                        self.start_times[operation] = earliest_start;
                        stop = true;
                    } else if self.start_times[ordered[first_intersecting]]
                        == self.right_shift_start_times[ordered[first_intersecting]]
                    {
                        // The envelope cannot move further left.
                        stop = true;
                    } else if earliest_start + op.processing_time <= interval.end {
                        // The operation fits fully inside this interval.
                        continue_with_previous_interval = true;
                    } else if ins.operation(ordered[first_intersecting]).power_consumption
                        >= op.power_consumption
                    {
                        // Shifting the heavier operation fully out of the
                        // interval can only free budget.
                        first_intersecting += 1;
                    } else {
                        // Step the envelope one unit left; admissible because
                        // the baseline bound was checked above.
                        let stepped =
                            self.right_shift_start_times[ordered[first_intersecting]] - 1;
                        self.compute_right_shift(
                            ordered,
                            first_intersecting,
                            position - 1,
                            stepped,
                            &interval,
                        );
                        let fi_operation = ins.operation(ordered[first_intersecting]);
                        if self.right_shift_start_times[fi_operation.index]
                            + fi_operation.processing_time
                            <= interval.start
                        {
                            first_intersecting += 1;
                        }
                    }
                }

                if continue_with_previous_interval {
                    if interval_index == 0 {
                        stop = true;
                    } else {
                        interval_index -= 1;
                    }
                }
            }
        }

        // Self sweep: push the start right while the operation's own
        // deviation span would overdraw some interval.
        self.refresh_latest(ordered, position);
        let first_index = (self.start_times[operation] / ins.interval_length()) as usize;
        for interval_index in first_index..ins.num_metering_intervals() {
            let interval = *ins.metering_interval(interval_index);

            let max_intersection =
                (interval.max_energy_consumption / op.power_consumption) as i64;
            let intersection = op.processing_time.min(interval_intersection(
                interval.start,
                interval.end,
                self.start_times[operation],
                self.latest_start_times[operation] + op.processing_time,
            ));

            debug_assert!(intersection <= ins.interval_length());

            if intersection == 0 {
                break;
            }
            if max_intersection < intersection {
                self.start_times[operation] = interval.end - max_intersection;
                self.refresh_latest(ordered, position);
            }
        }

        if self.start_times[operation] > ins.max_start_time() {
            Feasibility::Infeasible
        } else {
            Feasibility::Feasible
        }
    }

    fn start_times(&self) -> &StartTimes {
        &self.start_times
    }
}

// ============================================================================
// Tests
// ============================================================================
