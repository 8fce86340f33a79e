//! Start-time vectors and their derived views.
//!
//! A [`StartTimes`] is a length-N vector of integer start times indexed by
//! operation index. Three derived views are used throughout the engine:
//!
//! - the *ordered permutation*: operations sorted by start time, ties broken
//!   by index;
//! - the *latest start times*: the right-shift envelope of the baseline
//!   schedule under an adversary that may delay each operation by up to the
//!   instance's maximum deviation;
//! - the *realised start times* under a concrete per-operation delay vector.

use crate::{interval_intersection, is_greater, Instance, ENERGY_AUDIT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Integer start times indexed by operation index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StartTimes(Vec<i64>);

impl StartTimes {
    /// All-zero start times for `num_operations` operations.
    pub fn zeroed(num_operations: usize) -> Self {
        Self(vec![0; num_operations])
    }

    pub fn from_vec(start_times: Vec<i64>) -> Self {
        Self(start_times)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Operation indices sorted by start time ascending, ties by index.
    pub fn ordered_permutation(&self) -> Vec<usize> {
        let mut ordered: Vec<usize> = (0..self.0.len()).collect();
        ordered.sort_unstable_by_key(|&index| (self.0[index], index));
        ordered
    }

    /// Latest start time of the operation at `position` in `ordered`, given
    /// the latest start times of all earlier positions in `latest`.
    ///
    /// The first operation may be delayed by at most the maximum deviation;
    /// each later one additionally inherits the delayed completion of its
    /// predecessor.
    pub fn latest_start_time_at(
        &self,
        instance: &Instance,
        ordered: &[usize],
        position: usize,
        latest: &mut StartTimes,
    ) {
        let operation = ordered[position];
        if position == 0 {
            latest[operation] = self.0[operation] + instance.max_deviation();
        } else {
            let prev = ordered[position - 1];
            latest[operation] = self.0[operation]
                .max(latest[prev] + instance.operation(prev).processing_time)
                + instance.max_deviation();
        }
    }

    /// Latest start times for every position of `ordered`.
    pub fn latest_start_times(&self, instance: &Instance, ordered: &[usize], latest: &mut StartTimes) {
        for position in 0..ordered.len() {
            self.latest_start_time_at(instance, ordered, position, latest);
        }
    }

    /// Realised start times when each operation is delayed by
    /// `scenario[operation index]` units, applied in permutation order.
    pub fn realised_start_times(
        &self,
        instance: &Instance,
        ordered: &[usize],
        scenario: &[i64],
        realised: &mut StartTimes,
    ) {
        for position in 0..ordered.len() {
            let operation = ordered[position];
            if position == 0 {
                realised[operation] = self.0[operation] + scenario[operation];
            } else {
                let prev = ordered[position - 1];
                realised[operation] = self.0[operation]
                    .max(realised[prev] + instance.operation(prev).processing_time)
                    + scenario[operation];
            }
        }
    }

    /// Lowest-index metering interval whose energy cap is exceeded by this
    /// schedule, or `None` when every cap holds.
    ///
    /// Violations are flagged with the coarse audit tolerance so that only
    /// gross overshoots (beyond floating-point noise) count.
    pub fn violated_interval(&self, instance: &Instance) -> Option<usize> {
        let mut consumed = vec![0.0; instance.num_metering_intervals()];
        for operation in instance.operations() {
            let start = self.0[operation.index];
            let completion = start + operation.processing_time;
            let Some(first) = instance.interval_containing(start) else {
                continue;
            };
            let last = instance
                .last_interval_touching(completion)
                .unwrap_or(instance.num_metering_intervals() - 1);
            for interval_index in first..=last {
                let interval = instance.metering_interval(interval_index);
                let intersection =
                    interval_intersection(interval.start, interval.end, start, completion);
                consumed[interval_index] += intersection as f64 * operation.power_consumption;
            }
        }

        instance
            .metering_intervals()
            .iter()
            .find(|interval| {
                is_greater(
                    consumed[interval.index],
                    interval.max_energy_consumption,
                    ENERGY_AUDIT_TOLERANCE,
                )
            })
            .map(|interval| interval.index)
    }

    /// Whether any energy cap is exceeded.
    pub fn energy_limits_violated(&self, instance: &Instance) -> bool {
        self.violated_interval(instance).is_some()
    }
}

impl Index<usize> for StartTimes {
    type Output = i64;

    fn index(&self, operation_index: usize) -> &i64 {
        &self.0[operation_index]
    }
}

impl IndexMut<usize> for StartTimes {
    fn index_mut(&mut self, operation_index: usize) -> &mut i64 {
        &mut self.0[operation_index]
    }
}

impl fmt::Display for StartTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StartTimes(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}
