//! # enersched-core
//!
//! Core domain model for the enersched scheduling engine.
//!
//! This crate provides:
//! - Domain types: `Operation`, `MeteringInterval`, `Instance`, `StartTimes`
//! - The total-tardiness objective and its preemptive lower bound
//! - Solver configuration, result and status types
//! - A monotonic `Stopwatch` for cooperative deadline polling
//!
//! The problem solved by the engine: schedule N non-preemptive operations on
//! one resource so that total tardiness is minimized, subject to release
//! times, due dates and a per-metering-interval energy cap, such that the
//! schedule stays energy-feasible even when every operation starts up to
//! `max_deviation` time units later than planned.
//!
//! ## Example
//!
//! ```rust
//! use enersched_core::Instance;
//!
//! let instance = Instance::new(
//!     vec![0, 0],          // release times
//!     vec![10, 12],        // due dates
//!     vec![3, 4],          // processing times
//!     vec![2.0, 1.5],      // power consumptions
//!     1,                   // max deviation
//!     4,                   // number of metering intervals
//!     5,                   // metering interval length
//!     vec![10.0; 4],       // energy caps
//!     Default::default(),  // metadata
//! ).unwrap();
//! assert_eq!(instance.horizon(), 20);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

mod config;
mod objective;
mod start_times;
mod stopwatch;

pub use config::{SolverConfig, SolverResult, SolverStatus, SpecializedConfig};
pub use objective::{ObjectiveKind, TotalTardiness};
pub use start_times::StartTimes;
pub use stopwatch::Stopwatch;

// ============================================================================
// Numeric helpers
// ============================================================================

/// Absolute tolerance for general floating-point comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Coarser tolerance used by the energy audit to flag gross cap violations.
pub const ENERGY_AUDIT_TOLERANCE: f64 = 0.1;

/// Length of the intersection of two half-open intervals `[start1, end1)` and
/// `[start2, end2)`.
pub fn interval_intersection(start1: i64, end1: i64, start2: i64, end2: i64) -> i64 {
    debug_assert!(start1 <= end1);
    debug_assert!(start2 <= end2);
    0.max(end1.min(end2) - start1.max(start2))
}

/// `x > y` beyond the given absolute tolerance.
pub fn is_greater(x: f64, y: f64, tolerance: f64) -> bool {
    x > y && (x - y).abs() > tolerance
}

/// `|x - y| <= tolerance`.
pub fn are_close(x: f64, y: f64, tolerance: f64) -> bool {
    (x - y).abs() <= tolerance
}

// ============================================================================
// Operation
// ============================================================================

/// A non-preemptive unit of work competing for the single resource.
///
/// Operations are referenced by their dense `index` everywhere in the engine;
/// the struct itself is immutable once the owning [`Instance`] is built.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Stable index in `[0, N)`
    pub index: usize,
    /// Earliest time the operation may start
    pub release_time: i64,
    /// Time by which the operation should complete
    pub due_date: i64,
    /// Processing time, at least 1
    pub processing_time: i64,
    /// Power drawn per unit of processing time, strictly positive
    pub power_consumption: f64,
}

// ============================================================================
// MeteringInterval
// ============================================================================

/// A fixed-length time window `[index*L, (index+1)*L)` whose total consumed
/// energy is capped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeteringInterval {
    /// Stable index in `[0, M)`
    pub index: usize,
    /// Inclusive start of the window
    pub start: i64,
    /// Exclusive end of the window
    pub end: i64,
    /// Energy cap over the window
    pub max_energy_consumption: f64,
}

// ============================================================================
// Instance
// ============================================================================

/// Errors raised when constructing an [`Instance`] from raw parameters.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("parameter vector {name} has length {actual}, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("operation {index} has release time {value}, must be non-negative")]
    NegativeReleaseTime { index: usize, value: i64 },

    #[error("operation {index} has processing time {value}, must be at least 1")]
    InvalidProcessingTime { index: usize, value: i64 },

    #[error("operation {index} has power consumption {value}, must be positive")]
    InvalidPowerConsumption { index: usize, value: f64 },

    #[error("metering interval {index} has energy cap {value}, must be non-negative")]
    NegativeEnergyCap { index: usize, value: f64 },

    #[error("metering interval length is {0}, must be at least 1")]
    InvalidIntervalLength(i64),

    #[error("maximum deviation is {0}, must be non-negative")]
    NegativeMaxDeviation(i64),
}

/// A complete, immutable problem description.
///
/// Owns the operations and metering intervals in dense vectors; every other
/// component refers to them by index and borrows the instance immutably.
#[derive(Clone, Debug)]
pub struct Instance {
    operations: Vec<Operation>,
    metering_intervals: Vec<MeteringInterval>,
    interval_length: i64,
    max_deviation: i64,
    horizon: i64,
    max_start_time: i64,
    metadata: BTreeMap<String, String>,
}

impl Instance {
    /// Build and validate an instance from raw parameter vectors.
    ///
    /// The number of operations is the length of `release_times`; all other
    /// operation vectors must match it, and `max_energy_consumptions` must
    /// have one entry per metering interval.
    pub fn new(
        release_times: Vec<i64>,
        due_dates: Vec<i64>,
        processing_times: Vec<i64>,
        power_consumptions: Vec<f64>,
        max_deviation: i64,
        num_metering_intervals: usize,
        interval_length: i64,
        max_energy_consumptions: Vec<f64>,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, InstanceError> {
        let n = release_times.len();
        for (name, len) in [
            ("dueDates", due_dates.len()),
            ("processingTimes", processing_times.len()),
            ("powerConsumptions", power_consumptions.len()),
        ] {
            if len != n {
                return Err(InstanceError::LengthMismatch {
                    name,
                    expected: n,
                    actual: len,
                });
            }
        }
        if max_energy_consumptions.len() != num_metering_intervals {
            return Err(InstanceError::LengthMismatch {
                name: "maxEnergyConsumptions",
                expected: num_metering_intervals,
                actual: max_energy_consumptions.len(),
            });
        }
        if interval_length < 1 {
            return Err(InstanceError::InvalidIntervalLength(interval_length));
        }
        if max_deviation < 0 {
            return Err(InstanceError::NegativeMaxDeviation(max_deviation));
        }

        let mut operations = Vec::with_capacity(n);
        for index in 0..n {
            if release_times[index] < 0 {
                return Err(InstanceError::NegativeReleaseTime {
                    index,
                    value: release_times[index],
                });
            }
            if processing_times[index] < 1 {
                return Err(InstanceError::InvalidProcessingTime {
                    index,
                    value: processing_times[index],
                });
            }
            if power_consumptions[index] <= 0.0 {
                return Err(InstanceError::InvalidPowerConsumption {
                    index,
                    value: power_consumptions[index],
                });
            }
            operations.push(Operation {
                index,
                release_time: release_times[index],
                due_date: due_dates[index],
                processing_time: processing_times[index],
                power_consumption: power_consumptions[index],
            });
        }

        let mut metering_intervals = Vec::with_capacity(num_metering_intervals);
        for index in 0..num_metering_intervals {
            if max_energy_consumptions[index] < 0.0 {
                return Err(InstanceError::NegativeEnergyCap {
                    index,
                    value: max_energy_consumptions[index],
                });
            }
            metering_intervals.push(MeteringInterval {
                index,
                start: index as i64 * interval_length,
                end: (index as i64 + 1) * interval_length,
                max_energy_consumption: max_energy_consumptions[index],
            });
        }

        let horizon = num_metering_intervals as i64 * interval_length;
        let max_processing_time = operations
            .iter()
            .map(|o| o.processing_time)
            .max()
            .unwrap_or(0);
        let max_start_time = horizon - (max_processing_time + n as i64 * max_deviation);

        Ok(Self {
            operations,
            metering_intervals,
            interval_length,
            max_deviation,
            horizon,
            max_start_time,
            metadata,
        })
    }

    pub fn num_operations(&self) -> usize {
        self.operations.len()
    }

    pub fn num_metering_intervals(&self) -> usize {
        self.metering_intervals.len()
    }

    pub fn operation(&self, index: usize) -> &Operation {
        &self.operations[index]
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn metering_interval(&self, index: usize) -> &MeteringInterval {
        &self.metering_intervals[index]
    }

    pub fn metering_intervals(&self) -> &[MeteringInterval] {
        &self.metering_intervals
    }

    pub fn interval_length(&self) -> i64 {
        self.interval_length
    }

    pub fn max_deviation(&self) -> i64 {
        self.max_deviation
    }

    /// End of the metered time range, `M * L`.
    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    /// Largest start time any operation may hold in a robust schedule,
    /// `horizon - (max processing time + N * max deviation)`.
    ///
    /// Negative for instances where no robust schedule can fit the horizon.
    pub fn max_start_time(&self) -> i64 {
        self.max_start_time
    }

    /// Index of the metering interval containing `time`, or `None` past the
    /// horizon.
    pub fn interval_containing(&self, time: i64) -> Option<usize> {
        let index = (time / self.interval_length) as usize;
        (index < self.metering_intervals.len()).then_some(index)
    }

    /// Index of the last metering interval with non-empty intersection with a
    /// work span ending at `completion_time`, or `None` past the horizon.
    pub fn last_interval_touching(&self, completion_time: i64) -> Option<usize> {
        let index = ((completion_time - 1) / self.interval_length) as usize;
        (index < self.metering_intervals.len()).then_some(index)
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn collect_release_times(&self) -> Vec<i64> {
        self.operations.iter().map(|o| o.release_time).collect()
    }

    pub fn collect_due_dates(&self) -> Vec<i64> {
        self.operations.iter().map(|o| o.due_date).collect()
    }

    pub fn collect_processing_times(&self) -> Vec<i64> {
        self.operations.iter().map(|o| o.processing_time).collect()
    }

    pub fn collect_power_consumptions(&self) -> Vec<f64> {
        self.operations.iter().map(|o| o.power_consumption).collect()
    }

    pub fn collect_max_energy_consumptions(&self) -> Vec<f64> {
        self.metering_intervals
            .iter()
            .map(|m| m.max_energy_consumption)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
