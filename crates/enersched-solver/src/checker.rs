//! Adversarial robustness checking.
//!
//! Given baseline start times, the adversary may delay each operation by up
//! to the instance's maximum deviation, applied in permutation order. The
//! checker walks the monotone right-shift lattice bounded by the latest
//! start times: it repeatedly delays the scan-front operation by one unit
//! and propagates the push forward, auditing the energy caps after every
//! step. Every step strictly increases the sum of realised start times, so
//! the walk terminates; if it ever finds a violated cap it reconstructs the
//! witnessing delay vector.

use enersched_core::{Instance, StartTimes};

/// Outcome of a robustness check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RobustnessVerdict {
    /// Every realization respects every energy cap.
    Robust,
    /// Some realization violates a cap; the witness is attached.
    Violated {
        /// First violated metering interval, by index.
        interval_index: usize,
        /// Per-operation delay vector realizing the violation.
        scenario: Vec<i64>,
    },
}

impl RobustnessVerdict {
    pub fn is_robust(&self) -> bool {
        matches!(self, RobustnessVerdict::Robust)
    }
}

/// Ground-truth oracle for schedules produced by any solver.
pub struct RobustnessChecker<'a> {
    instance: &'a Instance,
    latest_start_times: StartTimes,
}

impl<'a> RobustnessChecker<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        Self {
            instance,
            latest_start_times: StartTimes::zeroed(instance.num_operations()),
        }
    }

    /// Convenience wrapper discarding the witness.
    pub fn is_robust(&mut self, start_times: &StartTimes) -> bool {
        self.check(start_times).is_robust()
    }

    /// Search for a cap-violating realization of `start_times`.
    pub fn check(&mut self, start_times: &StartTimes) -> RobustnessVerdict {
        let ins = self.instance;
        let n = ins.num_operations();
        let ordered = start_times.ordered_permutation();
        start_times.latest_start_times(ins, &ordered, &mut self.latest_start_times);

        let mut realised = start_times.clone();
        let mut front = 0;
        while front < n {
            if let Some(interval_index) = realised.violated_interval(ins) {
                // Reconstruct the delay vector behind the current
                // realization: everything before the front is maximally
                // delayed, the front itself partially.
                let mut scenario = vec![0; n];
                for position in 0..front {
                    scenario[ordered[position]] = ins.max_deviation();
                }
                let front_operation = ordered[front];
                scenario[front_operation] = ins.max_deviation()
                    - (self.latest_start_times[front_operation] - realised[front_operation]);

                return RobustnessVerdict::Violated {
                    interval_index,
                    scenario,
                };
            }

            let front_operation = ordered[front];
            if realised[front_operation] + 1 > self.latest_start_times[front_operation] {
                front += 1;
            } else {
                realised[front_operation] += 1;
                let mut position = front + 1;
                while position < n {
                    let operation = ordered[position];
                    let prev = ordered[position - 1];
                    if realised[prev] + ins.operation(prev).processing_time <= realised[operation] {
                        break;
                    }
                    realised[operation] += 1;
                    position += 1;
                }
            }
        }

        RobustnessVerdict::Robust
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn nominal_violation_needs_no_delays() {
        // Two operations of 12 energy each against a single cap of 18: the
        // baseline schedule itself already violates the cap.
        let ins = Instance::new(
            vec![0, 0],
            vec![10, 10],
            vec![3, 3],
            vec![4.0, 4.0],
            0,
            1,
            6,
            vec![18.0],
            BTreeMap::new(),
        )
        .unwrap();
        let mut checker = RobustnessChecker::new(&ins);

        let verdict = checker.check(&StartTimes::from_vec(vec![0, 3]));
        assert_eq!(
            verdict,
            RobustnessVerdict::Violated {
                interval_index: 0,
                scenario: vec![0, 0],
            }
        );
    }

    #[test]
    fn ample_capacity_is_robust() {
        let ins = Instance::new(
            vec![0, 0],
            vec![10, 10],
            vec![3, 3],
            vec![1.0, 1.0],
            2,
            4,
            5,
            vec![100.0; 4],
            BTreeMap::new(),
        )
        .unwrap();
        let mut checker = RobustnessChecker::new(&ins);
        assert!(checker.is_robust(&StartTimes::from_vec(vec![0, 3])));
    }

    #[test]
    fn delay_induced_violation_is_found_with_witness() {
        // Nominally op 0 burns in interval 0 only; one unit of delay drags
        // its footprint into the nearly-capless interval 1.
        let ins = Instance::new(
            vec![0, 8],
            vec![20, 20],
            vec![4, 2],
            vec![3.0, 1.0],
            1,
            3,
            4,
            vec![100.0, 2.0, 100.0],
            BTreeMap::new(),
        )
        .unwrap();
        let mut checker = RobustnessChecker::new(&ins);

        let s = StartTimes::from_vec(vec![0, 8]);
        let verdict = checker.check(&s);
        let RobustnessVerdict::Violated {
            interval_index,
            scenario,
        } = verdict
        else {
            panic!("expected a violation");
        };
        assert_eq!(interval_index, 1);
        assert_eq!(scenario, vec![1, 0]);

        // The witness must reproduce the violation it claims.
        let ordered = s.ordered_permutation();
        let mut realised = StartTimes::zeroed(2);
        s.realised_start_times(&ins, &ordered, &scenario, &mut realised);
        assert_eq!(realised.violated_interval(&ins), Some(1));
    }
}
