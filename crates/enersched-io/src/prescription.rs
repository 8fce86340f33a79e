//! Solver prescriptions.
//!
//! ```json
//! { "timeLimitInMilliseconds": 60000,
//!   "previousStage": "results/greedy.json",
//!   "initStartTimes": [0, 3],
//!   "solverStage": { "name": "TabuSearch",
//!                    "cfg": { "numRestarts": "10" } } }
//! ```
//!
//! `timeLimitInMilliseconds` defaults to effectively unlimited. When
//! `initStartTimes` is present it is used unless `useInitStartTimes` says
//! otherwise. `previousStage`, when non-empty, names the result file of an
//! earlier stage whose schedule warm-starts this one.

use crate::IoError;
use enersched_core::{ObjectiveKind, SolverConfig, StartTimes};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolverStageDocument {
    name: String,
    #[serde(default)]
    cfg: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrescriptionDocument {
    #[serde(default)]
    time_limit_in_milliseconds: Option<u64>,
    #[serde(default)]
    previous_stage: Option<String>,
    #[serde(default)]
    init_start_times: Option<Vec<i64>>,
    #[serde(default)]
    use_init_start_times: Option<bool>,
    solver_stage: SolverStageDocument,
}

/// A parsed prescription: which solver to run and how.
#[derive(Clone, Debug)]
pub struct SolverPrescription {
    pub solver_name: String,
    /// Result file of the preceding stage, if any.
    pub previous_stage: Option<String>,
    pub config: SolverConfig,
}

pub fn read_prescription(path: &Path) -> Result<SolverPrescription, IoError> {
    let text = fs::read_to_string(path)?;
    let doc: PrescriptionDocument = serde_json::from_str(&text)?;

    let time_limit = doc
        .time_limit_in_milliseconds
        .map_or(Duration::MAX, Duration::from_millis);

    let mut config = SolverConfig::new(time_limit, ObjectiveKind::TotalTardiness);
    if let Some(init_start_times) = doc.init_start_times {
        if doc.use_init_start_times.unwrap_or(true) {
            config = config.with_warm_start(StartTimes::from_vec(init_start_times));
        }
    }
    for (key, value) in doc.solver_stage.cfg {
        config
            .specialized
            .set_str(&doc.solver_stage.name, &key, value);
    }

    Ok(SolverPrescription {
        solver_name: doc.solver_stage.name,
        previous_stage: doc.previous_stage.filter(|stage| !stage.is_empty()),
        config,
    })
}
