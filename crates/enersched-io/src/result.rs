//! Result files.
//!
//! ```json
//! { "status": 1, "startTimes": [0, 3], "objectiveValue": 4.0,
//!   "solverRuntimeInMilliseconds": 12, "optional": {} }
//! ```
//!
//! Status codes are stable: 0 no solution, 1 optimal, 2 infeasible,
//! 3 feasible.

use crate::IoError;
use enersched_core::{SolverResult, SolverStatus, StartTimes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultDocument {
    status: u8,
    start_times: Vec<i64>,
    objective_value: f64,
    solver_runtime_in_milliseconds: u64,
    #[serde(default)]
    optional: BTreeMap<String, String>,
}

pub fn read_result(path: &Path) -> Result<SolverResult, IoError> {
    let text = fs::read_to_string(path)?;
    let doc: ResultDocument = serde_json::from_str(&text)?;

    let status =
        SolverStatus::from_code(doc.status).ok_or(IoError::UnknownStatusCode(doc.status))?;
    Ok(SolverResult {
        status,
        start_times: StartTimes::from_vec(doc.start_times),
        objective_value: doc.objective_value,
        runtime: Duration::from_millis(doc.solver_runtime_in_milliseconds),
        optional: doc.optional,
    })
}

pub fn write_result(result: &SolverResult, path: &Path) -> Result<(), IoError> {
    let doc = ResultDocument {
        status: result.status.code(),
        start_times: result.start_times.as_slice().to_vec(),
        objective_value: result.objective_value,
        solver_runtime_in_milliseconds: u64::try_from(result.runtime.as_millis())
            .unwrap_or(u64::MAX),
        optional: result.optional.clone(),
    };
    fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}
