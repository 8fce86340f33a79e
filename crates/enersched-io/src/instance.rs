//! Instance files.
//!
//! ```json
//! { "numOperations": 2, "releaseTimes": [0, 3], "dueDates": 10,
//!   "processingTimes": [2, 4], "powerConsumptions": 1.5,
//!   "maxDeviation": 1, "numMeteringIntervals": 4,
//!   "lengthMeteringInterval": 5, "maxEnergyConsumptions": [8, 8, 8, 8],
//!   "metadata": {"family": "2016B-1"} }
//! ```
//!
//! A scalar at any vector field expands to a constant vector of the expected
//! length.

use crate::IoError;
use enersched_core::Instance;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A field that may hold either one value for all entries or one value per
/// entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ScalarOrVec<T> {
    Scalar(T),
    Vec(Vec<T>),
}

impl<T: Clone> ScalarOrVec<T> {
    fn expand(self, len: usize) -> Vec<T> {
        match self {
            ScalarOrVec::Scalar(value) => vec![value; len],
            ScalarOrVec::Vec(values) => values,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceDocument {
    num_operations: usize,
    release_times: ScalarOrVec<i64>,
    due_dates: ScalarOrVec<i64>,
    processing_times: ScalarOrVec<i64>,
    power_consumptions: ScalarOrVec<f64>,
    max_deviation: i64,
    num_metering_intervals: usize,
    length_metering_interval: i64,
    max_energy_consumptions: ScalarOrVec<f64>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

pub fn read_instance(path: &Path) -> Result<Instance, IoError> {
    let text = fs::read_to_string(path)?;
    let doc: InstanceDocument = serde_json::from_str(&text)?;

    let n = doc.num_operations;
    let m = doc.num_metering_intervals;
    Ok(Instance::new(
        doc.release_times.expand(n),
        doc.due_dates.expand(n),
        doc.processing_times.expand(n),
        doc.power_consumptions.expand(n),
        doc.max_deviation,
        m,
        doc.length_metering_interval,
        doc.max_energy_consumptions.expand(m),
        doc.metadata,
    )?)
}

pub fn write_instance(instance: &Instance, path: &Path) -> Result<(), IoError> {
    let doc = InstanceDocument {
        num_operations: instance.num_operations(),
        release_times: ScalarOrVec::Vec(instance.collect_release_times()),
        due_dates: ScalarOrVec::Vec(instance.collect_due_dates()),
        processing_times: ScalarOrVec::Vec(instance.collect_processing_times()),
        power_consumptions: ScalarOrVec::Vec(instance.collect_power_consumptions()),
        max_deviation: instance.max_deviation(),
        num_metering_intervals: instance.num_metering_intervals(),
        length_metering_interval: instance.interval_length(),
        max_energy_consumptions: ScalarOrVec::Vec(instance.collect_max_energy_consumptions()),
        metadata: instance.metadata().clone(),
    };
    fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}
