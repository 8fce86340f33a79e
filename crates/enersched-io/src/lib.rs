//! # enersched-io
//!
//! On-disk JSON formats of the enersched engine:
//!
//! - **instance files** describing a scheduling problem, with scalar fields
//!   expanding to constant vectors;
//! - **result files** carrying a solver outcome with stable status codes;
//! - **solver prescriptions** selecting and parameterizing a solver stage.
//!
//! All readers are strict about schema (unknown status codes and malformed
//! documents are errors), all writers emit full arrays.

use enersched_core::InstanceError;
use thiserror::Error;

mod instance;
mod prescription;
mod result;

pub use instance::{read_instance, write_instance};
pub use prescription::{read_prescription, SolverPrescription};
pub use result::{read_result, write_result};

/// Errors crossing the file boundary.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid instance: {0}")]
    Instance(#[from] InstanceError),

    #[error("unknown solver status code {0}")]
    UnknownStatusCode(u8),
}
