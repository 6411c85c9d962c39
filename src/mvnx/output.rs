//! Output rendering for downstream biomechanical-model tooling
//!
//! Two surfaces: delimited tabular text for the live-capture frames
//! ([`table`]) and a structural re-serialization of the calibration subtree
//! plus a metadata log ([`calibration`]).

pub mod calibration;
pub mod table;

pub use calibration::{write_calibration_log, write_calibration_roundtrip};
pub use table::{write_table, OutputField};
