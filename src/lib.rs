//! # mvnx
//!
//! A parser for the MVNX motion-capture format.
//!
//! An MVNX document describes one recording session: the subject's segment,
//! sensor and joint definitions, followed by a time-ordered sequence of
//! pose/sensor frames. This crate builds a generic attributed tree from the
//! markup, resolves the element-name differences between the two supported
//! format revisions, extracts typed per-frame records, and renders the
//! tabular and calibration round-trip outputs consumed by downstream
//! biomechanical-model tooling.
//!
//! ## Quick start
//!
//! ```ignore
//! use mvnx::mvnx::output::OutputField;
//! use mvnx::mvnx::reader::MvnxReader;
//!
//! let reader = MvnxReader::from_file("recording.mvnx")?;
//! let csv = reader.write_table(&[OutputField::LinkPosition], ',');
//! let calibration = reader.write_calibration_roundtrip();
//! ```

pub mod mvnx;

pub use crate::mvnx::reader::MvnxReader;
pub use crate::mvnx::MvnxError;
