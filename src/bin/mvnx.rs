//! Command-line interface for mvnx
//! Parses an MVNX recording and writes the outputs consumed by downstream
//! modeling tools: a metadata log, a calibration-only markup round-trip and
//! delimited frame-data tables.
//!
//! Usage:
//!   mvnx `<file>` [--output-folder `<dir>`] [--separator `<char>`]
//!        [--runtime-data-only] [--model-creation-data-only]

use clap::{Arg, ArgAction, Command};
use log::{Level, LevelFilter, Metadata, Record};
use std::path::{Path, PathBuf};

use mvnx::mvnx::output::OutputField;
use mvnx::MvnxReader;

/// Fields required to build the biomechanical model.
const MODEL_CREATION_FIELDS: [OutputField; 6] = [
    OutputField::LinkAcceleration,
    OutputField::LinkOrientation,
    OutputField::LinkAngularVelocity,
    OutputField::LinkAngularAcceleration,
    OutputField::SensorOrientation,
    OutputField::SensorFreeBodyAcceleration,
];

/// Lightweight subset for runtime computation.
const RUNTIME_FIELDS: [OutputField; 1] = [OutputField::SensorFreeBodyAcceleration];

/// Minimal stderr logger so library warnings reach the user.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Info));

    let matches = Command::new("mvnx")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for converting MVNX motion-capture recordings")
        .arg(
            Arg::new("path")
                .help("Path to the MVNX file to parse")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output-folder")
                .long("output-folder")
                .help("Save parser outputs in this directory")
                .default_value("outputData"),
        )
        .arg(
            Arg::new("separator")
                .long("separator")
                .short('s')
                .help("Field separator for the delimited outputs")
                .default_value(","),
        )
        .arg(
            Arg::new("runtime-data-only")
                .long("runtime-data-only")
                .help("Only write the runtime frame-data table")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("model-creation-data-only")
                .long("model-creation-data-only")
                .help("Only write the model-creation outputs")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let path = matches.get_one::<String>("path").unwrap();
    let output_folder = matches.get_one::<String>("output-folder").unwrap();
    let separator = matches
        .get_one::<String>("separator")
        .and_then(|s| s.chars().next())
        .unwrap_or(',');
    let runtime_only = matches.get_flag("runtime-data-only");
    let model_only = matches.get_flag("model-creation-data-only");

    if let Err(e) = run(path, output_folder, separator, runtime_only, model_only) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(
    path: &str,
    output_folder: &str,
    separator: char,
    runtime_only: bool,
    model_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = Path::new(path);
    let base = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let folder = PathBuf::from(output_folder);
    std::fs::create_dir_all(&folder)?;

    let reader = MvnxReader::from_file(input)?;

    if !runtime_only {
        std::fs::write(
            folder.join(format!("{base}.log")),
            reader.write_calibration_log(separator),
        )?;
        std::fs::write(
            folder.join(format!("{base}.xml")),
            reader.write_calibration_roundtrip(),
        )?;
        std::fs::write(
            folder.join(format!("{base}.csv")),
            reader.write_table(&MODEL_CREATION_FIELDS, separator),
        )?;
    }

    if !model_only {
        std::fs::write(
            folder.join(format!("{base}_runtime.csv")),
            reader.write_table(&RUNTIME_FIELDS, separator),
        )?;
    }

    Ok(())
}
