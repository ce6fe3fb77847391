//! # Error standards
//! 
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the disparity tuner crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("Could not load rectification maps from {path:?}: {reason}")]
    Calibration {
        path: PathBuf,
        reason: String
    },

    #[error("Parameter record is missing the key \"{key}\"")]
    MissingKey {
        key: &'static str
    },

    #[error("Parameter record has an out of range value for \"{key}\": {value}")]
    InvalidValue {
        key: &'static str,
        value: f64
    },

    #[error("Unknown parameter file format for {0:?}, expected .xml, .yml, .yaml or .json")]
    UnknownFormat(PathBuf),

    #[error("Could not open parameter file {0:?}")]
    ParamFile(PathBuf),

    #[error("Invalid tuner configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not write snapshot: {0}")]
    Image(#[from] image::ImageError)
}
