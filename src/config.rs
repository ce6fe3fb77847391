//! # Tuner configuration
//!
//! Camera indices, file locations and window geometry. Loaded from an optional JSON file, with
//! any field left out taking its default value.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::*;
use crate::params::{DisparityParams, SliderPositions};
use crate::store;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    pub left_camera: i32,
    pub right_camera: i32,

    /// Rectification maps written by the calibration tool.
    pub calibration: PathBuf,

    /// Where the tuned parameter record is written on exit.
    pub output: PathBuf,

    /// A previously saved record used to seed the sliders.
    pub initial_params: Option<PathBuf>,

    /// Inline seed parameters, used when `initial_params` is not set.
    pub params: Option<DisparityParams>,

    pub snapshot_dir: PathBuf,
    pub window: WindowConfig
}

/// Size of the control window holding the trackbars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: i32,
    pub height: i32
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            left_camera: 0,
            right_camera: 1,
            calibration: PathBuf::from("data/params_py.xml"),
            output: PathBuf::from("data/depth_params.xml"),
            initial_params: None,
            params: None,
            snapshot_dir: PathBuf::from("snapshots"),
            window: WindowConfig::default()
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400
        }
    }
}

impl TunerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json(&s)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Reject parameter file paths whose extension is not a known record format.
    pub fn validate(&self) -> Result<()> {
        store::Format::from_path(&self.output)?;
        if let Some(path) = &self.initial_params {
            store::Format::from_path(path)?;
        }
        Ok(())
    }

    /// Slider positions to start the session with.
    ///
    /// A saved record takes precedence over inline parameters, which take precedence over the
    /// trackbar defaults.
    pub fn seed_positions(&self) -> Result<SliderPositions> {
        if let Some(path) = &self.initial_params {
            let params = store::load(path)?;
            return Ok(SliderPositions::from_params(&params));
        }

        Ok(match &self.params {
            Some(params) => SliderPositions::from_params(params),
            None => SliderPositions::default()
        })
    }
}
