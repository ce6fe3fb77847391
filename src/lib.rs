//! # Disparity Tuning
//!
//! This crate provides an interactive tuner for stereo block matching disparity parameters.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod block_matcher;
pub mod camstream;
pub mod config;
mod disparity;
mod error;
pub mod params;
pub mod rectify;
pub mod session;
pub mod store;
pub mod ui;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use crate::error::{Error, Result};

pub mod prelude {
    pub use crate::disparity::{
        luma_from_fixed_point, DisparityAlgorithm, DisparityMap, DisparityOutput
    };
    pub use crate::params::{DisparityParams, PreFilterType, SliderPositions, Trackbar};
}
