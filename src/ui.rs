//! # Operator interface
//!
//! The control window with one trackbar per parameter, the two disparity display windows and
//! keyboard polling.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use opencv::highgui::{
    create_trackbar, destroy_all_windows, get_trackbar_pos, imshow, named_window, resize_window,
    set_trackbar_min, set_trackbar_pos, wait_key, WINDOW_NORMAL
};

use crate::config::WindowConfig;
use crate::disparity::DisparityOutput;
use crate::error::*;
use crate::params::SliderPositions;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

pub const CONTROL_WINDOW: &str = "disp";
pub const DISPARITY_WINDOW: &str = "disparity map";
pub const FILTERED_WINDOW: &str = "filtered disparity map";

const KEY_ESC: i32 = 27;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Owns the highgui windows, which are destroyed when the panel is dropped.
pub struct ControlPanel(());

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Nothing pressed, or a key with no binding.
    Other,
    Exit,
    Snapshot
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl ControlPanel {
    /// Open the control window and create the trackbars at the given positions.
    pub fn create(window: &WindowConfig, initial: &SliderPositions) -> Result<Self> {
        named_window(CONTROL_WINDOW, WINDOW_NORMAL)?;
        resize_window(CONTROL_WINDOW, window.width, window.height)?;

        for (bar, pos) in initial.clamped().iter() {
            let spec = bar.spec();
            create_trackbar(spec.name, CONTROL_WINDOW, None, spec.max, None)?;
            set_trackbar_min(spec.name, CONTROL_WINDOW, spec.min)?;
            set_trackbar_pos(spec.name, CONTROL_WINDOW, pos)?;
        }

        Ok(ControlPanel(()))
    }

    /// Read every trackbar's current position.
    pub fn positions(&self) -> Result<SliderPositions> {
        Ok(SliderPositions::try_from_fn(|bar| {
            get_trackbar_pos(bar.name(), CONTROL_WINDOW)
        })?)
    }

    /// Display the raw and filtered disparity maps.
    pub fn show(&self, output: &DisparityOutput) -> Result<()> {
        imshow(DISPARITY_WINDOW, &output.raw.to_colour_map()?)?;
        imshow(FILTERED_WINDOW, &output.filtered.to_colour_map()?)?;
        Ok(())
    }

    /// Wait up to `delay_ms` for a key press. This also services the highgui event loop.
    pub fn poll_key(&self, delay_ms: i32) -> Result<Key> {
        Ok(key_from_code(wait_key(delay_ms)?))
    }
}

impl Drop for ControlPanel {
    fn drop(&mut self) {
        let _ = destroy_all_windows();
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Map a `wait_key` code to a key binding.
pub fn key_from_code(code: i32) -> Key {
    if code < 0 {
        return Key::Other;
    }

    match code & 0xff {
        KEY_ESC => Key::Exit,
        c if c == i32::from(b's') || c == i32::from(b'S') => Key::Snapshot,
        _ => Key::Other
    }
}
