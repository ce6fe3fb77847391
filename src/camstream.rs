//! # Stereo camera stream
//!
//! Opens the left and right cameras by device index and captures frame pairs from them.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::time::Instant;

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{VideoCapture, CAP_ANY};
use tracing::{info, warn};

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A pair of images captured from the left and right cameras.
#[derive(Debug, Clone)]
pub struct StereoFrame {
    pub left: Mat,
    pub right: Mat,
    pub timestamp: Instant
}

pub struct StereoCamera {
    left_index: i32,
    right_index: i32,
    left: VideoCapture,
    right: VideoCapture,
    reopen_count: u64
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl StereoFrame {
    pub fn new(left: Mat, right: Mat) -> Self {
        Self {
            left,
            right,
            timestamp: Instant::now()
        }
    }

    pub fn width(&self) -> i32 {
        self.left.cols()
    }

    pub fn height(&self) -> i32 {
        self.left.rows()
    }
}

impl StereoCamera {
    /// Open both cameras.
    ///
    /// A device that is not available yet is only warned about. Capturing from it fails and the
    /// session loop re-opens both streams until it appears.
    pub fn open(left_index: i32, right_index: i32) -> Result<Self> {
        let left = open_capture(left_index)?;
        let right = open_capture(right_index)?;

        info!("Opened stereo cameras (left: {}, right: {})", left_index, right_index);

        Ok(Self {
            left_index,
            right_index,
            left,
            right,
            reopen_count: 0
        })
    }

    /// Capture a frame from each camera.
    ///
    /// Returns `None` if either camera fails to deliver a frame, including when the read itself
    /// raises an OpenCV error.
    pub fn capture(&mut self) -> Option<StereoFrame> {
        let mut left = Mat::default();
        let mut right = Mat::default();

        let left_ok = read_frame(&mut self.left, self.left_index, &mut left);
        let right_ok = read_frame(&mut self.right, self.right_index, &mut right);

        if !left_ok || !right_ok || left.empty() || right.empty() {
            return None;
        }

        Some(StereoFrame::new(left, right))
    }

    /// Drop and re-open both cameras.
    ///
    /// Never fails. Errors are logged and the next [`StereoCamera::capture`] will simply fail
    /// again if the devices did not come back.
    pub fn reopen(&mut self) {
        self.reopen_count += 1;
        warn!(
            "Camera read failed, re-opening cameras {} and {} (attempt {})",
            self.left_index,
            self.right_index,
            self.reopen_count
        );

        reopen_capture(&mut self.left, self.left_index);
        reopen_capture(&mut self.right, self.right_index);
    }

    /// Number of times the cameras have been re-opened since the last good frame.
    pub fn reopen_count(&self) -> u64 {
        self.reopen_count
    }

    /// Reset the re-open counter, called once a frame has been captured successfully.
    pub fn mark_healthy(&mut self) {
        if self.reopen_count > 0 {
            info!("Cameras recovered after {} re-open(s)", self.reopen_count);
        }
        self.reopen_count = 0;
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn open_capture(index: i32) -> Result<VideoCapture> {
    let cap = VideoCapture::new(index, CAP_ANY)?;
    if !cap.is_opened()? {
        warn!("Camera {} is not available, will keep re-opening it", index);
    }
    Ok(cap)
}

fn read_frame(cap: &mut VideoCapture, index: i32, frame: &mut Mat) -> bool {
    match cap.read(frame) {
        Ok(ok) => ok,
        Err(e) => {
            warn!("Camera {} read error: {}", index, e);
            false
        }
    }
}

fn reopen_capture(cap: &mut VideoCapture, index: i32) {
    if let Err(e) = cap.release() {
        warn!("Camera {} release error: {}", index, e);
    }

    match VideoCapture::new(index, CAP_ANY) {
        Ok(new) => *cap = new,
        Err(e) => warn!("Camera {} could not be re-opened: {}", index, e)
    }
}
