//! # Stereo rectification
//!
//! Loads the per-axis rectification maps produced by the calibration tool and remaps captured
//! frames with them.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use opencv::core::{FileStorage, FileStorage_READ, Mat, Scalar, Size, BORDER_CONSTANT};
use opencv::imgproc::{cvt_color_def, remap, COLOR_BGR2GRAY, INTER_LANCZOS4};
use opencv::prelude::*;
use tracing::info;

use crate::camstream::StereoFrame;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

pub const LEFT_MAP_X: &str = "Left_Stereo_Map_x";
pub const LEFT_MAP_Y: &str = "Left_Stereo_Map_y";
pub const RIGHT_MAP_X: &str = "Right_Stereo_Map_x";
pub const RIGHT_MAP_Y: &str = "Right_Stereo_Map_y";

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Lookup tables mapping rectified pixel coordinates back into each raw image.
pub struct RectificationMaps {
    left_x: Mat,
    left_y: Mat,
    right_x: Mat,
    right_y: Mat
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl RectificationMaps {
    /// Load the maps from a `FileStorage` file.
    ///
    /// A missing file, a missing or empty map, or x/y maps of different sizes are all reported
    /// as [`Error::Calibration`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let fail = |reason: String| Error::Calibration {
            path: path.to_path_buf(),
            reason
        };

        if !path.is_file() {
            return Err(fail("file does not exist".into()));
        }

        let path_str = path.to_str().ok_or_else(|| fail("path is not valid UTF-8".into()))?;
        let fs = FileStorage::new_def(path_str, FileStorage_READ)
            .map_err(|e| fail(e.message))?;
        if !fs.is_opened()? {
            return Err(fail("file could not be opened".into()));
        }

        let read_map = |name: &str| -> Result<Mat> {
            let node = fs.get(name)?;
            if node.is_none()? {
                return Err(fail(format!("missing node {}", name)));
            }
            let mat = node.mat().map_err(|e| fail(format!("{}: {}", name, e.message)))?;
            if mat.empty() {
                return Err(fail(format!("node {} is empty", name)));
            }
            Ok(mat)
        };

        let maps = Self {
            left_x: read_map(LEFT_MAP_X)?,
            left_y: read_map(LEFT_MAP_Y)?,
            right_x: read_map(RIGHT_MAP_X)?,
            right_y: read_map(RIGHT_MAP_Y)?
        };

        if maps.left_x.size()? != maps.left_y.size()? {
            return Err(fail("left x and y maps differ in size".into()));
        }
        if maps.right_x.size()? != maps.right_y.size()? {
            return Err(fail("right x and y maps differ in size".into()));
        }

        let size = maps.frame_size()?;
        info!(
            "Loaded rectification maps from {} ({}x{})",
            path.display(),
            size.width,
            size.height
        );

        Ok(maps)
    }

    /// Size of the rectified left image.
    pub fn frame_size(&self) -> Result<Size> {
        Ok(self.left_x.size()?)
    }

    /// Convert both images to grayscale and rectify them.
    pub fn rectify(&self, frame: &StereoFrame) -> Result<StereoFrame> {
        let left = remap_gray(&frame.left, &self.left_x, &self.left_y)?;
        let right = remap_gray(&frame.right, &self.right_x, &self.right_y)?;

        Ok(StereoFrame {
            left,
            right,
            timestamp: frame.timestamp
        })
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn to_gray(img: &Mat) -> Result<Mat> {
    if img.channels() == 1 {
        return Ok(img.try_clone()?);
    }

    let mut gray = Mat::default();
    cvt_color_def(img, &mut gray, COLOR_BGR2GRAY)?;
    Ok(gray)
}

fn remap_gray(img: &Mat, map_x: &Mat, map_y: &Mat) -> Result<Mat> {
    let gray = to_gray(img)?;
    let mut rect = Mat::default();

    remap(
        &gray,
        &mut rect,
        map_x,
        map_y,
        INTER_LANCZOS4,
        BORDER_CONSTANT,
        Scalar::all(0.0)
    )?;

    Ok(rect)
}
