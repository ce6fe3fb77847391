//! # General disparity objects
//!
//! This module provides the disparity map type and the trait implemented by disparity
//! algorithms driven by the tuner.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;
use opencv::core::{no_array, normalize, Mat, CV_16S, CV_16SC1, CV_32F, CV_8UC1, NORM_MINMAX};
use opencv::imgproc::{apply_color_map, COLORMAP_JET};
use opencv::prelude::*;

use crate::camstream::StereoFrame;
use crate::error::*;
use crate::params::{DisparityParams, DISPARITY_SCALE};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A fixed point (`CV_16S`, disparity × 16) disparity map.
pub struct DisparityMap {
    data: Mat,
    pub min_disp: i32,
    pub num_disp: i32
}

/// The maps produced for one stereo frame.
pub struct DisparityOutput {
    /// Left-to-right block matching result.
    pub raw: DisparityMap,

    /// Raw map after WLS filtering.
    pub filtered: DisparityMap
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Push a new set of parameters into the algorithm.
    fn apply(&mut self, params: &DisparityParams) -> Result<()>;

    /// Compute the disparity maps of the given rectified stereo frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityOutput>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMap {
    pub fn new(data: Mat, min_disp: i32, num_disp: i32) -> Self {
        DisparityMap {
            data,
            min_disp,
            num_disp
        }
    }

    /// The underlying fixed point map.
    pub fn mat(&self) -> &Mat {
        &self.data
    }

    /// Colourised map for display.
    ///
    /// Scales to `(d / 16 - min_disp) / num_disp`, stretches that to the full 8 bit range and
    /// applies the jet colour map.
    pub fn to_colour_map(&self) -> Result<Mat> {
        let num = self.num_disp.max(1) as f64;
        let alpha = 1.0 / (DISPARITY_SCALE as f64 * num);
        let beta = -(self.min_disp as f64) / num;

        let mut scaled = Mat::default();
        self.data.convert_to(&mut scaled, CV_32F, alpha, beta)?;

        let mut norm = Mat::default();
        normalize(&scaled, &mut norm, 0.0, 255.0, NORM_MINMAX, CV_8UC1, &no_array())?;

        let mut colour = Mat::default();
        apply_color_map(&norm, &mut colour, COLORMAP_JET)?;

        Ok(colour)
    }

    /// Converts the map to a GrayImage normalised over the valid disparities it contains.
    pub fn to_luma_normalised(&self) -> Result<GrayImage> {
        let fixed = if self.data.typ() == CV_16SC1 {
            self.data.try_clone()?
        }
        else {
            let mut converted = Mat::default();
            self.data.convert_to(&mut converted, CV_16S, 1.0, 0.0)?;
            converted
        };

        let min_valid = (self.min_disp * DISPARITY_SCALE).clamp(i16::MIN as i32, i16::MAX as i32);

        Ok(luma_from_fixed_point(
            fixed.data_typed::<i16>()?,
            fixed.cols() as u32,
            fixed.rows() as u32,
            min_valid as i16
        ))
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Stretch a row-major fixed point disparity buffer to a GrayImage.
///
/// Values below `min_valid`, and pixels past the end of a short buffer, are treated as unmatched
/// and written as black. The remaining values are scaled linearly so the smallest becomes 0 and
/// the largest 255.
pub fn luma_from_fixed_point(data: &[i16], width: u32, height: u32, min_valid: i16) -> GrayImage {
    let mut new = GrayImage::new(width, height);

    let (lo, hi) = data
        .iter()
        .filter(|&&d| d >= min_valid)
        .fold((i16::MAX, i16::MIN), |(lo, hi), &d| (lo.min(d), hi.max(d)));

    if lo > hi {
        return new;
    }

    let range = (hi as f32 - lo as f32).max(1.0);

    for y in 0..height {
        for x in 0..width {
            let val = match data.get((y * width + x) as usize) {
                Some(&d) if d >= min_valid => (d as f32 - lo as f32) * 255.0 / range,
                _ => 0.0
            };

            *new.get_pixel_mut(x, y) = image::Luma([val.round().clamp(0.0, 255.0) as u8]);
        }
    }

    new
}
