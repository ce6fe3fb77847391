//! # Tuning parameters
//!
//! This module describes the trackbars shown to the operator and the mapping from a trackbar
//! position to the value pushed into the block matcher and WLS filter.
//!
//! Every mapping is a pure function of the position. Positions are clamped to the trackbar's
//! range before mapping, so any `DisparityParams` produced here lies within the slider ranges.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Deserialize;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of trackbars in the control window.
pub const NUM_TRACKBARS: usize = 13;

/// Depth-from-disparity coefficient written alongside the tuned parameters.
pub const DEPTH_COEFFICIENT: f64 = 39.075;

/// Fixed point scale of the `CV_16S` disparity produced by the block matcher.
pub const DISPARITY_SCALE: i32 = 16;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Range and start position of a single trackbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackbarSpec {
    pub name: &'static str,
    pub min: i32,
    pub max: i32,
    pub initial: i32
}

/// The position of every trackbar, indexed by [`Trackbar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderPositions([i32; NUM_TRACKBARS]);

/// The mapped parameter set applied to the block matcher and the WLS filter.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisparityParams {
    pub num_disparities: i32,
    pub block_size: i32,
    pub pre_filter_type: PreFilterType,
    pub pre_filter_size: i32,
    pub pre_filter_cap: i32,
    pub texture_threshold: i32,
    pub uniqueness_ratio: i32,
    pub speckle_range: i32,
    pub speckle_window_size: i32,
    #[serde(rename = "disp12MaxDiff")]
    pub disp12_max_diff: i32,
    pub min_disparity: i32,
    pub sigma: f64,
    #[serde(rename = "lmbda")]
    pub lambda: f64
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Identifies one trackbar. The discriminant is the trackbar's index in [`TRACKBARS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trackbar {
    NumDisparities,
    BlockSize,
    PreFilterType,
    PreFilterSize,
    PreFilterCap,
    TextureThreshold,
    UniquenessRatio,
    SpeckleRange,
    SpeckleWindowSize,
    Disp12MaxDiff,
    MinDisparity,
    Sigma,
    Lambda
}

/// Pre-filter applied by the block matcher before correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PreFilterType {
    NormalizedResponse,
    XSobel
}

// -----------------------------------------------------------------------------------------------
// STATICS
// -----------------------------------------------------------------------------------------------

/// All trackbars, in the order they appear in the control window.
pub const TRACKBARS: [TrackbarSpec; NUM_TRACKBARS] = [
    TrackbarSpec { name: "numDisparities", min: 1, max: 17, initial: 1 },
    TrackbarSpec { name: "blockSize", min: 0, max: 50, initial: 5 },
    TrackbarSpec { name: "preFilterType", min: 0, max: 1, initial: 1 },
    TrackbarSpec { name: "preFilterSize", min: 0, max: 25, initial: 2 },
    TrackbarSpec { name: "preFilterCap", min: 1, max: 62, initial: 5 },
    TrackbarSpec { name: "textureThreshold", min: 0, max: 100, initial: 10 },
    TrackbarSpec { name: "uniquenessRatio", min: 0, max: 100, initial: 15 },
    TrackbarSpec { name: "speckleRange", min: 0, max: 100, initial: 0 },
    TrackbarSpec { name: "speckleWindowSize", min: 0, max: 25, initial: 3 },
    TrackbarSpec { name: "disp12MaxDiff", min: 0, max: 25, initial: 5 },
    TrackbarSpec { name: "minDisparity", min: 0, max: 25, initial: 5 },
    TrackbarSpec { name: "sigma", min: 0, max: 20, initial: 0 },
    TrackbarSpec { name: "lmbda", min: 0, max: 9000, initial: 7000 },
];

// -----------------------------------------------------------------------------------------------
// MAPPING FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Number of disparities searched, always a multiple of 16.
pub fn num_disparities(n: i32) -> i32 {
    16 * n
}

/// Matching block size, always odd and at least 5.
pub fn block_size(n: i32) -> i32 {
    2 * n + 5
}

/// Pre-filter window size, always odd and at least 5.
pub fn pre_filter_size(n: i32) -> i32 {
    2 * n + 5
}

pub fn speckle_window_size(n: i32) -> i32 {
    2 * n
}

/// WLS colour sigma in tenths.
pub fn sigma(n: i32) -> f64 {
    n as f64 / 10.0
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl TrackbarSpec {
    /// Clamp a position into this trackbar's range.
    pub fn clamp(&self, pos: i32) -> i32 {
        pos.clamp(self.min, self.max)
    }
}

impl Trackbar {
    pub const ALL: [Trackbar; NUM_TRACKBARS] = [
        Trackbar::NumDisparities,
        Trackbar::BlockSize,
        Trackbar::PreFilterType,
        Trackbar::PreFilterSize,
        Trackbar::PreFilterCap,
        Trackbar::TextureThreshold,
        Trackbar::UniquenessRatio,
        Trackbar::SpeckleRange,
        Trackbar::SpeckleWindowSize,
        Trackbar::Disp12MaxDiff,
        Trackbar::MinDisparity,
        Trackbar::Sigma,
        Trackbar::Lambda,
    ];

    pub fn spec(self) -> &'static TrackbarSpec {
        &TRACKBARS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl PreFilterType {
    /// Any non-zero position selects the x-Sobel pre-filter.
    pub fn from_position(pos: i32) -> Self {
        match pos {
            0 => PreFilterType::NormalizedResponse,
            _ => PreFilterType::XSobel
        }
    }

    /// The trackbar position, which is also OpenCV's `StereoBM::PREFILTER_*` value.
    pub fn as_position(self) -> i32 {
        match self {
            PreFilterType::NormalizedResponse => 0,
            PreFilterType::XSobel => 1
        }
    }
}

impl Default for SliderPositions {
    fn default() -> Self {
        let mut positions = [0; NUM_TRACKBARS];
        for (pos, spec) in positions.iter_mut().zip(TRACKBARS.iter()) {
            *pos = spec.initial;
        }
        SliderPositions(positions)
    }
}

impl SliderPositions {
    /// Build a set of positions by querying each trackbar in turn.
    pub fn try_from_fn<E, F>(mut f: F) -> std::result::Result<Self, E>
    where
        F: FnMut(Trackbar) -> std::result::Result<i32, E>
    {
        let mut positions = [0; NUM_TRACKBARS];
        for bar in Trackbar::ALL.iter() {
            positions[*bar as usize] = f(*bar)?;
        }
        Ok(SliderPositions(positions))
    }

    pub fn get(&self, bar: Trackbar) -> i32 {
        self.0[bar as usize]
    }

    pub fn set(&mut self, bar: Trackbar, pos: i32) {
        self.0[bar as usize] = pos;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Trackbar, i32)> + '_ {
        Trackbar::ALL.into_iter().map(move |bar| (bar, self.get(bar)))
    }

    /// Returns a copy with every position clamped into its trackbar's range.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for bar in Trackbar::ALL.iter() {
            out.set(*bar, bar.spec().clamp(self.get(*bar)));
        }
        out
    }

    /// Map the (clamped) positions to a parameter set.
    pub fn to_params(&self) -> DisparityParams {
        let p = self.clamped();

        DisparityParams {
            num_disparities: num_disparities(p.get(Trackbar::NumDisparities)),
            block_size: block_size(p.get(Trackbar::BlockSize)),
            pre_filter_type: PreFilterType::from_position(p.get(Trackbar::PreFilterType)),
            pre_filter_size: pre_filter_size(p.get(Trackbar::PreFilterSize)),
            pre_filter_cap: p.get(Trackbar::PreFilterCap),
            texture_threshold: p.get(Trackbar::TextureThreshold),
            uniqueness_ratio: p.get(Trackbar::UniquenessRatio),
            speckle_range: p.get(Trackbar::SpeckleRange),
            speckle_window_size: speckle_window_size(p.get(Trackbar::SpeckleWindowSize)),
            disp12_max_diff: p.get(Trackbar::Disp12MaxDiff),
            min_disparity: p.get(Trackbar::MinDisparity),
            sigma: sigma(p.get(Trackbar::Sigma)),
            lambda: p.get(Trackbar::Lambda) as f64
        }
    }

    /// Find the positions closest to the given parameters.
    ///
    /// Values that no position maps to exactly (an even block size, a disparity count that is not
    /// a multiple of 16) are rounded to the nearest position, and everything is clamped.
    pub fn from_params(params: &DisparityParams) -> Self {
        let half_round = |v: i32, offset: i32| ((v - offset) as f64 / 2.0).round() as i32;

        let mut out = SliderPositions([0; NUM_TRACKBARS]);
        out.set(
            Trackbar::NumDisparities,
            (params.num_disparities as f64 / 16.0).round() as i32
        );
        out.set(Trackbar::BlockSize, half_round(params.block_size, 5));
        out.set(Trackbar::PreFilterType, params.pre_filter_type.as_position());
        out.set(Trackbar::PreFilterSize, half_round(params.pre_filter_size, 5));
        out.set(Trackbar::PreFilterCap, params.pre_filter_cap);
        out.set(Trackbar::TextureThreshold, params.texture_threshold);
        out.set(Trackbar::UniquenessRatio, params.uniqueness_ratio);
        out.set(Trackbar::SpeckleRange, params.speckle_range);
        out.set(Trackbar::SpeckleWindowSize, half_round(params.speckle_window_size, 0));
        out.set(Trackbar::Disp12MaxDiff, params.disp12_max_diff);
        out.set(Trackbar::MinDisparity, params.min_disparity);
        out.set(Trackbar::Sigma, (params.sigma * 10.0).round() as i32);
        out.set(Trackbar::Lambda, params.lambda.round() as i32);

        out.clamped()
    }
}

impl Default for DisparityParams {
    fn default() -> Self {
        SliderPositions::default().to_params()
    }
}
