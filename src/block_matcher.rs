//! # Block matching with WLS filtering
//!
//! Wraps OpenCV's `StereoBM` together with the matching right-view matcher and the
//! `DisparityWLSFilter` that smooths its output.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use opencv::calib3d::{StereoBM, StereoMatcher};
use opencv::core::{Mat, Ptr, Rect};
use opencv::prelude::*;
use opencv::ximgproc::{create_disparity_wls_filter, create_right_matcher, DisparityWLSFilter};
use tracing::debug;

use crate::camstream::StereoFrame;
use crate::disparity::{DisparityAlgorithm, DisparityMap, DisparityOutput};
use crate::error::*;
use crate::params::{DisparityParams, PreFilterType};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct BlockMatcher {
    left: Ptr<StereoBM>,
    right: Ptr<StereoMatcher>,
    wls: Ptr<DisparityWLSFilter>,
    params: DisparityParams
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl BlockMatcher {
    /// Create a new matcher with the given parameters.
    pub fn new(params: &DisparityParams) -> Result<Self> {
        let mut left = StereoBM::create(params.num_disparities, params.block_size)?;
        set_matcher_params(&mut left, params)?;

        let right = create_right_matcher(Ptr::<StereoMatcher>::from(left.clone()))?;
        let mut wls = create_disparity_wls_filter(Ptr::<StereoMatcher>::from(left.clone()))?;
        wls.set_sigma_color(params.sigma)?;
        wls.set_lambda(params.lambda)?;

        Ok(Self {
            left,
            right,
            wls,
            params: *params
        })
    }

    /// The parameters currently applied.
    pub fn params(&self) -> &DisparityParams {
        &self.params
    }

    /// Read the settings back from the OpenCV matcher and filter objects.
    pub fn live_params(&mut self) -> Result<DisparityParams> {
        Ok(DisparityParams {
            num_disparities: self.left.get_num_disparities()?,
            block_size: self.left.get_block_size()?,
            pre_filter_type: PreFilterType::from_position(self.left.get_pre_filter_type()?),
            pre_filter_size: self.left.get_pre_filter_size()?,
            pre_filter_cap: self.left.get_pre_filter_cap()?,
            texture_threshold: self.left.get_texture_threshold()?,
            uniqueness_ratio: self.left.get_uniqueness_ratio()?,
            speckle_range: self.left.get_speckle_range()?,
            speckle_window_size: self.left.get_speckle_window_size()?,
            disp12_max_diff: self.left.get_disp12_max_diff()?,
            min_disparity: self.left.get_min_disparity()?,
            sigma: self.wls.get_sigma_color()?,
            lambda: self.wls.get_lambda()?
        })
    }
}

impl DisparityAlgorithm for BlockMatcher {
    /// Apply new parameters.
    ///
    /// The right matcher and the WLS filter copy the left matcher's settings when they are
    /// created, so both are rebuilt whenever a block matching parameter changes.
    fn apply(&mut self, params: &DisparityParams) -> Result<()> {
        if *params == self.params {
            return Ok(());
        }

        if !same_matcher_params(params, &self.params) {
            set_matcher_params(&mut self.left, params)?;
            self.right = create_right_matcher(Ptr::<StereoMatcher>::from(self.left.clone()))?;
            self.wls = create_disparity_wls_filter(Ptr::<StereoMatcher>::from(self.left.clone()))?;
        }

        self.wls.set_sigma_color(params.sigma)?;
        self.wls.set_lambda(params.lambda)?;

        debug!("Applied disparity parameters: {:?}", params);
        self.params = *params;

        Ok(())
    }

    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityOutput> {
        let mut left_disp = Mat::default();
        self.left.compute(&frame.left, &frame.right, &mut left_disp)?;

        let mut right_disp = Mat::default();
        self.right.compute(&frame.right, &frame.left, &mut right_disp)?;

        let mut filtered = Mat::default();
        self.wls.filter(
            &left_disp,
            &frame.left,
            &mut filtered,
            &right_disp,
            Rect::default(),
            &frame.right
        )?;

        Ok(DisparityOutput {
            raw: DisparityMap::new(
                left_disp,
                self.params.min_disparity,
                self.params.num_disparities
            ),
            filtered: DisparityMap::new(
                filtered,
                self.params.min_disparity,
                self.params.num_disparities
            )
        })
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn set_matcher_params(bm: &mut Ptr<StereoBM>, params: &DisparityParams) -> Result<()> {
    bm.set_num_disparities(params.num_disparities)?;
    bm.set_block_size(params.block_size)?;
    bm.set_pre_filter_type(params.pre_filter_type.as_position())?;
    bm.set_pre_filter_size(params.pre_filter_size)?;
    bm.set_pre_filter_cap(params.pre_filter_cap)?;
    bm.set_texture_threshold(params.texture_threshold)?;
    bm.set_uniqueness_ratio(params.uniqueness_ratio)?;
    bm.set_speckle_range(params.speckle_range)?;
    bm.set_speckle_window_size(params.speckle_window_size)?;
    bm.set_disp12_max_diff(params.disp12_max_diff)?;
    bm.set_min_disparity(params.min_disparity)?;
    Ok(())
}

/// True if the two sets differ only in the WLS filter settings.
fn same_matcher_params(a: &DisparityParams, b: &DisparityParams) -> bool {
    DisparityParams {
        sigma: b.sigma,
        lambda: b.lambda,
        ..*a
    } == *b
}
