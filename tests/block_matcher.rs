//! Block matching and WLS filtering on a synthetic stereo pair

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use cv_disparity_tuner::block_matcher::BlockMatcher;
use cv_disparity_tuner::camstream::StereoFrame;
use cv_disparity_tuner::prelude::*;
use opencv::core::{Mat, Scalar, CV_16SC1, CV_8UC1};
use opencv::prelude::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

const WIDTH: i32 = 160;
const HEIGHT: i32 = 120;
const SHIFT: i32 = 6;

// -----------------------------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------------------------

fn texture(x: i32, y: i32) -> u8 {
    let h = (x as u32).wrapping_mul(73_856_093) ^ (y as u32).wrapping_mul(19_349_663);
    (h >> 13) as u8
}

fn shifted_pair() -> opencv::Result<StereoFrame> {
    let mut left = Mat::new_rows_cols_with_default(HEIGHT, WIDTH, CV_8UC1, Scalar::all(0.0))?;
    let mut right = Mat::new_rows_cols_with_default(HEIGHT, WIDTH, CV_8UC1, Scalar::all(0.0))?;

    {
        let data = left.data_typed_mut::<u8>()?;
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                data[(y * WIDTH + x) as usize] = texture(x, y);
            }
        }
    }
    {
        let data = right.data_typed_mut::<u8>()?;
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                data[(y * WIDTH + x) as usize] = texture(x + SHIFT, y);
            }
        }
    }

    Ok(StereoFrame::new(left, right))
}

fn test_params() -> DisparityParams {
    let mut params = DisparityParams::default();
    params.num_disparities = 32;
    params.min_disparity = 0;
    params.speckle_window_size = 0;
    params
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[test]
fn compute_produces_fixed_point_maps() -> Result<(), Box<dyn std::error::Error>> {
    let frame = shifted_pair()?;
    let mut matcher = BlockMatcher::new(&test_params())?;

    let output = matcher.compute(&frame)?;

    for map in &[&output.raw, &output.filtered] {
        assert_eq!(map.mat().typ(), CV_16SC1);
        assert_eq!((map.mat().cols(), map.mat().rows()), (WIDTH, HEIGHT));
        assert_eq!(map.min_disp, 0);
        assert_eq!(map.num_disp, 32);
    }

    // The centre of the raw map should find the synthetic shift
    let centre = *output.raw.mat().at_2d::<i16>(HEIGHT / 2, WIDTH / 2)?;
    assert_eq!((centre as f32 / 16.0).round() as i32, SHIFT);

    Ok(())
}

#[test]
fn new_matcher_carries_parameters() -> Result<(), Box<dyn std::error::Error>> {
    let mut params = test_params();
    params.sigma = 0.8;
    params.lambda = 6500.0;

    let mut matcher = BlockMatcher::new(&params)?;

    assert_eq!(matcher.live_params()?, params);

    Ok(())
}

#[test]
fn apply_updates_opencv_objects() -> Result<(), Box<dyn std::error::Error>> {
    let frame = shifted_pair()?;
    let mut matcher = BlockMatcher::new(&test_params())?;

    // WLS only change
    let mut params = test_params();
    params.sigma = 1.2;
    params.lambda = 5000.0;
    matcher.apply(&params)?;

    let live = matcher.live_params()?;
    assert_eq!(live.sigma, 1.2);
    assert_eq!(live.lambda, 5000.0);
    assert_eq!(live, params);

    // Matcher change rebuilds the filter, which must keep the WLS settings
    params.num_disparities = 48;
    params.block_size = 21;
    params.pre_filter_type = PreFilterType::NormalizedResponse;
    params.uniqueness_ratio = 30;
    matcher.apply(&params)?;

    let live = matcher.live_params()?;
    assert_eq!(live.num_disparities, 48);
    assert_eq!(live.block_size, 21);
    assert_eq!(live.pre_filter_type, PreFilterType::NormalizedResponse);
    assert_eq!(live.uniqueness_ratio, 30);
    assert_eq!(live.sigma, 1.2);
    assert_eq!(live.lambda, 5000.0);
    assert_eq!(live, params);

    let output = matcher.compute(&frame)?;
    assert_eq!(output.filtered.num_disp, 48);

    Ok(())
}
