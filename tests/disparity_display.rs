//! Disparity normalisation, key bindings and configuration loading

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use cv_disparity_tuner::config::TunerConfig;
use cv_disparity_tuner::session::Session;
use cv_disparity_tuner::Error;
use cv_disparity_tuner::prelude::*;
use cv_disparity_tuner::ui::{key_from_code, Key};
use opencv::core::{Mat, Scalar, CV_16SC1};
use opencv::prelude::*;

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[test]
fn luma_stretches_valid_range() {
    // 16 is the smallest valid value, -16 marks an unmatched pixel
    let data: [i16; 4] = [-16, 16, 80, 144];
    let img = luma_from_fixed_point(&data, 2, 2, 0);

    assert_eq!(img.get_pixel(0, 0)[0], 0);
    assert_eq!(img.get_pixel(1, 0)[0], 0);
    assert_eq!(img.get_pixel(0, 1)[0], 128);
    assert_eq!(img.get_pixel(1, 1)[0], 255);
}

#[test]
fn luma_of_short_buffer_pads_with_unmatched() {
    // Only the first row is present
    let data: [i16; 2] = [16, 48];
    let img = luma_from_fixed_point(&data, 2, 2, 0);

    assert_eq!(img.get_pixel(0, 0)[0], 0);
    assert_eq!(img.get_pixel(1, 0)[0], 255);
    assert_eq!(img.get_pixel(0, 1)[0], 0);
    assert_eq!(img.get_pixel(1, 1)[0], 0);
}

#[test]
fn luma_of_unmatched_map_is_black() {
    let data = [-32i16; 6];
    let img = luma_from_fixed_point(&data, 3, 2, 0);

    assert!(img.pixels().all(|p| p[0] == 0));
}

#[test]
fn disparity_map_to_luma() -> Result<(), Box<dyn std::error::Error>> {
    let mut mat = Mat::new_rows_cols_with_default(2, 3, CV_16SC1, Scalar::all(0.0))?;
    mat.data_typed_mut::<i16>()?.copy_from_slice(&[0, 16, 32, 48, 64, 80]);

    let map = DisparityMap::new(mat, 0, 16);
    let img = map.to_luma_normalised()?;

    assert_eq!(img.dimensions(), (3, 2));
    assert_eq!(img.get_pixel(0, 0)[0], 0);
    assert_eq!(img.get_pixel(2, 1)[0], 255);

    let colour = map.to_colour_map()?;
    assert_eq!(colour.channels(), 3);
    assert_eq!((colour.cols(), colour.rows()), (3, 2));

    Ok(())
}

#[test]
fn key_bindings() {
    assert_eq!(key_from_code(-1), Key::Other);
    assert_eq!(key_from_code(27), Key::Exit);
    assert_eq!(key_from_code(0x10_001b), Key::Exit);
    assert_eq!(key_from_code(i32::from(b's')), Key::Snapshot);
    assert_eq!(key_from_code(i32::from(b'S')), Key::Snapshot);
    assert_eq!(key_from_code(i32::from(b'q')), Key::Other);
}

#[test]
fn config_defaults() {
    let config = TunerConfig::from_json("{}").unwrap();

    assert_eq!(config.left_camera, 0);
    assert_eq!(config.right_camera, 1);
    assert_eq!(config.window.width, 400);
    assert!(config.initial_params.is_none());
    assert_eq!(config.seed_positions().unwrap(), SliderPositions::default());
}

#[test]
fn config_inline_params_seed_sliders() {
    let config = TunerConfig::from_json(r#"{
        "left_camera": 2,
        "right_camera": 3,
        "window": { "width": 600 },
        "params": {
            "numDisparities": 64,
            "blockSize": 21,
            "preFilterType": "NormalizedResponse",
            "preFilterSize": 9,
            "preFilterCap": 31,
            "textureThreshold": 10,
            "uniquenessRatio": 15,
            "speckleRange": 32,
            "speckleWindowSize": 100,
            "disp12MaxDiff": 1,
            "minDisparity": 0,
            "sigma": 1.5,
            "lmbda": 8000.0
        }
    }"#).unwrap();

    assert_eq!(config.left_camera, 2);
    assert_eq!(config.right_camera, 3);
    assert_eq!(config.window.width, 600);
    assert_eq!(config.window.height, 400);

    let pos = config.seed_positions().unwrap();
    assert_eq!(pos.get(Trackbar::NumDisparities), 4);
    assert_eq!(pos.get(Trackbar::BlockSize), 8);
    assert_eq!(pos.get(Trackbar::PreFilterType), 0);
    // 100 is past the slider's range of 2 * 25
    assert_eq!(pos.get(Trackbar::SpeckleWindowSize), 25);
    assert_eq!(pos.get(Trackbar::Sigma), 15);
}

#[test]
fn config_rejects_unknown_output_format() {
    let config = TunerConfig::from_json(r#"{ "output": "data/depth_params.txt" }"#).unwrap();
    assert!(matches!(config.validate(), Err(Error::UnknownFormat(_))));

    let config = TunerConfig::from_json(r#"{ "initial_params": "old.cfg" }"#).unwrap();
    assert!(matches!(config.validate(), Err(Error::UnknownFormat(_))));

    let config = TunerConfig::from_json(r#"{ "output": "depth_params.yml" }"#).unwrap();
    assert!(config.validate().is_ok());
}

#[test]
fn session_rejects_unknown_output_format_before_start() {
    let config = TunerConfig {
        output: "tuned.txt".into(),
        calibration: "no_such_calibration.xml".into(),
        ..TunerConfig::default()
    };

    // Fails on the output path, before the calibration, cameras or windows are touched
    assert!(matches!(Session::new(config), Err(Error::UnknownFormat(_))));
}

#[test]
fn config_rejects_bad_json() {
    assert!(TunerConfig::from_json("{ \"left_camera\": \"zero\" }").is_err());
}
