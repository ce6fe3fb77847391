//! Persisting and reloading the tuned parameter record

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

use cv_disparity_tuner::prelude::*;
use cv_disparity_tuner::store::{self, Format};
use cv_disparity_tuner::Error;
use opencv::core::{FileStorage, FileStorage_READ, FileStorage_WRITE};
use opencv::prelude::*;

// -----------------------------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------------------------

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cv-disparity-tuner-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn tuned_params() -> DisparityParams {
    let mut pos = SliderPositions::default();
    pos.set(Trackbar::NumDisparities, 4);
    pos.set(Trackbar::BlockSize, 7);
    pos.set(Trackbar::PreFilterType, 0);
    pos.set(Trackbar::UniquenessRatio, 22);
    pos.set(Trackbar::SpeckleRange, 31);
    pos.set(Trackbar::Sigma, 7);
    pos.set(Trackbar::Lambda, 8000);
    pos.to_params()
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[test]
fn format_from_extension() {
    assert_eq!(Format::from_path("a/depth_params.xml".as_ref()).unwrap(), Format::Xml);
    assert_eq!(Format::from_path("a.yml".as_ref()).unwrap(), Format::Yaml);
    assert_eq!(Format::from_path("a.YAML".as_ref()).unwrap(), Format::Yaml);
    assert_eq!(Format::from_path("a.json".as_ref()).unwrap(), Format::Json);
    assert!(matches!(
        Format::from_path("a.txt".as_ref()),
        Err(Error::UnknownFormat(_))
    ));
}

#[test]
fn round_trip_all_formats() -> Result<(), Box<dyn std::error::Error>> {
    let params = tuned_params();

    for name in &["round_trip.xml", "round_trip.yml", "round_trip.json"] {
        let path = temp_path(name);
        store::save(&path, &params)?;
        assert_eq!(store::load(&path)?, params, "{}", name);
    }

    Ok(())
}

#[test]
fn record_contains_constants() -> Result<(), Box<dyn std::error::Error>> {
    let path = temp_path("constants.xml");
    store::save(&path, &DisparityParams::default())?;

    let fs = FileStorage::new_def(path.to_str().unwrap(), FileStorage_READ)?;
    assert!((fs.get("M")?.real()? - 39.075).abs() < 1e-9);
    assert_eq!(fs.get("disparityScale")?.real()?, 16.0);
    assert_eq!(fs.get("lmbda")?.real()?, 7000.0);

    Ok(())
}

#[test]
fn missing_key_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let path = temp_path("partial.xml");
    let mut fs = FileStorage::new_def(path.to_str().unwrap(), FileStorage_WRITE)?;
    fs.write_i32("numDisparities", 32)?;
    fs.write_i32("preFilterType", 1)?;
    fs.release()?;

    assert!(matches!(
        store::load(&path),
        Err(Error::MissingKey { key: "blockSize" })
    ));

    Ok(())
}

#[test]
fn missing_file_is_reported() {
    assert!(matches!(
        store::load(temp_path("does_not_exist.xml")),
        Err(Error::ParamFile(_))
    ));
}

#[test]
fn unknown_extension_is_not_written() {
    let path = temp_path("params.txt");
    assert!(matches!(
        store::save(&path, &DisparityParams::default()),
        Err(Error::UnknownFormat(_))
    ));
    assert!(!path.exists());
}
