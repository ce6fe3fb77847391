//! # Parameter record storage
//!
//! Reads and writes the tuned parameters as an OpenCV `FileStorage` key/value record, which is
//! what the downstream depth estimator loads. The file format follows the path's extension.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use opencv::core::{
    FileStorage, FileStorage_FORMAT_JSON, FileStorage_FORMAT_XML, FileStorage_FORMAT_YAML,
    FileStorage_READ, FileStorage_WRITE
};
use opencv::prelude::*;
use tracing::info;

use crate::error::*;
use crate::params::{DisparityParams, PreFilterType, DEPTH_COEFFICIENT, DISPARITY_SCALE};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

const KEY_NUM_DISPARITIES: &str = "numDisparities";
const KEY_BLOCK_SIZE: &str = "blockSize";
const KEY_PRE_FILTER_TYPE: &str = "preFilterType";
const KEY_PRE_FILTER_SIZE: &str = "preFilterSize";
const KEY_PRE_FILTER_CAP: &str = "preFilterCap";
const KEY_TEXTURE_THRESHOLD: &str = "textureThreshold";
const KEY_UNIQUENESS_RATIO: &str = "uniquenessRatio";
const KEY_SPECKLE_RANGE: &str = "speckleRange";
const KEY_SPECKLE_WINDOW_SIZE: &str = "speckleWindowSize";
const KEY_DISP12_MAX_DIFF: &str = "disp12MaxDiff";
const KEY_MIN_DISPARITY: &str = "minDisparity";
const KEY_DEPTH_COEFFICIENT: &str = "M";
const KEY_DISPARITY_SCALE: &str = "disparityScale";
const KEY_SIGMA: &str = "sigma";
const KEY_LAMBDA: &str = "lmbda";

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Serialisation format of a parameter record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xml,
    Yaml,
    Json
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Format {
    /// Choose the format from the path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("xml") => Ok(Format::Xml),
            Some("yml") | Some("yaml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(Error::UnknownFormat(path.to_path_buf()))
        }
    }

    fn flag(self) -> i32 {
        match self {
            Format::Xml => FileStorage_FORMAT_XML,
            Format::Yaml => FileStorage_FORMAT_YAML,
            Format::Json => FileStorage_FORMAT_JSON
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Write the parameter record, including the depth coefficient and disparity scale constants.
pub fn save<P: AsRef<Path>>(path: P, params: &DisparityParams) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut fs = FileStorage::new_def(&path_str(path)?, FileStorage_WRITE | format.flag())?;
    if !fs.is_opened()? {
        return Err(Error::ParamFile(path.to_path_buf()));
    }

    fs.write_i32(KEY_NUM_DISPARITIES, params.num_disparities)?;
    fs.write_i32(KEY_BLOCK_SIZE, params.block_size)?;
    fs.write_i32(KEY_PRE_FILTER_TYPE, params.pre_filter_type.as_position())?;
    fs.write_i32(KEY_PRE_FILTER_SIZE, params.pre_filter_size)?;
    fs.write_i32(KEY_PRE_FILTER_CAP, params.pre_filter_cap)?;
    fs.write_i32(KEY_TEXTURE_THRESHOLD, params.texture_threshold)?;
    fs.write_i32(KEY_UNIQUENESS_RATIO, params.uniqueness_ratio)?;
    fs.write_i32(KEY_SPECKLE_RANGE, params.speckle_range)?;
    fs.write_i32(KEY_SPECKLE_WINDOW_SIZE, params.speckle_window_size)?;
    fs.write_i32(KEY_DISP12_MAX_DIFF, params.disp12_max_diff)?;
    fs.write_i32(KEY_MIN_DISPARITY, params.min_disparity)?;
    fs.write_f64(KEY_DEPTH_COEFFICIENT, DEPTH_COEFFICIENT)?;
    fs.write_i32(KEY_DISPARITY_SCALE, DISPARITY_SCALE)?;
    fs.write_f64(KEY_SIGMA, params.sigma)?;
    fs.write_f64(KEY_LAMBDA, params.lambda)?;
    fs.release()?;

    info!("Saved disparity parameters to {}", path.display());

    Ok(())
}

/// Read a parameter record written by [`save`].
///
/// The two constants are not part of [`DisparityParams`] and are ignored.
pub fn load<P: AsRef<Path>>(path: P) -> Result<DisparityParams> {
    let path = path.as_ref();
    Format::from_path(path)?;

    if !path.is_file() {
        return Err(Error::ParamFile(path.to_path_buf()));
    }

    let fs = FileStorage::new_def(&path_str(path)?, FileStorage_READ)?;
    if !fs.is_opened()? {
        return Err(Error::ParamFile(path.to_path_buf()));
    }

    let pre_filter_type = match read_i32(&fs, KEY_PRE_FILTER_TYPE)? {
        0 => PreFilterType::NormalizedResponse,
        1 => PreFilterType::XSobel,
        v => return Err(Error::InvalidValue { key: KEY_PRE_FILTER_TYPE, value: v as f64 })
    };

    let params = DisparityParams {
        num_disparities: read_i32(&fs, KEY_NUM_DISPARITIES)?,
        block_size: read_i32(&fs, KEY_BLOCK_SIZE)?,
        pre_filter_type,
        pre_filter_size: read_i32(&fs, KEY_PRE_FILTER_SIZE)?,
        pre_filter_cap: read_i32(&fs, KEY_PRE_FILTER_CAP)?,
        texture_threshold: read_i32(&fs, KEY_TEXTURE_THRESHOLD)?,
        uniqueness_ratio: read_i32(&fs, KEY_UNIQUENESS_RATIO)?,
        speckle_range: read_i32(&fs, KEY_SPECKLE_RANGE)?,
        speckle_window_size: read_i32(&fs, KEY_SPECKLE_WINDOW_SIZE)?,
        disp12_max_diff: read_i32(&fs, KEY_DISP12_MAX_DIFF)?,
        min_disparity: read_i32(&fs, KEY_MIN_DISPARITY)?,
        sigma: read_f64(&fs, KEY_SIGMA)?,
        lambda: read_f64(&fs, KEY_LAMBDA)?
    };

    info!("Loaded disparity parameters from {}", path.display());

    Ok(params)
}

fn read_f64(fs: &FileStorage, key: &'static str) -> Result<f64> {
    let node = fs.get(key)?;
    if node.is_none()? || !(node.is_int()? || node.is_real()?) {
        return Err(Error::MissingKey { key });
    }
    Ok(node.real()?)
}

fn read_i32(fs: &FileStorage, key: &'static str) -> Result<i32> {
    let value = read_f64(fs, key)?;
    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(Error::InvalidValue { key, value });
    }
    Ok(value as i32)
}

fn path_str(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_owned)
        .ok_or_else(|| Error::ParamFile(PathBuf::from(path)))
}
