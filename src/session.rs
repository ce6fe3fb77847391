//! # Tuning session
//!
//! The per-frame loop tying the cameras, rectification, block matcher and control panel
//! together.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::time::Instant;

use tracing::{debug, info};

use crate::block_matcher::BlockMatcher;
use crate::camstream::StereoCamera;
use crate::config::TunerConfig;
use crate::disparity::{DisparityAlgorithm, DisparityOutput};
use crate::error::*;
use crate::params::DisparityParams;
use crate::rectify::RectificationMaps;
use crate::ui::{ControlPanel, Key};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Key polling delay, in milliseconds.
const POLL_DELAY_MS: i32 = 1;

/// Frames between frame rate reports.
const FPS_REPORT_INTERVAL: u64 = 100;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct Session {
    config: TunerConfig,
    maps: RectificationMaps,
    camera: StereoCamera,
    matcher: BlockMatcher,
    panel: ControlPanel,
    applied: DisparityParams,
    frame_count: u64,
    snapshot_count: u32,
    report_start: Option<Instant>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Session {
    /// Load the calibration, open the cameras and build the control window.
    pub fn new(config: TunerConfig) -> Result<Self> {
        config.validate()?;

        let maps = RectificationMaps::from_file(&config.calibration)?;
        let seed = config.seed_positions()?;
        let applied = seed.to_params();

        let camera = StereoCamera::open(config.left_camera, config.right_camera)?;
        let matcher = BlockMatcher::new(&applied)?;
        let panel = ControlPanel::create(&config.window, &seed)?;

        info!("Tuning session ready, press Esc to save and exit, s to save a snapshot");

        Ok(Self {
            config,
            maps,
            camera,
            matcher,
            panel,
            applied,
            frame_count: 0,
            snapshot_count: 0,
            report_start: None
        })
    }

    /// Run until the operator presses Esc, returning the last parameters applied.
    pub fn run(&mut self) -> Result<DisparityParams> {
        loop {
            let frame = match self.camera.capture() {
                Some(f) => f,
                None => {
                    self.camera.reopen();

                    // Keep the windows responsive while the cameras are down
                    if self.panel.poll_key(POLL_DELAY_MS)? == Key::Exit {
                        break;
                    }
                    continue;
                }
            };
            self.camera.mark_healthy();

            let rectified = self.maps.rectify(&frame)?;

            let params = self.panel.positions()?.to_params();
            self.matcher.apply(&params)?;
            self.applied = params;

            let output = self.matcher.compute(&rectified)?;
            self.panel.show(&output)?;
            self.report_fps(frame.timestamp);

            match self.panel.poll_key(POLL_DELAY_MS)? {
                Key::Exit => break,
                Key::Snapshot => self.snapshot(&output)?,
                Key::Other => ()
            }
        }

        info!("Tuning finished after {} frames", self.frame_count);

        Ok(self.applied)
    }

    /// Save the raw and filtered maps as PNGs in the snapshot directory.
    fn snapshot(&mut self, output: &DisparityOutput) -> Result<()> {
        std::fs::create_dir_all(&self.config.snapshot_dir)?;

        let raw_path = self
            .config
            .snapshot_dir
            .join(format!("disparity_{:04}.png", self.snapshot_count));
        let filtered_path = self
            .config
            .snapshot_dir
            .join(format!("filtered_{:04}.png", self.snapshot_count));

        output.raw.to_luma_normalised()?.save(&raw_path)?;
        output.filtered.to_luma_normalised()?.save(&filtered_path)?;

        info!(
            "Saved snapshot {} to {}",
            self.snapshot_count,
            self.config.snapshot_dir.display()
        );
        self.snapshot_count += 1;

        Ok(())
    }

    fn report_fps(&mut self, timestamp: Instant) {
        self.frame_count += 1;

        let start = *self.report_start.get_or_insert(timestamp);
        if self.frame_count % FPS_REPORT_INTERVAL == 0 {
            let secs = timestamp.duration_since(start).as_secs_f64();
            if secs > 0.0 {
                debug!("{:.1} fps", FPS_REPORT_INTERVAL as f64 / secs);
            }
            self.report_start = Some(timestamp);
        }
    }
}
