//! Session configuration and batch preparation

use curvseg_algorithms::{
    apply_region_colors, estimate_curvature, voxel_downsample, CurvatureField, NeighborIndex,
    SMOOTH_COLOR,
};
use curvseg_core::{ColoredPoint3f, Error, Point3f, PointCloud, Result};
use std::time::Duration;

/// Session-scoped configuration
///
/// All values are fixed for the lifetime of a session; only the threshold
/// itself changes interactively.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Voxel edge length for downsampling
    pub voxel_size: f32,
    /// Neighborhood size for curvature estimation
    pub k: usize,
    /// Integer slider domain is `[0, slider_scale]`
    pub slider_scale: u32,
    /// Threshold at session start
    pub initial_tau: f32,
    /// Bounded wait per control-panel poll
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            voxel_size: 20.0,
            k: 40,
            slider_scale: 10_000,
            initial_tau: 0.01,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl SessionConfig {
    /// Validate the configuration, failing fast before any processing
    pub fn validate(&self) -> Result<()> {
        if self.voxel_size <= 0.0 {
            return Err(Error::Config(format!(
                "voxel_size must be positive, got {}",
                self.voxel_size
            )));
        }
        if self.k == 0 {
            return Err(Error::Config("k must be positive".to_string()));
        }
        if self.slider_scale == 0 {
            return Err(Error::Config("slider_scale must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.initial_tau) {
            return Err(Error::Config(format!(
                "initial_tau must lie in [0, 1], got {}",
                self.initial_tau
            )));
        }
        Ok(())
    }

    /// Threshold corresponding to an integer slider position
    pub fn tau_for_position(&self, position: u32) -> f32 {
        position.min(self.slider_scale) as f32 / self.slider_scale as f32
    }

    /// Slider position corresponding to the initial threshold
    pub fn initial_slider_position(&self) -> u32 {
        (self.initial_tau * self.slider_scale as f32).round() as u32
    }
}

/// A prepared segmentation session
///
/// Holds everything the interactive loop needs: the downsampled colored
/// cloud and its immutable curvature field. Producing one runs the entire
/// expensive batch (downsample, index build, curvature estimation), so a
/// session is prepared exactly once, before the loop starts.
#[derive(Debug)]
pub struct SegmentationSession {
    config: SessionConfig,
    cloud: PointCloud<ColoredPoint3f>,
    curvatures: CurvatureField,
}

impl SegmentationSession {
    /// Run the batch pipeline over a raw cloud
    pub fn prepare(raw: &PointCloud<Point3f>, config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let downsampled = voxel_downsample(raw, config.voxel_size)?;
        log::info!(
            "downsampled {} -> {} points (voxel_size {})",
            raw.len(),
            downsampled.len(),
            config.voxel_size
        );

        let index = NeighborIndex::build(&downsampled.points);
        let curvatures = estimate_curvature(&downsampled, &index, config.k)?;
        log::info!(
            "estimated curvature for {} points (k = {}, max {:.6})",
            curvatures.len(),
            config.k,
            curvatures.max()
        );

        let mut cloud = downsampled.with_uniform_color(SMOOTH_COLOR);
        apply_region_colors(&mut cloud, &curvatures, config.initial_tau);

        Ok(Self {
            config,
            cloud,
            curvatures,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The downsampled cloud with its current classification colors
    pub fn cloud(&self) -> &PointCloud<ColoredPoint3f> {
        &self.cloud
    }

    /// The immutable curvature field
    pub fn curvatures(&self) -> &CurvatureField {
        &self.curvatures
    }

    /// Recolor the cloud for a new threshold
    ///
    /// O(N); reuses the precomputed curvature field, never touching the
    /// neighbor index again.
    pub fn reclassify(&mut self, tau: f32) {
        apply_region_colors(&mut self.cloud, &self.curvatures, tau);
    }
}
