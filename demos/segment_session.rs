//! End-to-end segmentation session demo
//!
//! Loads a PLY point cloud (or generates a synthetic plane-with-bump cloud),
//! prepares a segmentation session, and runs the interactive controller
//! against headless demo surfaces: a render surface that logs color pushes
//! and a control panel that replays a scripted slider sweep before quitting.

use anyhow::Context;
use clap::Parser;
use curvseg_algorithms::{RegionLabel, SMOOTH_COLOR};
use curvseg_core::{Bounded, ColoredPoint3f, Point3f, PointCloud};
use curvseg_interactive::{
    ControlPanel, InteractiveController, PanelEvent, RenderSurface, SegmentationSession,
    SessionConfig,
};
use curvseg_io::read_point_cloud;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "Interactive curvature thresholding session (headless demo surfaces)")]
struct Args {
    /// PLY file to segment; a synthetic cloud is generated when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Voxel size for downsampling
    #[arg(long, default_value_t = 20.0)]
    voxel_size: f32,

    /// Neighborhood size for curvature estimation
    #[arg(short, long, default_value_t = 40)]
    k: usize,

    /// Initial threshold
    #[arg(long, default_value_t = 0.01)]
    tau: f32,

    /// Number of scripted slider steps to sweep through
    #[arg(long, default_value_t = 8)]
    sweep_steps: u32,
}

/// Render surface that logs instead of drawing
struct LoggingRenderSurface {
    frames: usize,
}

impl RenderSurface for LoggingRenderSurface {
    fn update_colors(&mut self, cloud: &PointCloud<ColoredPoint3f>) -> curvseg_core::Result<()> {
        let smooth = cloud.iter().filter(|p| p.color == SMOOTH_COLOR).count();
        log::info!(
            "colors pushed: {} smooth / {} rough",
            smooth,
            cloud.len() - smooth
        );
        Ok(())
    }

    fn poll_events(&mut self) -> curvseg_core::Result<bool> {
        self.frames += 1;
        Ok(true)
    }

    fn release(&mut self) -> curvseg_core::Result<()> {
        log::info!("render surface released after {} frames", self.frames);
        Ok(())
    }
}

/// Control panel that replays a fixed slider sweep, then quits
struct ScriptedControlPanel {
    script: VecDeque<PanelEvent>,
}

impl ControlPanel for ScriptedControlPanel {
    fn poll(&mut self, _timeout: Duration) -> curvseg_core::Result<PanelEvent> {
        Ok(self.script.pop_front().unwrap_or(PanelEvent::Quit))
    }

    fn release(&mut self) -> curvseg_core::Result<()> {
        log::info!("control panel released");
        Ok(())
    }
}

/// Evenly spaced slider positions over the lower half of the slider range.
///
/// The intermediate product is widened to u64; `steps * slider_scale` can
/// exceed u32 for large step counts.
fn sweep_positions(steps: u32, slider_scale: u32) -> Vec<u32> {
    (1..=steps)
        .map(|step| (u64::from(step) * u64::from(slider_scale) / (u64::from(steps) * 2)) as u32)
        .collect()
}

/// A flat plane with a sinusoidal bump in one corner
fn synthetic_cloud() -> PointCloud<Point3f> {
    let mut points = Vec::new();
    for i in 0..120 {
        for j in 0..120 {
            let x = i as f32 * 2.0;
            let y = j as f32 * 2.0;
            let z = if i > 60 && j > 60 {
                ((x * 0.15).sin() + (y * 0.15).cos()) * 12.0
            } else {
                0.0
            };
            points.push(Point3f::new(x, y, z));
        }
    }
    PointCloud::from_points(points)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let raw = match &args.input {
        Some(path) => read_point_cloud(path)
            .with_context(|| format!("failed to load point cloud from {}", path.display()))?,
        None => {
            log::info!("no input given, generating synthetic cloud");
            synthetic_cloud()
        }
    };
    let (min, max) = raw.bounding_box();
    log::info!(
        "loaded {} points spanning [{:.1} {:.1} {:.1}] .. [{:.1} {:.1} {:.1}]",
        raw.len(),
        min.x,
        min.y,
        min.z,
        max.x,
        max.y,
        max.z
    );

    let config = SessionConfig {
        voxel_size: args.voxel_size,
        k: args.k,
        initial_tau: args.tau,
        ..SessionConfig::default()
    };
    let slider_scale = config.slider_scale;
    let session = SegmentationSession::prepare(&raw, config)
        .context("failed to prepare segmentation session")?;

    let labels = curvseg_algorithms::classify(session.curvatures(), args.tau);
    let smooth = labels.iter().filter(|&&l| l == RegionLabel::Smooth).count();
    println!(
        "{} downsampled points, {} smooth / {} rough at tau = {}",
        session.cloud().len(),
        smooth,
        labels.len() - smooth,
        args.tau
    );

    // Sweep the slider across its domain, one step per tick.
    let script: VecDeque<PanelEvent> = sweep_positions(args.sweep_steps, slider_scale)
        .into_iter()
        .map(PanelEvent::SliderMoved)
        .chain(std::iter::once(PanelEvent::Quit))
        .collect();

    let renderer = LoggingRenderSurface { frames: 0 };
    let panel = ScriptedControlPanel { script };
    let mut controller = InteractiveController::new(session, renderer, panel)?;
    controller.run()?;

    println!("session closed at tau = {:.4}", controller.tau());
    Ok(())
}
