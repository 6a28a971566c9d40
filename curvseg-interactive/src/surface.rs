//! UI surface abstractions
//!
//! The controller drives two external resources from one loop: a 3D render
//! surface displaying the colored cloud and a 2D control panel carrying the
//! threshold slider. Both are specified here only at their boundary;
//! concrete adapters live outside this crate.

use curvseg_core::{ColoredPoint3f, PointCloud, Result};
use std::time::Duration;

/// An event reported by the control panel during one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// Nothing happened within the poll interval
    Idle,
    /// The slider moved to a new integer position
    SliderMoved(u32),
    /// The quit key was pressed
    Quit,
}

/// The 3D rendering surface
pub trait RenderSurface {
    /// Replace the surface's geometry colors with the given cloud's
    ///
    /// The controller guarantees this is called before the frame following
    /// a threshold change is polled, so a color update is visible no later
    /// than the next render.
    fn update_colors(&mut self, cloud: &PointCloud<ColoredPoint3f>) -> Result<()>;

    /// Process pending window events and redraw the current frame
    ///
    /// Returns `false` once the surface is gone (e.g. its window was
    /// closed), which ends the session.
    fn poll_events(&mut self) -> Result<bool>;

    /// Release the surface's resources
    ///
    /// Must be safe to call more than once.
    fn release(&mut self) -> Result<()>;
}

/// The 2D control panel holding the threshold slider
pub trait ControlPanel {
    /// Wait up to `timeout` for panel input
    ///
    /// The bounded wait keeps the loop responsive to both surfaces without
    /// spinning.
    fn poll(&mut self, timeout: Duration) -> Result<PanelEvent>;

    /// Release the panel's resources
    ///
    /// Must be safe to call more than once.
    fn release(&mut self) -> Result<()>;
}
