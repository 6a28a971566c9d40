//! Interactive curvature thresholding for curvseg
//!
//! This crate drives the interactive half of the pipeline: it prepares a
//! segmentation session (the expensive one-shot batch of downsampling,
//! indexing and curvature estimation) and then runs a single-threaded
//! cooperative loop over two external UI surfaces, a 3D render surface and
//! a 2D control panel with a threshold slider.
//!
//! The UI surfaces are trait objects by design: the tested core is adapter
//! free, and concrete windowing/rendering backends plug in from outside.

pub mod surface;
pub mod session;
pub mod controller;

pub use surface::*;
pub use session::*;
pub use controller::*;
