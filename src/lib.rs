//! Three-dimensional morphology of simulated crystal shapes.
//!
//! Shapes are read from coordinate files, movies of coordinate frames, or
//! surface meshes. Each shape is aligned with its principal axes to obtain
//! extents, Zingg aspect ratios and a shape class, and optionally its convex
//! hull surface area and volume.

pub mod analysis;
pub mod batch;
pub mod error;
pub mod hull;
pub mod output;
pub mod points;
pub mod progress;
pub mod reader;
pub mod settings;

pub use analysis::{CrystalShape, SaVol, ShapeClass, ShapeDescriptor};
pub use error::{Result, ShapeError};
pub use points::{normalise, FrameMovie, PointSet};
pub use reader::{read_xyz, XyzRead};
