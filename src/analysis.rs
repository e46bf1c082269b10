//! Zingg morphology analysis of a single crystal shape.
//!
//! This module turns a point cloud into the descriptors used to place a crystal
//! on a Zingg diagram. The cloud is rotated into its principal-axis frame, where
//! an axis-aligned bounding box gives three extents independent of how the
//! crystal happened to be oriented in the simulation box.
//!
//! The analysis provides:
//! - Principal component variances of the point cloud
//! - Bounding-box extents in the principal frame
//! - Two aspect ratios (small/medium and medium/large extent)
//! - A shape class from the aspect ratios
//! - Convex hull surface area, volume, and their ratio
//!
//! # Shape classes
//!
//! | aspect1 > 2/3 | aspect2 > 2/3 | class  |
//! |---------------|---------------|--------|
//! | no            | no            | Lath   |
//! | no            | yes           | Plate  |
//! | yes           | yes           | Block  |
//! | yes           | no            | Needle |

use std::fmt;
use std::path::Path;

use itertools::{Itertools, MinMaxResult};
use log::debug;
use nalgebra::DMatrix;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShapeError};
use crate::hull::ConvexHull;
use crate::points::{extract_xyz_columns, PointSet};
use crate::reader;

/// Aspect ratio above which a dimension counts as "comparable" to the next.
pub const ZINGG_THRESHOLD: f64 = 2.0 / 3.0;


/// Zingg shape class of a crystal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeClass {
    Lath,
    Plate,
    Block,
    Needle,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ShapeClass {
    /// Classifies a crystal by its aspect ratios. A ratio equal to the
    /// threshold does not count as exceeding it.
    pub fn classify(aspect1: f64, aspect2: f64) -> Self {
        if !(aspect1.is_finite() && aspect2.is_finite()) {
            return Self::Unknown;
        }
        match (aspect1 > ZINGG_THRESHOLD, aspect2 > ZINGG_THRESHOLD) {
            (false, false) => Self::Lath,
            (false, true) => Self::Plate,
            (true, true) => Self::Block,
            (true, false) => Self::Needle,
        }
    }
}

impl fmt::Display for ShapeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lath => "Lath",
            Self::Plate => "Plate",
            Self::Block => "Block",
            Self::Needle => "Needle",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Morphology descriptors of one crystal shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    /// Bounding-box extents in the principal frame, ascending.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Principal component variances (singular value squared over point count), ascending.
    pub pc1: f64,
    pub pc2: f64,
    pub pc3: f64,
    /// Smallest over middle extent.
    pub aspect1: f64,
    /// Middle over largest extent.
    pub aspect2: f64,
    /// Convex hull surface area, if computed.
    pub sa: Option<f64>,
    /// Convex hull volume, if computed.
    pub vol: Option<f64>,
    /// Surface area over volume, if computed.
    pub sa_vol: Option<f64>,
    pub shape: ShapeClass,
}

/// Convex hull surface area, volume and their ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaVol {
    pub surface_area: f64,
    pub volume: f64,
    pub ratio: f64,
}

impl SaVol {
    pub fn to_array(self) -> [f64; 3] {
        [self.surface_area, self.volume, self.ratio]
    }
}

/// Analyser holding the point set of one crystal.
///
/// **Context**: Shapes arrive either as arrays from a caller or as files from
/// the simulation. The analyser owns one point set at a time so repeated
/// analyses of the same shape need no re-reading.
///
/// **How it Works**: `set_xyz` resolves the input to a [`PointSet`] and
/// replaces whatever was held before. The analysis methods borrow the set and
/// never modify it, so calling them twice gives identical results.
#[derive(Debug, Clone, Default)]
pub struct CrystalShape {
    xyz: Option<PointSet>,
}

impl CrystalShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(points: PointSet) -> Self {
        Self { xyz: Some(points) }
    }

    /// Sets the active point set from an array or a file.
    ///
    /// When both are given the file wins. Arrays wider than three columns are
    /// reduced with [`extract_xyz_columns`].
    pub fn set_xyz(&mut self, xyz_array: Option<Array2<f64>>, filepath: Option<&Path>) -> Result<()> {
        let points = match (xyz_array, filepath) {
            (_, Some(path)) => reader::read_xyz(path, false)?.points,
            (Some(array), None) => extract_xyz_columns(array)?,
            (None, None) => {
                return Err(ShapeError::validation(
                    "provide the shape as either an array or a filepath",
                ))
            }
        };
        self.xyz = Some(points);
        Ok(())
    }

    pub fn set_points(&mut self, points: PointSet) {
        self.xyz = Some(points);
    }

    /// The active point set.
    pub fn points(&self) -> Option<&PointSet> {
        self.xyz.as_ref()
    }

    fn active(&self) -> Result<&PointSet> {
        self.xyz
            .as_ref()
            .ok_or_else(|| ShapeError::validation("no shape set, call set_xyz first"))
    }

    /// Aligns the crystal with its principal axes and measures it.
    ///
    /// The point matrix is decomposed as-is, without re-centring. Hull
    /// quantities are only computed when `get_sa_vol` is set.
    pub fn get_zingg_analysis(&self, get_sa_vol: bool) -> Result<ShapeDescriptor> {
        let points = self.active()?;
        let n = points.len();
        if n < 3 {
            return Err(ShapeError::geometry(format!(
                "principal axes need at least 3 points, got {n}"
            )));
        }

        let xyz = DMatrix::from_row_iterator(n, 3, points.as_array().iter().copied());
        let svd = xyz
            .clone()
            .try_svd(false, true, f64::EPSILON, 0)
            .ok_or_else(|| ShapeError::geometry("singular value decomposition did not converge"))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| ShapeError::geometry("missing principal directions"))?;

        // rotate into the principal-axis frame
        let aligned = &xyz * v_t.transpose();

        let mut pcs: Vec<f64> = svd
            .singular_values
            .iter()
            .map(|s| s * s / n as f64)
            .collect();
        pcs.sort_by(f64::total_cmp);

        let mut lengths: Vec<f64> = aligned
            .column_iter()
            .map(|col| match col.iter().copied().minmax() {
                MinMaxResult::MinMax(min, max) => max - min,
                _ => 0.0,
            })
            .collect();
        lengths.sort_by(f64::total_cmp);

        let aspect1 = if lengths[1] != 0.0 {
            lengths[0] / lengths[1]
        } else {
            0.0
        };
        let aspect2 = if lengths[2] != 0.0 {
            lengths[1] / lengths[2]
        } else {
            0.0
        };
        let shape = ShapeClass::classify(aspect1, aspect2);
        debug!("extents {lengths:?}, aspects ({aspect1:.4}, {aspect2:.4}) -> {shape}");

        let (sa, vol, sa_vol) = if get_sa_vol {
            let hull = self.get_sa_vol_ratio()?;
            (Some(hull.surface_area), Some(hull.volume), Some(hull.ratio))
        } else {
            (None, None, None)
        };

        Ok(ShapeDescriptor {
            x: lengths[0],
            y: lengths[1],
            z: lengths[2],
            pc1: pcs[0],
            pc2: pcs[1],
            pc3: pcs[2],
            aspect1,
            aspect2,
            sa,
            vol,
            sa_vol,
            shape,
        })
    }

    /// Surface area, volume and their ratio from the convex hull of the
    /// active point set.
    pub fn get_sa_vol_ratio(&self) -> Result<SaVol> {
        let hull = ConvexHull::build(&self.active()?.to_points())?;
        let surface_area = hull.area();
        let volume = hull.volume();
        Ok(SaVol {
            surface_area,
            volume,
            ratio: surface_area / volume,
        })
    }
}
