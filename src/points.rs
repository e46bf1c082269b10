//! Point sets and frame movies.
//!
//! A [`PointSet`] is an N x 3 matrix of finite coordinates describing the outer
//! surface of one crystal. A [`FrameMovie`] holds one point set per frame of a
//! simulation trajectory, keyed by frame index in simulation order.
//!
//! Raw coordinate tables coming out of the simulation often carry extra
//! metadata columns. [`extract_xyz_columns`] reduces them to coordinates:
//!
//! | columns | coordinates taken |
//! |---------|-------------------|
//! | 3       | all of them       |
//! | >= 6    | columns 4-6       |
//! | other   | rejected          |

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};
use ndarray::{s, Array2, ArrayView2, Axis};

use crate::error::{Result, ShapeError};


/// Ordered N x 3 matrix of finite coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    xyz: Array2<f64>,
}

impl PointSet {
    /// Wraps a coordinate matrix, checking it has exactly three finite columns.
    pub fn new(xyz: Array2<f64>) -> Result<Self> {
        if xyz.ncols() != 3 {
            return Err(ShapeError::validation(format!(
                "point set must have 3 columns, got {}",
                xyz.ncols()
            )));
        }
        if let Some(((row, _), _)) = xyz.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ShapeError::validation(format!(
                "non-finite coordinate in row {row}"
            )));
        }
        Ok(Self { xyz })
    }

    pub fn empty() -> Self {
        Self {
            xyz: Array2::zeros((0, 3)),
        }
    }

    pub fn from_points(points: &[Point3<f64>]) -> Result<Self> {
        let flat: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        let xyz = Array2::from_shape_vec((points.len(), 3), flat)
            .map_err(|e| ShapeError::validation(e.to_string()))?;
        Self::new(xyz)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.xyz.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.xyz.nrows() == 0
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.xyz
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.xyz.view()
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.xyz
    }

    pub fn to_points(&self) -> Vec<Point3<f64>> {
        self.xyz
            .rows()
            .into_iter()
            .map(|r| Point3::new(r[0], r[1], r[2]))
            .collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.xyz.rows().into_iter().map(|r| r.to_vec()).collect()
    }

    /// Mean position, or `None` for an empty set.
    pub fn centroid(&self) -> Option<Vector3<f64>> {
        self.xyz
            .mean_axis(Axis(0))
            .map(|m| Vector3::new(m[0], m[1], m[2]))
    }
}

/// Stacks equal-length rows into a matrix. No rows gives an empty 0 x 3 matrix.
pub fn rows_to_array(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let ncols = rows.first().map_or(3, Vec::len);
    if let Some(i) = rows.iter().position(|row| row.len() != ncols) {
        return Err(ShapeError::validation(format!(
            "row {i} has {} values, expected {ncols}",
            rows[i].len()
        )));
    }
    let values: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), ncols), values)
        .map_err(|e| ShapeError::validation(e.to_string()))
}

/// Reduces a raw coordinate table to a [`PointSet`].
///
/// Three columns are taken as-is. Wider tables are simulation output whose
/// first three columns are metadata (particle id, type, ...), so columns 4-6
/// are the coordinates. Any other width is rejected.
pub fn extract_xyz_columns(matrix: Array2<f64>) -> Result<PointSet> {
    match matrix.ncols() {
        3 => PointSet::new(matrix),
        n if n >= 6 => PointSet::new(matrix.slice(s![.., 3..6]).to_owned()),
        n => Err(ShapeError::validation(format!(
            "cannot reduce a table with {n} columns to x, y, z (need 3 or at least 6)"
        ))),
    }
}

/// Centres a point set on its centroid and scales it to unit maximum radius.
pub fn normalise(points: &PointSet) -> Result<PointSet> {
    let centroid = points
        .xyz
        .mean_axis(Axis(0))
        .ok_or_else(|| ShapeError::degenerate("cannot normalise an empty point set"))?;

    let centered = &points.xyz - &centroid;
    let max_norm = centered
        .rows()
        .into_iter()
        .map(|r| r.dot(&r).sqrt())
        .fold(0.0, f64::max);

    let magnitude = points.xyz.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    if max_norm <= f64::EPSILON * magnitude {
        return Err(ShapeError::degenerate(
            "all points coincide, maximum radius is zero",
        ));
    }

    Ok(PointSet {
        xyz: centered / max_norm,
    })
}

/// Point sets of a simulation trajectory, keyed by 0-based frame index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameMovie {
    frames: BTreeMap<usize, PointSet>,
}

impl FrameMovie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame: usize, points: PointSet) {
        self.frames.insert(frame, points);
    }

    pub fn get(&self, frame: usize) -> Option<&PointSet> {
        self.frames.get(&frame)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frame with the highest index.
    pub fn last(&self) -> Option<&PointSet> {
        self.frames.values().next_back()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&usize, &PointSet)> {
        self.frames.iter()
    }
}

impl IntoIterator for FrameMovie {
    type Item = (usize, PointSet);
    type IntoIter = std::collections::btree_map::IntoIter<usize, PointSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}
