use std::collections::BTreeMap;
use std::path::PathBuf;

use crystalaspects::points::rows_to_array;
use crystalaspects::{self as ca, PointSet, ShapeDescriptor, ShapeError};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

type Rows = Vec<Vec<f64>>;

fn to_py_err(err: ShapeError) -> PyErr {
    match err {
        ShapeError::Load { .. } | ShapeError::Io(_) => PyIOError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Morphology descriptors of one crystal shape.
#[pyclass(get_all)]
#[derive(Debug, Clone)]
pub struct ShapeInfo {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pc1: f64,
    pub pc2: f64,
    pub pc3: f64,
    pub aspect1: f64,
    pub aspect2: f64,
    pub sa: Option<f64>,
    pub vol: Option<f64>,
    pub sa_vol: Option<f64>,
    pub shape: String,
}

impl From<ShapeDescriptor> for ShapeInfo {
    fn from(d: ShapeDescriptor) -> Self {
        Self {
            x: d.x,
            y: d.y,
            z: d.z,
            pc1: d.pc1,
            pc2: d.pc2,
            pc3: d.pc3,
            aspect1: d.aspect1,
            aspect2: d.aspect2,
            sa: d.sa,
            vol: d.vol,
            sa_vol: d.sa_vol,
            shape: d.shape.to_string(),
        }
    }
}

#[pymethods]
impl ShapeInfo {
    fn __repr__(&self) -> String {
        format!(
            "ShapeInfo(x={}, y={}, z={}, aspect1={:.4}, aspect2={:.4}, shape='{}')",
            self.x, self.y, self.z, self.aspect1, self.aspect2, self.shape
        )
    }
}

/// Analyser holding the point set of one crystal.
#[pyclass(name = "CrystalShape")]
#[derive(Debug, Clone, Default)]
pub struct PyCrystalShape {
    inner: ca::CrystalShape,
}

#[pymethods]
impl PyCrystalShape {
    #[new]
    fn py_new() -> Self {
        Self::default()
    }

    /// Set the shape from a list of rows or a file. The file wins when both
    /// are given.
    #[pyo3(signature = (xyz_array=None, filepath=None))]
    fn set_xyz(&mut self, xyz_array: Option<Rows>, filepath: Option<PathBuf>) -> PyResult<()> {
        let array = xyz_array
            .map(|rows| rows_to_array(&rows))
            .transpose()
            .map_err(to_py_err)?;
        self.inner
            .set_xyz(array, filepath.as_deref())
            .map_err(to_py_err)
    }

    /// The active point set as a list of rows.
    #[getter]
    fn get_xyz(&self) -> Option<Rows> {
        self.inner.points().map(PointSet::to_rows)
    }

    #[pyo3(signature = (get_sa_vol=true))]
    fn get_zingg_analysis(&self, py: Python<'_>, get_sa_vol: bool) -> PyResult<ShapeInfo> {
        py.allow_threads(|| self.inner.get_zingg_analysis(get_sa_vol))
            .map(ShapeInfo::from)
            .map_err(to_py_err)
    }

    /// Surface area, volume and their ratio.
    fn get_sa_vol_ratio(&self) -> PyResult<Vec<f64>> {
        self.inner
            .get_sa_vol_ratio()
            .map(|sa_vol| sa_vol.to_array().to_vec())
            .map_err(to_py_err)
    }

    /// Read a shape file. Returns the points, the movie frames (empty for a
    /// single shape) and the read completion percentage.
    #[staticmethod]
    #[pyo3(name = "read_XYZ", signature = (filepath, progress=true))]
    fn read_xyz(filepath: PathBuf, progress: bool) -> PyResult<(Rows, BTreeMap<usize, Rows>, f64)> {
        let read = ca::read_xyz(&filepath, progress).map_err(to_py_err)?;
        let movie = read
            .movie
            .iter()
            .map(|(frame, points)| (*frame, points.to_rows()))
            .collect();
        Ok((read.points.to_rows(), movie, read.progress))
    }
}

/// Centre a point set on its centroid and scale it to unit radius.
#[pyfunction]
fn normalise(rows: Rows) -> PyResult<Rows> {
    let points = rows_to_array(&rows)
        .and_then(PointSet::new)
        .map_err(to_py_err)?;
    ca::normalise(&points)
        .map(|p| p.to_rows())
        .map_err(to_py_err)
}

#[pymodule]
fn _crystalaspects(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCrystalShape>()?;
    m.add_class::<ShapeInfo>()?;
    m.add_function(wrap_pyfunction!(normalise, m)?)?;
    Ok(())
}
