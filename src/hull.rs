//! Three-dimensional convex hull of a point cloud.
//!
//! The hull is built incrementally: an initial tetrahedron is grown by adding
//! points one at a time, farthest first. Each new point removes the facets it
//! can see and is stitched to the horizon they leave behind. Points inside the
//! current hull, or within tolerance of its surface, are skipped.
//!
//! Only surface area and enclosed volume are needed downstream, so facets keep
//! indices into the input slice and nothing else.

use std::collections::HashSet;

use nalgebra::{Point3, Vector3};
use thiserror::Error;

/// Relative tolerance for visibility and degeneracy tests, scaled by the size
/// of the cloud.
pub const HULL_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn unit_cube() -> Vec<Point3<f64>> {
        let mut corners = Vec::new();
        for x in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for z in [0.0, 1.0] {
                    corners.push(Point3::new(x, y, z));
                }
            }
        }
        corners
    }

    fn assert_closed(hull: &ConvexHull) {
        let edges: HashSet<(usize, usize)> = hull
            .faces()
            .iter()
            .flat_map(|f| [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])])
            .collect();
        for &(a, b) in &edges {
            assert!(edges.contains(&(b, a)), "edge {a}->{b} has no twin");
        }
    }

    #[test]
    fn unit_cube_area_volume() {
        let hull = ConvexHull::build(&unit_cube()).unwrap();
        assert_relative_eq!(hull.volume(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(hull.area(), 6.0, epsilon = 1e-12);
        assert_eq!(hull.vertex_indices().len(), 8);
        assert_closed(&hull);
    }

    #[test]
    fn tetrahedron_area_volume() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let hull = ConvexHull::build(&points).unwrap();
        assert_eq!(hull.faces().len(), 4);
        assert_relative_eq!(hull.volume(), 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(hull.area(), 1.5 + 3.0_f64.sqrt() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn interior_and_surface_points_are_ignored() {
        // 5 x 5 x 5 lattice filling a 2 x 2 x 2 cube
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                for k in 0..5 {
                    points.push(Point3::new(i as f64 * 0.5, j as f64 * 0.5, k as f64 * 0.5));
                }
            }
        }
        let hull = ConvexHull::build(&points).unwrap();
        assert_relative_eq!(hull.volume(), 8.0, epsilon = 1e-9);
        assert_relative_eq!(hull.area(), 24.0, epsilon = 1e-9);
        assert_closed(&hull);
    }

    #[test]
    fn random_cloud_is_convex_and_closed() {
        let mut rng = rand::rng();
        let points: Vec<Point3<f64>> = (0..300)
            .map(|_| {
                Point3::new(
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-2.0..2.0),
                    rng.random_range(-0.5..0.5),
                )
            })
            .collect();
        let hull = ConvexHull::build(&points).unwrap();
        assert_closed(&hull);

        // no input point lies outside any facet
        for face in hull.faces() {
            let a = points[face[0]];
            let normal = (points[face[1]] - a).cross(&(points[face[2]] - a)).normalize();
            for p in &points {
                assert!(normal.dot(&(p - a)) <= 1e-8, "point outside hull");
            }
        }
        assert!(hull.volume() > 0.0 && hull.volume() <= 8.0);
    }

    #[test]
    fn degenerate_inputs_fail() {
        let three = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert_eq!(
            ConvexHull::build(&three).unwrap_err(),
            HullError::InsufficientPoints(3)
        );

        let line: Vec<_> = (0..6).map(|i| Point3::new(i as f64, 2.0 * i as f64, 0.0)).collect();
        assert_eq!(ConvexHull::build(&line).unwrap_err(), HullError::Collinear);

        let plane: Vec<_> = (0..9)
            .map(|i| Point3::new((i % 3) as f64, (i / 3) as f64, 1.0))
            .collect();
        assert_eq!(ConvexHull::build(&plane).unwrap_err(), HullError::Coplanar);

        let same = vec![Point3::new(1.0, 1.0, 1.0); 5];
        assert_eq!(ConvexHull::build(&same).unwrap_err(), HullError::Collinear);
    }
}

/// Reasons a hull cannot be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HullError {
    #[error("not enough points to form a hull (minimum 4 required, got {0})")]
    InsufficientPoints(usize),

    #[error("points are coincident or collinear")]
    Collinear,

    #[error("points are coplanar")]
    Coplanar,

    #[error("non-finite coordinate at point {0}")]
    NonFinite(usize),
}

/// A triangular facet with its outward plane `normal . p = offset`.
#[derive(Debug, Clone, Copy)]
struct Facet {
    vertices: [usize; 3],
    normal: Vector3<f64>,
    offset: f64,
}

impl Facet {
    fn new(points: &[Point3<f64>], vertices: [usize; 3]) -> Self {
        let [a, b, c] = vertices.map(|i| points[i]);
        let normal = (b - a)
            .cross(&(c - a))
            .try_normalize(f64::MIN_POSITIVE)
            .unwrap_or_else(Vector3::zeros);
        Self {
            vertices,
            normal,
            offset: normal.dot(&a.coords),
        }
    }

    /// Facet oriented so that `interior` lies behind it.
    fn facing_away(points: &[Point3<f64>], vertices: [usize; 3], interior: &Point3<f64>) -> Self {
        let facet = Self::new(points, vertices);
        if facet.distance(interior) > 0.0 {
            Self::new(points, [vertices[0], vertices[2], vertices[1]])
        } else {
            facet
        }
    }

    /// Signed distance of `p` above the facet plane.
    fn distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Convex hull as a closed triangle surface over the input points.
#[derive(Debug, Clone)]
pub struct ConvexHull {
    points: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    interior: Point3<f64>,
}

impl ConvexHull {
    pub fn build(points: &[Point3<f64>]) -> Result<Self, HullError> {
        let n = points.len();
        if n < 4 {
            return Err(HullError::InsufficientPoints(n));
        }
        if let Some(i) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(HullError::NonFinite(i));
        }

        let eps = tolerance(points);
        let simplex = initial_simplex(points, eps)?;
        let interior = Point3::from(
            simplex
                .iter()
                .map(|&i| points[i].coords)
                .sum::<Vector3<f64>>()
                / 4.0,
        );

        let [a, b, c, d] = simplex;
        let mut facets: Vec<Facet> = [[a, b, c], [a, b, d], [a, c, d], [b, c, d]]
            .into_iter()
            .map(|v| Facet::facing_away(points, v, &interior))
            .collect();

        // farthest points first
        let mut order: Vec<usize> = (0..n).filter(|i| !simplex.contains(i)).collect();
        order.sort_by(|&i, &j| {
            let di = (points[i] - interior).norm_squared();
            let dj = (points[j] - interior).norm_squared();
            dj.total_cmp(&di)
        });

        for idx in order {
            let p = &points[idx];
            let (visible, hidden): (Vec<Facet>, Vec<Facet>) =
                facets.into_iter().partition(|f| f.distance(p) > eps);
            facets = hidden;
            if visible.is_empty() {
                continue;
            }

            let edges: HashSet<(usize, usize)> = visible.iter().flat_map(Facet::edges).collect();
            for facet in &visible {
                for (from, to) in facet.edges() {
                    if !edges.contains(&(to, from)) {
                        facets.push(Facet::new(points, [from, to, idx]));
                    }
                }
            }
        }

        Ok(Self {
            points: points.to_vec(),
            faces: facets.into_iter().map(|f| f.vertices).collect(),
            interior,
        })
    }

    /// Triangles as indices into the input points, counter-clockwise seen from
    /// outside.
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Sorted indices of the input points that are hull vertices.
    pub fn vertex_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.faces.iter().flatten().copied().collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    pub fn area(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = f.map(|i| self.points[i]);
                0.5 * (b - a).cross(&(c - a)).norm()
            })
            .sum()
    }

    /// Enclosed volume, summed as tetrahedra from an interior point.
    pub fn volume(&self) -> f64 {
        let o = self.interior;
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = f.map(|i| self.points[i] - o);
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum::<f64>()
            .abs()
    }
}

fn tolerance(points: &[Point3<f64>]) -> f64 {
    let mut min = points[0].coords;
    let mut max = points[0].coords;
    for p in points {
        min = min.inf(&p.coords);
        max = max.sup(&p.coords);
    }
    let magnitude = min.abs().max().max(max.abs().max());
    HULL_EPSILON * (max - min).norm().max(magnitude)
}

/// Four affinely independent points: the lowest-x point, the point farthest
/// from it, the farthest from their line, and the farthest from that plane.
fn initial_simplex(points: &[Point3<f64>], eps: f64) -> Result<[usize; 4], HullError> {
    let argmax = |score: &dyn Fn(&Point3<f64>) -> f64| -> (usize, f64) {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, score(p)))
            .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best })
    };

    let (i0, _) = argmax(&|p| -p.x);
    let a = points[i0];

    let (i1, dist) = argmax(&|p| (p - a).norm());
    if dist <= eps {
        return Err(HullError::Collinear);
    }
    let dir = (points[i1] - a) / dist;

    let (i2, dist) = argmax(&|p| (p - a).cross(&dir).norm());
    if dist <= eps {
        return Err(HullError::Collinear);
    }
    let normal = (points[i1] - a).cross(&(points[i2] - a)).normalize();

    let (i3, dist) = argmax(&|p| normal.dot(&(p - a)).abs());
    if dist <= eps {
        return Err(HullError::Coplanar);
    }

    Ok([i0, i1, i2, i3])
}
