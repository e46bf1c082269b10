use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use crystalaspects::{
    batch, reader, settings::Settings, CrystalShape, ShapeClass, ShapeError,
};

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/test_data")
        .join(name)
}

#[test]
fn flat_file() {
    let read = reader::read_xyz(data("box.XYZ"), false).unwrap();
    assert_eq!(read.points.len(), 8);
    assert!(!read.is_movie());
    assert_eq!(read.progress, 100.0);
}

#[test]
fn six_column_file_keeps_coordinates() {
    let three = reader::read_xyz(data("box.XYZ"), false).unwrap();
    let six = reader::read_xyz(data("box6.XYZ"), false).unwrap();
    assert_eq!(three.points, six.points);
}

#[test]
fn movie_file() {
    let mut seen = Vec::new();
    let read = reader::read_xyz_with_progress(data("movie.XYZ"), |p| seen.push(p)).unwrap();

    assert!(read.is_movie());
    assert_eq!(read.movie.len(), 3);
    let sizes: Vec<usize> = read.movie.iter().map(|(_, p)| p.len()).collect();
    assert_eq!(sizes, vec![4, 5, 6]);

    // the single shape slot holds the last frame
    assert_eq!(&read.points, read.movie.get(2).unwrap());

    let expected = [100.0 / 3.0, 200.0 / 3.0, 100.0];
    assert_eq!(seen.len(), expected.len());
    for (got, want) in seen.iter().zip(expected) {
        assert_relative_eq!(*got, want, epsilon = 1e-9);
    }
    assert_relative_eq!(read.progress, 100.0, epsilon = 1e-9);

    assert_eq!(reader::frame_count(data("movie.XYZ")).unwrap(), 3);
}

#[test]
fn mesh_files() {
    for name in ["cube.stl", "cube.obj"] {
        let read = reader::read_xyz(data(name), false).unwrap();
        assert_eq!(read.points.len(), 8, "{name}");
        assert!(!read.is_movie());

        let shape = CrystalShape::with_points(read.points);
        assert_eq!(shape.get_zingg_analysis(false).unwrap().shape, ShapeClass::Block);
        let sa_vol = shape.get_sa_vol_ratio().unwrap();
        assert_relative_eq!(sa_vol.surface_area, 6.0, epsilon = 1e-6);
        assert_relative_eq!(sa_vol.volume, 1.0, epsilon = 1e-6);
        assert_relative_eq!(sa_vol.ratio, 6.0, epsilon = 1e-6);
    }
}

#[test]
fn unreadable_files() {
    let err = reader::read_xyz("shape.csv", false).unwrap_err();
    assert!(matches!(err, ShapeError::Format { .. }));

    let err = reader::read_xyz(data("missing.XYZ"), false).unwrap_err();
    assert!(matches!(err, ShapeError::Io(_)));

    let err = reader::read_xyz(data("missing.stl"), false).unwrap_err();
    assert!(matches!(err, ShapeError::Load { .. }));
}

#[test]
fn analyse_from_file() {
    let mut shape = CrystalShape::new();
    shape.set_xyz(None, Some(data("box6.XYZ").as_path())).unwrap();
    let result = shape.get_zingg_analysis(true).unwrap();

    assert_relative_eq!(result.x, 1.0, epsilon = 1e-9);
    assert_relative_eq!(result.y, 2.0, epsilon = 1e-9);
    assert_relative_eq!(result.z, 4.0, epsilon = 1e-9);
    assert_relative_eq!(result.aspect1, 0.5, epsilon = 1e-9);
    assert_relative_eq!(result.aspect2, 0.5, epsilon = 1e-9);
    assert_relative_eq!(result.sa.unwrap(), 28.0, epsilon = 1e-9);
    assert_relative_eq!(result.vol.unwrap(), 8.0, epsilon = 1e-9);
    assert_relative_eq!(result.sa_vol.unwrap(), 3.5, epsilon = 1e-9);
    assert_eq!(result.shape, ShapeClass::Lath);
}

#[test]
fn batch_over_test_data() {
    let settings = Settings {
        progress: false,
        ..Settings::default()
    };
    let paths = vec![data("movie.XYZ"), data("box.XYZ"), data("absent.XYZ")];
    let reports = batch::analyse_files(&paths, &settings);

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].path, paths[0]);
    let volumes: Vec<f64> = reports[0]
        .frames
        .iter()
        .map(|f| f.descriptor.vol.unwrap())
        .collect();
    assert_eq!(volumes.len(), 3);
    for (got, want) in volumes.iter().zip([1.0 / 6.0, 8.0 / 6.0, 4.5]) {
        assert_relative_eq!(*got, want, epsilon = 1e-9);
    }

    assert_eq!(reports[1].frames[0].descriptor.shape, ShapeClass::Lath);
    assert!(reports[2].error.is_some());
}
