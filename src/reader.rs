//! Reading crystal shapes from simulation output and mesh files.
//!
//! Supported formats, chosen by (case-sensitive) file extension:
//! - `.XYZ`: coordinate list with a two-line header
//! - `.txt`: the same layout saved as plain text
//! - `.stl`: triangulated surface mesh, ASCII or binary
//! - `.obj`: Wavefront mesh
//!
//! Coordinate files are first read as one flat numeric table. If that fails
//! the file is retried as a movie: a sequence of frames, each made of a
//! particle-count line, a header line, and that many coordinate rows. The
//! second line of the file carries the number of frames after a `//`.
//!
//! # Key Functions
//!
//! - [`read_xyz`]: read any supported file, optionally with a progress bar
//! - [`try_parse_flat`] / [`parse_multiframe`]: the two stages for coordinate text
//! - [`frame_count`]: frames declared in a movie header

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info, warn};
use nalgebra::Point3;
use ndarray::Array2;

use crate::error::{ParseError, Result, ShapeError};
pub use crate::points::extract_xyz_columns;
use crate::points::{FrameMovie, PointSet};
use crate::progress;


/// File formats understood by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordFormat {
    Xyz,
    Txt,
    Stl,
    Obj,
}

impl CoordFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("XYZ") => Some(Self::Xyz),
            Some("txt") => Some(Self::Txt),
            Some("stl") => Some(Self::Stl),
            Some("obj") => Some(Self::Obj),
            _ => None,
        }
    }

    pub fn is_mesh(self) -> bool {
        matches!(self, Self::Stl | Self::Obj)
    }
}

/// Everything read from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzRead {
    /// The shape. For a movie this is the last frame.
    pub points: PointSet,
    /// Every frame, empty unless the file was a movie.
    pub movie: FrameMovie,
    /// Read completion in percent.
    pub progress: f64,
}

impl XyzRead {
    pub fn is_movie(&self) -> bool {
        !self.movie.is_empty()
    }
}

/// Reads a shape file, drawing a progress bar over movie frames when
/// `progress` is set.
pub fn read_xyz(path: impl AsRef<Path>, progress: bool) -> Result<XyzRead> {
    let path = path.as_ref();
    let pb = progress::new_bar(100, progress);
    if let Some(name) = path.file_name() {
        pb.set_message(name.to_string_lossy().into_owned());
    }
    let result = read_xyz_with_progress(path, |percent| pb.set_position(percent.round() as u64));
    pb.finish_and_clear();
    result
}

/// Reads a shape file, reporting read completion (0-100) to `on_progress`.
pub fn read_xyz_with_progress<F>(path: impl AsRef<Path>, mut on_progress: F) -> Result<XyzRead>
where
    F: FnMut(f64),
{
    let path = path.as_ref();
    debug!("reading {}", path.display());

    let format = CoordFormat::from_path(path).ok_or_else(|| {
        ShapeError::format(path, "unsupported extension (expected .XYZ, .txt, .stl or .obj)")
    })?;

    if format.is_mesh() {
        let points = match format {
            CoordFormat::Stl => read_stl(path)?,
            _ => read_obj(path)?,
        };
        debug!("{}: {} mesh vertices", path.display(), points.len());
        on_progress(100.0);
        return Ok(XyzRead {
            points,
            movie: FrameMovie::new(),
            progress: 100.0,
        });
    }

    let text = fs::read_to_string(path)?;
    match try_parse_flat(&text) {
        Ok(table) => {
            let points = extract_xyz_columns(table)?;
            debug!("{}: {} points", path.display(), points.len());
            on_progress(100.0);
            Ok(XyzRead {
                points,
                movie: FrameMovie::new(),
                progress: 100.0,
            })
        }
        Err(flat_err) => {
            warn!(
                "{}: not a flat coordinate table ({flat_err}), reading as movie",
                path.display()
            );
            let mut progress = 0.0;
            let movie = parse_multiframe(&text, &mut |p| {
                progress = p;
                on_progress(p);
            })
            .map_err(|movie_err| {
                ShapeError::format(
                    path,
                    format!("not a coordinate table ({flat_err}) nor a movie ({movie_err})"),
                )
            })?;
            info!("{}: read movie of {} frames", path.display(), movie.len());

            // only the final frame fills the single shape slot
            let points = movie.last().cloned().unwrap_or_else(PointSet::empty);
            Ok(XyzRead {
                points,
                movie,
                progress,
            })
        }
    }
}

/// Reads the coordinate text as one numeric table, skipping the two header
/// lines. Blank lines and `#` comments are ignored; every row must have the
/// same number of columns.
pub fn try_parse_flat(text: &str) -> std::result::Result<Array2<f64>, ParseError> {
    parse_table(text.lines().enumerate().skip(2).map(|(i, l)| (i + 1, l)))
}

/// Reads the coordinate text as a movie, calling `on_progress` with the
/// percentage of frames read after each frame.
///
/// Nothing is returned unless every declared frame parses.
pub fn parse_multiframe(
    text: &str,
    on_progress: &mut dyn FnMut(f64),
) -> std::result::Result<FrameMovie, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let header = lines
        .get(1)
        .ok_or_else(|| ParseError::new(2, "missing movie header line"))?;
    let frames = movie_frame_count(header).map_err(|msg| ParseError::new(2, msg))?;
    if frames == 0 {
        return Err(ParseError::new(2, "movie header declares zero frames"));
    }
    debug!("movie header declares {frames} frames");

    let mut movie = FrameMovie::new();
    let mut count_line = 0;
    let mut frame_line: usize = 2;

    for frame in 0..frames {
        let count_text = lines.get(count_line).map(|l| l.trim()).ok_or_else(|| {
            ParseError::new(
                count_line + 1,
                format!("frame {frame}: expected particle count, file ended"),
            )
        })?;
        let particles: usize = count_text.parse().map_err(|_| {
            ParseError::new(
                count_line + 1,
                format!("frame {frame}: invalid particle count '{count_text}'"),
            )
        })?;

        let end = frame_line
            .checked_add(particles)
            .filter(|&end| end <= lines.len())
            .ok_or_else(|| {
                ParseError::new(
                    lines.len(),
                    format!(
                        "frame {frame}: expected {particles} rows from line {}, file ended",
                        frame_line + 1
                    ),
                )
            })?;

        let table = parse_table(
            lines[frame_line..end]
                .iter()
                .enumerate()
                .map(|(i, l)| (frame_line + i + 1, *l)),
        )?;
        let points = extract_xyz_columns(table)
            .map_err(|e| ParseError::new(frame_line + 1, format!("frame {frame}: {e}")))?;
        movie.insert(frame, points);

        count_line = end;
        frame_line = count_line.saturating_add(2);
        on_progress((frame + 1) as f64 / frames as f64 * 100.0);
    }

    Ok(movie)
}

/// Number of frames declared by a movie header of the form `<label>//<frames>`.
pub fn movie_frame_count(header: &str) -> std::result::Result<usize, String> {
    let token = header
        .split("//")
        .nth(1)
        .ok_or_else(|| format!("movie header '{header}' has no '//'"))?;
    token
        .trim()
        .parse()
        .map_err(|_| format!("invalid frame count '{}' in movie header", token.trim()))
}

/// Reads only the header of a movie file and returns its frame count.
pub fn frame_count(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let header = reader
        .lines()
        .nth(1)
        .transpose()?
        .ok_or_else(|| ShapeError::format(path, "missing movie header line"))?;
    movie_frame_count(&header).map_err(|msg| ShapeError::format(path, msg))
}

/// Parses numbered lines into a table. An empty table has 3 columns.
fn parse_table<'a>(
    lines: impl Iterator<Item = (usize, &'a str)>,
) -> std::result::Result<Array2<f64>, ParseError> {
    let mut values = Vec::new();
    let mut ncols = None;
    let mut nrows = 0;

    for (line_no, line) in lines {
        let content = line.split('#').next().unwrap_or_default();
        let row = content
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    ParseError::new(line_no, format!("could not convert '{token}' to a number"))
                })
            })
            .collect::<std::result::Result<Vec<f64>, ParseError>>()?;
        if row.is_empty() {
            continue;
        }

        match ncols {
            None => ncols = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(ParseError::new(
                    line_no,
                    format!("expected {n} columns, found {}", row.len()),
                ))
            }
            _ => {}
        }
        values.extend(row);
        nrows += 1;
    }

    Array2::from_shape_vec((nrows, ncols.unwrap_or(3)), values)
        .map_err(|e| ParseError::new(0, e.to_string()))
}

fn read_stl(path: &Path) -> Result<PointSet> {
    let file = File::open(path).map_err(|e| ShapeError::load(path, e.to_string()))?;
    let mut reader = BufReader::new(file);
    let mesh = stl_io::read_stl(&mut reader).map_err(|e| ShapeError::load(path, e.to_string()))?;

    let vertices: Vec<Point3<f64>> = mesh
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    PointSet::from_points(&vertices)
}

fn read_obj(path: &Path) -> Result<PointSet> {
    let (models, _) = tobj::load_obj(path, &tobj::LoadOptions::default())
        .map_err(|e| ShapeError::load(path, e.to_string()))?;
    if models.is_empty() {
        return Err(ShapeError::load(path, "no meshes found"));
    }

    let vertices: Vec<Point3<f64>> = models
        .iter()
        .flat_map(|m| m.mesh.positions.chunks_exact(3))
        .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
        .collect();
    PointSet::from_points(&vertices)
}
