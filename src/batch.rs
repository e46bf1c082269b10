//! Analysis of several shape files and of every frame of a movie.
//!
//! Files are independent, as are the frames of a movie, so both are analysed
//! in parallel with rayon. Every task builds its own [`CrystalShape`]; no
//! analyser is shared between threads.
//!
//! A file that fails to read or analyse does not stop the batch. Its report
//! carries the error instead of frames.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::{CrystalShape, ShapeDescriptor};
use crate::error::Result;
use crate::points::{normalise, PointSet};
use crate::progress;
use crate::reader;
use crate::settings::Settings;


/// Descriptors of one frame of a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    /// Frame index for movie files.
    pub frame: Option<usize>,
    /// Number of points analysed.
    pub points: usize,
    #[serde(flatten)]
    pub descriptor: ShapeDescriptor,
}

/// Result of analysing one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub frames: Vec<FrameReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    fn new(path: &Path, result: Result<Vec<FrameReport>>) -> Self {
        match result {
            Ok(frames) => Self {
                path: path.to_path_buf(),
                frames,
                error: None,
            },
            Err(err) => {
                warn!("{}: {err}", path.display());
                Self {
                    path: path.to_path_buf(),
                    frames: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// Analyses every file in parallel. Reports are returned in input order.
pub fn analyse_files(paths: &[PathBuf], settings: &Settings) -> Vec<FileReport> {
    let pb = progress::new_bar(paths.len() as u64, settings.progress);
    pb.set_message("files");

    let reports = paths
        .par_iter()
        .map(|path| {
            let report = FileReport::new(path, analyse_file(path, settings));
            pb.inc(1);
            report
        })
        .collect();

    pb.finish_and_clear();
    reports
}

/// Analyses one file: every frame of a movie when `settings.all_frames` is
/// set, otherwise the single shape the reader retains.
pub fn analyse_file(path: &Path, settings: &Settings) -> Result<Vec<FrameReport>> {
    let read = reader::read_xyz(path, false)?;

    if !read.is_movie() {
        return Ok(vec![analyse_frame(None, read.points, settings)?]);
    }

    if !settings.all_frames {
        let last = read.movie.len() - 1;
        return Ok(vec![analyse_frame(Some(last), read.points, settings)?]);
    }

    debug!("{}: analysing {} frames", path.display(), read.movie.len());
    let frames: Vec<(usize, PointSet)> = read.movie.into_iter().collect();
    frames
        .into_par_iter()
        .map(|(frame, points)| analyse_frame(Some(frame), points, settings))
        .collect()
}

fn analyse_frame(frame: Option<usize>, points: PointSet, settings: &Settings) -> Result<FrameReport> {
    let points = if settings.normalise {
        normalise(&points)?
    } else {
        points
    };
    let count = points.len();
    let descriptor = CrystalShape::with_points(points).get_zingg_analysis(settings.get_sa_vol)?;
    Ok(FrameReport {
        frame,
        points: count,
        descriptor,
    })
}

/// Frame count declared by each movie file's header, in input order.
pub fn frame_counts(paths: &[PathBuf]) -> Result<Vec<usize>> {
    paths.iter().map(reader::frame_count).collect()
}
