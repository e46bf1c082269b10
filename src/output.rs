use std::io::Write;

use anyhow::Result;
use itertools::Itertools;

use crate::batch::FileReport;
use crate::settings::OutputFormat;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ShapeClass, ShapeDescriptor};
    use crate::batch::FrameReport;
    use std::path::PathBuf;

    fn descriptor(sa_vol: bool) -> ShapeDescriptor {
        ShapeDescriptor {
            x: 1.0,
            y: 2.0,
            z: 4.0,
            pc1: 0.1,
            pc2: 0.3,
            pc3: 1.5,
            aspect1: 0.5,
            aspect2: 0.5,
            sa: sa_vol.then_some(28.0),
            vol: sa_vol.then_some(8.0),
            sa_vol: sa_vol.then_some(3.5),
            shape: ShapeClass::Lath,
        }
    }

    fn reports() -> Vec<FileReport> {
        vec![
            FileReport {
                path: PathBuf::from("box.XYZ"),
                frames: vec![FrameReport {
                    frame: None,
                    points: 8,
                    descriptor: descriptor(true),
                }],
                error: None,
            },
            FileReport {
                path: PathBuf::from("movie.XYZ"),
                frames: vec![
                    FrameReport {
                        frame: Some(0),
                        points: 8,
                        descriptor: descriptor(false),
                    },
                    FrameReport {
                        frame: Some(1),
                        points: 8,
                        descriptor: descriptor(false),
                    },
                ],
                error: None,
            },
            FileReport {
                path: PathBuf::from("bad.XYZ"),
                frames: Vec::new(),
                error: Some("cannot interpret bad.XYZ".to_string()),
            },
        ]
    }

    #[test]
    fn text_table() {
        let mut buf = Vec::new();
        write_text(&mut buf, &reports()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], format!("# {}", TEXT_COLUMNS.join(" ")));
        assert_eq!(
            lines[1],
            "box.XYZ - 1.000000 2.000000 4.000000 0.100000 0.300000 1.500000 0.500000 0.500000 28.000000 8.000000 3.500000 Lath"
        );
        assert!(lines[2].starts_with("movie.XYZ 0 "));
        assert!(lines[3].ends_with(" - - - Lath"));
        assert_eq!(lines[4], "# bad.XYZ: cannot interpret bad.XYZ");
    }

    #[test]
    fn json_reports() {
        let mut buf = Vec::new();
        write_json(&mut buf, &reports()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let files = value.as_array().unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0]["frames"][0]["shape"], "Lath");
        assert_eq!(files[0]["frames"][0]["vol"], 8.0);
        assert!(files[0]["frames"][0]["frame"].is_null());
        assert!(files[1]["frames"][1]["sa"].is_null());
        assert_eq!(files[2]["error"], "cannot interpret bad.XYZ");
        assert!(files[0].get("error").is_none());
    }
}

/// Column names of the text table.
pub const TEXT_COLUMNS: [&str; 14] = [
    "file", "frame", "x", "y", "z", "pc1", "pc2", "pc3", "aspect1", "aspect2", "sa", "vol",
    "sa_vol", "shape",
];

/// Writes the reports in the chosen format.
pub fn write_reports<W: Write>(writer: W, reports: &[FileReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(writer, reports),
        OutputFormat::Json => write_json(writer, reports),
    }
}

/// Writes one whitespace-separated row per analysed frame. Missing values
/// are written as `-`; failed files become `#` comment lines.
pub fn write_text<W: Write>(mut writer: W, reports: &[FileReport]) -> Result<()> {
    writeln!(writer, "# {}", TEXT_COLUMNS.join(" "))?;

    for report in reports {
        if let Some(error) = &report.error {
            writeln!(writer, "# {}: {}", report.path.display(), error)?;
            continue;
        }
        for frame in &report.frames {
            let d = &frame.descriptor;
            let values = [
                Some(d.x),
                Some(d.y),
                Some(d.z),
                Some(d.pc1),
                Some(d.pc2),
                Some(d.pc3),
                Some(d.aspect1),
                Some(d.aspect2),
                d.sa,
                d.vol,
                d.sa_vol,
            ]
            .iter()
            .map(|v| v.map_or_else(|| "-".to_string(), |v| format!("{v:.6}")))
            .join(" ");
            let frame_index = frame.frame.map_or_else(|| "-".to_string(), |i| i.to_string());

            writeln!(
                writer,
                "{} {} {} {}",
                report.path.display(),
                frame_index,
                values,
                d.shape
            )?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Writes the reports as a pretty-printed JSON array.
pub fn write_json<W: Write>(mut writer: W, reports: &[FileReport]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, reports)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
