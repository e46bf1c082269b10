use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "CRYSTALASPECTS";


/// How analysis results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Runtime configuration for the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Compute convex hull surface area and volume.
    pub get_sa_vol: bool,
    /// Centre and scale every shape to unit radius before analysis.
    pub normalise: bool,
    /// Draw progress bars on stderr.
    pub progress: bool,
    /// Analyse every frame of a movie rather than only the last one.
    pub all_frames: bool,
    pub output: OutputFormat,
    /// Default log filter, used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            get_sa_vol: true,
            normalise: false,
            progress: true,
            all_frames: true,
            output: OutputFormat::Text,
            log_level: "info".to_string(),
        }
    }
}

/// Loads the configuration and the files to analyse.
///
/// Sources, later ones winning: built-in defaults, `config/default.toml`,
/// `config/local.toml`, the file passed with `--config`, `CRYSTALASPECTS_*`
/// environment variables, and command-line flags.
pub fn load_config() -> Result<(Settings, CliArgs)> {
    let args = CliArgs::parse();

    let mut files = Vec::new();
    if let Some(root) = retrieve_project_root() {
        files.push(root.join("config/default.toml"));
        files.push(root.join("config/local.toml"));
    }

    let mut settings = build_settings(&files, args.config.as_deref())?;
    args.apply(&mut settings);
    validate_config(&settings)?;

    Ok((settings, args))
}

/// Layers the optional config `files`, an explicit (required) file and the
/// environment on top of the defaults.
pub fn build_settings(files: &[PathBuf], explicit: Option<&Path>) -> Result<Settings> {
    let mut builder = Config::builder();
    for file in files {
        builder = builder.add_source(File::from(file.as_path()).required(false));
    }
    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    let settings: Settings = builder
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .build()
        .context("Error loading configuration")?
        .try_deserialize()
        .context("Error deserializing configuration")?;

    Ok(settings)
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the CRYSTALASPECTS_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
/// If none of these work the built-in defaults apply.
fn retrieve_project_root() -> Option<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        return Some(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var(format!("{ENV_PREFIX}_ROOT_DIR")) {
        return Some(PathBuf::from(path));
    }

    let exe_path = env::current_exe().ok()?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(Path::to_path_buf)
}

fn validate_config(config: &Settings) -> Result<()> {
    if config.log_level.parse::<log::LevelFilter>().is_err() {
        bail!("Unknown log level '{}'", config.log_level);
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "crystalaspects - Zingg morphology of simulated crystal shapes"
)]
pub struct CliArgs {
    /// Shape files to analyse (.XYZ, .txt, .stl or .obj). Movie files are
    /// detected automatically.
    #[arg(required_unless_present = "print_config")]
    pub files: Vec<PathBuf>,

    /// Skip the convex hull surface area and volume.
    #[arg(long)]
    no_sa_vol: bool,

    /// Centre each shape and scale it to unit radius before analysis.
    #[arg(long)]
    normalise: bool,

    /// Only analyse the last frame of movie files.
    #[arg(long)]
    last_frame_only: bool,

    /// Output format.
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Shorthand for `--output json`.
    #[arg(long, conflicts_with = "output")]
    json: bool,

    /// Hide progress bars.
    #[arg(short, long)]
    quiet: bool,

    /// Additional configuration file layered over the defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the merged configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Print the number of frames declared by each movie file and exit.
    #[arg(long)]
    pub frames: bool,
}

impl CliArgs {
    /// Applies command-line overrides to `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if self.no_sa_vol {
            settings.get_sa_vol = false;
        }
        if self.normalise {
            settings.normalise = true;
        }
        if self.last_frame_only {
            settings.all_frames = false;
        }
        if let Some(output) = self.output {
            settings.output = output;
        }
        if self.json {
            settings.output = OutputFormat::Json;
        }
        if self.quiet {
            settings.progress = false;
        }
    }
}
