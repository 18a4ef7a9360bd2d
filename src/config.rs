// Settings: defaults, then an optional TOML file, then SURFACE_CANVAS__* env vars,
// then command-line flags. Later layers win.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::info;

use crate::camera::{DepthScale, Subscription};
use crate::error::Error;
use crate::interaction::InteractionConfig;
use crate::storage::DEFAULT_KEY;
use crate::types::Color;

const ENV_PREFIX: &str = "SURFACE_CANVAS__";

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Left mouse button held = a hand on the surface.
    Pointer,
    /// Grayscale depth stream from a camera.
    Camera,
}

#[derive(Debug, Parser)]
#[command(name = "surface-canvas", about = "Paint on a projected surface with your hand")]
pub struct Args {
    /// TOML settings file. Defaults to ./surface-canvas.toml when present.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,
    #[arg(long)]
    pub camera_index: Option<u32>,
    #[arg(long)]
    pub width: Option<usize>,
    #[arg(long)]
    pub height: Option<usize>,
    /// Fixed seed for brush jitter (reproducible sessions).
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub source: SourceKind,
    pub camera_index: u32,
    pub seed: Option<u64>,
    /// Color of the start-up border.
    pub border: Color,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            source: SourceKind::Pointer,
            camera_index: 0,
            seed: None,
            border: Color::rgb(0x33, 0xCC, 0xFF),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub dir: PathBuf,
    pub key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { dir: PathBuf::from("./drawings"), key: DEFAULT_KEY.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaletteSettings {
    pub colors: Vec<Color>,
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self {
            colors: vec![
                Color::rgb(0x00, 0x00, 0x00),
                Color::rgb(0xE5, 0x39, 0x35),
                Color::rgb(0xFB, 0x8C, 0x00),
                Color::rgb(0xFD, 0xD8, 0x35),
                Color::rgb(0x43, 0xA0, 0x47),
                Color::rgb(0x1E, 0x88, 0xE5),
                Color::rgb(0x8E, 0x24, 0xAA),
                Color::rgb(0x6D, 0x4C, 0x41),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppSettings,
    pub subscription: Subscription,
    pub depth: DepthScale,
    pub interaction: InteractionConfig,
    pub palette: PaletteSettings,
    pub storage: StorageSettings,
}

impl Config {
    /// Parse a TOML document; missing sections and keys keep their defaults.
    pub fn from_toml(raw: &str) -> Result<Self, Error> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("parse TOML: {e}")))
    }

    /// Build the effective config from every layer.
    pub fn load(args: &Args) -> Result<Self, Error> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new("surface-canvas.toml");
                if default_path.exists() { Self::from_file(default_path)? } else { Self::default() }
            }
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.apply_args(args);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(path: &Path) -> Result<Self, Error> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        info!(path = %path.display(), "loaded config file");
        Self::from_toml(&raw)
    }

    /// Environment overrides. `lookup` is injected so tests need not touch the real env.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), Error> {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = get("SOURCE") {
            self.app.source = SourceKind::from_str(&v, true)
                .map_err(|e| Error::Config(format!("{ENV_PREFIX}SOURCE: {e}")))?;
        }
        if let Some(v) = get("CAMERA_INDEX") {
            self.app.camera_index = parse_env("CAMERA_INDEX", &v)?;
        }
        if let Some(v) = get("SEED") {
            self.app.seed = Some(parse_env("SEED", &v)?);
        }
        if let Some(v) = get("STORE_DIR") {
            self.storage.dir = PathBuf::from(v);
        }
        if let Some(v) = get("MIN_POINTS") {
            self.interaction.min_points = parse_env("MIN_POINTS", &v)?;
        }
        if let Some(v) = get("SURFACE_Z_OFFSET") {
            self.subscription.surface_z_offset = parse_env("SURFACE_Z_OFFSET", &v)?;
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(v) = args.source {
            self.app.source = v;
        }
        if let Some(v) = args.camera_index {
            self.app.camera_index = v;
        }
        if let Some(v) = args.width {
            self.interaction.canvas_width = v;
        }
        if let Some(v) = args.height {
            self.interaction.canvas_height = v;
        }
        if args.seed.is_some() {
            self.app.seed = args.seed;
        }
        if let Some(v) = &args.store_dir {
            self.storage.dir = v.clone();
        }
    }

    /// Checks that belong to the app itself. Subscription options are checked by the camera.
    pub fn validate(&self) -> Result<(), Error> {
        let i = &self.interaction;
        if i.canvas_width == 0 || i.canvas_height == 0 {
            return Err(Error::Config("canvas size must be non-zero".into()));
        }
        let fps_ok = i.fps.is_finite() && i.fps > 0.0;
        let dwell_ok = i.seconds_to_click.is_finite() && i.seconds_to_click >= 0.0;
        if !fps_ok || !dwell_ok {
            return Err(Error::Config(format!(
                "fps must be > 0 and seconds_to_click >= 0 (got {} / {})",
                i.fps, i.seconds_to_click
            )));
        }
        if self.palette.colors.is_empty() {
            return Err(Error::Config("palette.colors is empty".into()));
        }
        if self.storage.key.trim().is_empty() {
            return Err(Error::Config("storage.key is empty".into()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("{ENV_PREFIX}{name}={raw:?}: {e}")))
}
