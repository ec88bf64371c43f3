use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use log::{debug, info, warn, error};
use image::Rgba;

use crate::config::{self, GalleryConfig};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to create settings directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("failed to write settings file {path:?}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

/// User overrides for the gallery constants, read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Pixel size of one atlas cell
    #[serde(default = "default_cell_size_px")]
    pub cell_size_px: u32,

    /// Image atlas background as "#rrggbb"
    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Font files tried in order for labels
    #[serde(default = "default_font_candidates")]
    pub font_candidates: Vec<String>,

    /// Pointer movement to scroll offset multiplier
    #[serde(default = "default_drag_sensitivity")]
    pub drag_sensitivity: f32,

    /// Per-frame velocity multiplier (0-1)
    #[serde(default = "default_velocity_damping")]
    pub velocity_damping: f32,

    /// Zoom while idle
    #[serde(default = "default_zoom_normal")]
    pub zoom_normal: f32,

    /// Zoom while dragging
    #[serde(default = "default_zoom_dragging")]
    pub zoom_dragging: f32,

    /// Zoom interpolation speed (0-1)
    #[serde(default = "default_zoom_lerp_speed")]
    pub zoom_lerp_speed: f32,

    /// Delay before the single readiness re-check
    #[serde(default = "default_readiness_recheck_ms")]
    pub readiness_recheck_ms: u64,
}

fn default_cell_size_px() -> u32 {
    config::DEFAULT_CELL_SIZE_PX
}

fn default_background_color() -> String {
    to_hex(config::DEFAULT_BACKGROUND_COLOR)
}

fn default_font_candidates() -> Vec<String> {
    config::DEFAULT_FONT_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

fn default_drag_sensitivity() -> f32 {
    config::DEFAULT_DRAG_SENSITIVITY
}

fn default_velocity_damping() -> f32 {
    config::DEFAULT_VELOCITY_DAMPING
}

fn default_zoom_normal() -> f32 {
    config::DEFAULT_ZOOM_NORMAL
}

fn default_zoom_dragging() -> f32 {
    config::DEFAULT_ZOOM_DRAGGING
}

fn default_zoom_lerp_speed() -> f32 {
    config::DEFAULT_ZOOM_LERP_SPEED
}

fn default_readiness_recheck_ms() -> u64 {
    config::DEFAULT_READINESS_RECHECK_MS
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            cell_size_px: default_cell_size_px(),
            background_color: default_background_color(),
            font_candidates: default_font_candidates(),
            drag_sensitivity: default_drag_sensitivity(),
            velocity_damping: default_velocity_damping(),
            zoom_normal: default_zoom_normal(),
            zoom_dragging: default_zoom_dragging(),
            zoom_lerp_speed: default_zoom_lerp_speed(),
            readiness_recheck_ms: default_readiness_recheck_ms(),
        }
    }
}

impl UserSettings {
    /// Get the path to the settings file
    /// On macOS: ~/Library/Application Support/AtlasGallery/settings.yaml
    /// On Linux: ~/.config/AtlasGallery/settings.yaml
    /// On Windows: C:\Users\<user>\AppData\Roaming\AtlasGallery\settings.yaml
    pub fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."));

        config_dir.join("AtlasGallery").join("settings.yaml")
    }

    /// Load settings from the YAML file
    /// If custom_path is provided, uses that path; otherwise uses the default settings path
    pub fn load(custom_path: Option<&Path>) -> Self {
        let path = match custom_path {
            Some(p) => {
                info!("Using custom settings path: {}", p.display());
                p.to_path_buf()
            }
            None => Self::settings_path(),
        };

        if !path.exists() {
            info!("Settings file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                error!("Failed to parse settings file at {:?}: {}", path, e);
                warn!("Using default settings");
                Self::default()
            }),
            Err(e) => {
                error!("Failed to read settings file at {:?}: {}", path, e);
                warn!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        let settings = serde_yaml::from_str::<UserSettings>(contents)?;
        debug!("Settings: cell_size_px={}, sensitivity={}, damping={}, zoom={}/{}",
            settings.cell_size_px, settings.drag_sensitivity, settings.velocity_damping,
            settings.zoom_normal, settings.zoom_dragging);
        Ok(settings)
    }

    /// Save settings to the given path (or the default settings path)
    pub fn save(&self, custom_path: Option<&Path>) -> Result<PathBuf, SettingsError> {
        let path = custom_path.map(Path::to_path_buf).unwrap_or_else(Self::settings_path);

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| SettingsError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        fs::write(&path, self.to_yaml_with_comments()).map_err(|source| SettingsError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Saved settings to {:?}", path);
        Ok(path)
    }

    /// Generate YAML content with comments for new files
    fn to_yaml_with_comments(&self) -> String {
        let fonts: String = self
            .font_candidates
            .iter()
            .map(|f| format!("  - {:?}\n", f))
            .collect();

        format!(
            r#"# AtlasGallery User Settings
# Loaded once when the gallery is created; values here override the built-in defaults.

# Pixel size of one atlas cell (both the image and the label atlas)
cell_size_px: {}

# Image atlas background colour
background_color: "{}"

# Label fonts, first loadable file wins
font_candidates:
{}
# Pointer movement to scroll offset multiplier
drag_sensitivity: {}

# Velocity multiplier applied every idle frame (0-1, lower = more friction)
velocity_damping: {}

# Zoom levels while idle and while dragging
zoom_normal: {}
zoom_dragging: {}

# Zoom interpolation speed per frame (0-1)
zoom_lerp_speed: {}

# Delay before re-checking image decode state (milliseconds)
readiness_recheck_ms: {}
"#,
            self.cell_size_px,
            self.background_color,
            fonts,
            self.drag_sensitivity,
            self.velocity_damping,
            self.zoom_normal,
            self.zoom_dragging,
            self.zoom_lerp_speed,
            self.readiness_recheck_ms,
        )
    }

    /// Build the runtime config, falling back to defaults for invalid values
    pub fn to_config(&self) -> GalleryConfig {
        let mut config = GalleryConfig::default();

        if self.cell_size_px == 0 {
            warn!("cell_size_px must be positive, keeping {}", config.atlas.cell_size_px);
        } else {
            config.atlas.cell_size_px = self.cell_size_px;
        }

        match parse_hex(&self.background_color) {
            Some(color) => config.atlas.background_color = color,
            None => warn!("Unknown background colour '{}', keeping default", self.background_color),
        }

        if !self.font_candidates.is_empty() {
            config.text.font_candidates = self.font_candidates.iter().map(PathBuf::from).collect();
        }

        if (0.0..1.0).contains(&self.velocity_damping) {
            config.drag.velocity_damping = self.velocity_damping;
        } else {
            warn!("velocity_damping {} outside [0, 1), keeping default", self.velocity_damping);
        }

        if self.zoom_lerp_speed > 0.0 && self.zoom_lerp_speed <= 1.0 {
            config.drag.zoom_lerp_speed = self.zoom_lerp_speed;
        } else {
            warn!("zoom_lerp_speed {} outside (0, 1], keeping default", self.zoom_lerp_speed);
        }

        config.drag.sensitivity = self.drag_sensitivity;
        config.drag.zoom_normal = self.zoom_normal;
        config.drag.zoom_dragging = self.zoom_dragging;
        config.readiness_recheck = Duration::from_millis(self.readiness_recheck_ms);

        config
    }
}

fn to_hex(color: [u8; 4]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

fn parse_hex(value: &str) -> Option<Rgba<u8>> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 0xff]))
}
