//! Field configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # Every key is optional; these are the defaults
//!
//! [images]
//! max_images = 10            # Maximum number of images in the field
//! max_file_size = 5242880    # Per-file byte ceiling (5 MiB)
//! allowed_types = ["image/jpeg", "image/png", "image/webp", "image/gif"]
//!
//! [crop]
//! aspect_ratio = [4, 3]      # width:height of the crop window
//! min_zoom = 1.0
//! max_zoom = 3.0
//!
//! [features]
//! enable_crop = true
//! enable_preview = true
//! enable_reorder = true
//! show_cover_badge = true
//! cover_badge_label = "Cover"
//!
//! [grid]
//! default = 2                # Columns per breakpoint
//! sm = 3
//! md = 4
//! lg = 4
//!
//! [sources]
//! local_upload_prefixes = ["/uploads/"]
//! ```
//!
//! A misspelled key is an error, not a silently ignored setting.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete configuration of one image field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    /// Intake limits (count, size, media types).
    pub images: ImagesConfig,
    /// Crop dialog geometry.
    pub crop: CropConfig,
    /// Feature toggles and the cover badge label.
    pub features: FeaturesConfig,
    /// Column counts per breakpoint, passed through to the presentation layer.
    pub grid: GridConfig,
    /// Source URL classification for the crop engine.
    pub sources: SourcesConfig,
}

impl FieldConfig {
    /// Reject values no field can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.max_images == 0 {
            return Err(ConfigError::Validation(
                "images.max_images must be at least 1".into(),
            ));
        }
        if self.images.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "images.max_file_size must be non-zero".into(),
            ));
        }
        if self.images.allowed_types.is_empty() {
            return Err(ConfigError::Validation(
                "images.allowed_types must not be empty".into(),
            ));
        }
        if self.crop.aspect_ratio[0] == 0 || self.crop.aspect_ratio[1] == 0 {
            return Err(ConfigError::Validation(
                "crop.aspect_ratio values must be non-zero".into(),
            ));
        }
        if !(self.crop.min_zoom >= 1.0) {
            return Err(ConfigError::Validation(
                "crop.min_zoom must be at least 1.0".into(),
            ));
        }
        if !(self.crop.max_zoom >= self.crop.min_zoom) {
            return Err(ConfigError::Validation(
                "crop.max_zoom must not be below crop.min_zoom".into(),
            ));
        }
        let grid = &self.grid;
        if [grid.base, grid.sm, grid.md, grid.lg].contains(&0) {
            return Err(ConfigError::Validation(
                "grid column counts must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Intake limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Maximum number of images the field may hold.
    pub max_images: usize,
    /// Maximum accepted size of a single file, in bytes.
    pub max_file_size: u64,
    /// Accepted media types, matched exactly.
    pub allowed_types: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_images: 10,
            max_file_size: 5 * 1024 * 1024,
            allowed_types: ["image/jpeg", "image/png", "image/webp", "image/gif"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Crop dialog settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Aspect ratio as `[width, height]`, e.g. `[4, 3]`.
    pub aspect_ratio: [u32; 2],
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl CropConfig {
    /// Aspect ratio as a float (width / height).
    pub fn aspect(&self) -> f64 {
        self.aspect_ratio[0] as f64 / self.aspect_ratio[1] as f64
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: [4, 3],
            min_zoom: 1.0,
            max_zoom: 3.0,
        }
    }
}

/// Feature toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeaturesConfig {
    pub enable_crop: bool,
    pub enable_preview: bool,
    pub enable_reorder: bool,
    pub show_cover_badge: bool,
    pub cover_badge_label: String,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            enable_crop: true,
            enable_preview: true,
            enable_reorder: true,
            show_cover_badge: true,
            cover_badge_label: "Cover".to_string(),
        }
    }
}

/// Grid column counts per breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    #[serde(rename = "default")]
    pub base: u32,
    pub sm: u32,
    pub md: u32,
    pub lg: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            base: 2,
            sm: 3,
            md: 4,
            lg: 4,
        }
    }
}

/// Source URL classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Path fragments marking URLs served by the application's own upload
    /// storage; such sources are fetched without a CORS request.
    pub local_upload_prefixes: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            local_upload_prefixes: vec!["/uploads/".to_string()],
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// `FieldConfig::default()` as a TOML table, the bottom layer of every merge.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(FieldConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Lay `overlay` over `base`, descending into tables.
///
/// A key present in both tables is merged again one level down; anything
/// else in `overlay` wins outright, and keys only `base` has survive. Arrays
/// such as `allowed_types` are replaced, not concatenated.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(top)) => {
            for (key, value) in top {
                let next = match table.remove(&key) {
                    Some(below) => merge_toml(below, value),
                    None => value,
                };
                table.insert(key, next);
            }
            toml::Value::Table(table)
        }
        (_, replacement) => replacement,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.is_file() {
        return Ok(None);
    }
    Ok(Some(toml::from_str(&fs::read_to_string(&config_path)?)?))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<FieldConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(layer) => merge_toml(base, layer),
        None => base,
    };
    let config: FieldConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Read `<dir>/config.toml` over the stock defaults. A missing file yields
/// the defaults.
pub fn load_config(dir: &Path) -> Result<FieldConfig, ConfigError> {
    resolve_config(load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml`. Used by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Stack Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Intake limits
# ---------------------------------------------------------------------------
[images]
# Maximum number of images the field may hold. A selection that would push
# the field past this count is rejected as a whole.
max_images = 10

# Largest accepted file, in bytes (5 MiB).
max_file_size = 5242880

# Accepted media types (exact match).
allowed_types = ["image/jpeg", "image/png", "image/webp", "image/gif"]

# ---------------------------------------------------------------------------
# Crop dialog
# ---------------------------------------------------------------------------
[crop]
# Crop window aspect ratio as [width, height].
aspect_ratio = [4, 3]

# Zoom range of the crop dialog.
min_zoom = 1.0
max_zoom = 3.0

# ---------------------------------------------------------------------------
# Features
# ---------------------------------------------------------------------------
[features]
enable_crop = true
enable_preview = true
enable_reorder = true
show_cover_badge = true
cover_badge_label = "Cover"

# ---------------------------------------------------------------------------
# Grid columns per breakpoint
# ---------------------------------------------------------------------------
[grid]
default = 2
sm = 3
md = 4
lg = 4

# ---------------------------------------------------------------------------
# Sources
# ---------------------------------------------------------------------------
[sources]
# URLs containing one of these path prefixes are served by the application's
# own upload storage and are fetched for cropping without a CORS request.
local_upload_prefixes = ["/uploads/"]
"##
}
