use std::path::{Path, PathBuf};

use renderer::{BackendOptions, GpuPowerPreference, ViewerConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Synthetic,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    #[default]
    Low,
    High,
}

impl From<PowerSetting> for GpuPowerPreference {
    fn from(value: PowerSetting) -> Self {
        match value {
            PowerSetting::Low => GpuPowerPreference::Low,
            PowerSetting::High => GpuPowerPreference::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 720,
            title: "edgecam".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Frames delivered per second.
    pub fps: f32,
    /// Synthetic frame size; ignored for still images.
    pub width: u32,
    pub height: u32,
    /// Extra bytes appended to every delivered row.
    pub row_padding: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Synthetic,
            path: None,
            fps: 30.0,
            width: 640,
            height: 480,
            row_padding: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub clear_color: [f32; 4],
    pub vsync: bool,
    pub power: PowerSetting,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: ViewerConfig::default().clear_color,
            vsync: true,
            power: PowerSetting::Low,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub source: SourceConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        let source = &self.source;
        if !source.fps.is_finite() || source.fps <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "source fps must be greater than zero, got {}",
                source.fps
            )));
        }
        match source.kind {
            SourceKind::Synthetic if source.width == 0 || source.height == 0 => {
                return Err(ConfigError::Invalid(format!(
                    "synthetic frame size must be non-zero, got {}x{}",
                    source.width, source.height
                )));
            }
            SourceKind::Image if source.path.is_none() => {
                return Err(ConfigError::Invalid(
                    "image source requires a path".into(),
                ));
            }
            _ => {}
        }

        if let Some(component) = self
            .render
            .clear_color
            .iter()
            .find(|component| !(0.0..=1.0).contains(*component))
        {
            return Err(ConfigError::Invalid(format!(
                "clear colour components must lie in [0, 1], got {component}"
            )));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            clear_color: self.render.clear_color,
        }
    }

    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            power: self.render.power.into(),
            vsync: self.render.vsync,
            ..BackendOptions::default()
        }
    }
}
