use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{AppConfig, PowerSetting, SourceKind};

#[derive(Parser, Debug)]
#[command(
    name = "edgecam",
    author,
    version,
    about = "Streams edge-detected luminance frames into a window"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// TOML configuration file.
    #[arg(long, value_name = "PATH", env = "EDGECAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Feed frames from a still image instead of the synthetic pattern.
    #[arg(long, value_name = "PATH", conflicts_with = "synthetic")]
    pub image: Option<PathBuf>,

    /// Feed frames from the moving synthetic pattern.
    #[arg(long)]
    pub synthetic: bool,

    /// Frames delivered per second by the source.
    #[arg(long, value_name = "FPS")]
    pub source_fps: Option<f32>,

    /// Synthetic frame size (e.g. `640x480`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub frame_size: Option<(u32, u32)>,

    /// Extra bytes of padding after every source row.
    #[arg(long, value_name = "BYTES")]
    pub row_padding: Option<u32>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub window_size: Option<(u32, u32)>,

    /// Clear colour as `r,g,b` or `r,g,b,a` with components in [0, 1].
    #[arg(long, value_name = "RGBA", value_parser = parse_color)]
    pub clear_color: Option<[f32; 4]>,

    /// Present with vsync: `on` or `off`.
    #[arg(long, value_name = "MODE", value_parser = parse_switch)]
    pub vsync: Option<bool>,

    /// GPU power preference: `low` or `high`.
    #[arg(long, value_name = "PREFERENCE", value_parser = parse_power)]
    pub power: Option<PowerSetting>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the effective configuration as TOML and exit.
    Config,
}

pub fn parse() -> Cli {
    Cli::parse()
}

impl RunArgs {
    /// Applies every flag that was given on top of `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.image {
            config.source.kind = SourceKind::Image;
            config.source.path = Some(path.clone());
        }
        if self.synthetic {
            config.source.kind = SourceKind::Synthetic;
        }
        if let Some(fps) = self.source_fps {
            config.source.fps = fps;
        }
        if let Some((width, height)) = self.frame_size {
            config.source.width = width;
            config.source.height = height;
        }
        if let Some(padding) = self.row_padding {
            config.source.row_padding = padding;
        }
        if let Some((width, height)) = self.window_size {
            config.window.width = width;
            config.window.height = height;
        }
        if let Some(color) = self.clear_color {
            config.render.clear_color = color;
        }
        if let Some(vsync) = self.vsync {
            config.render.vsync = vsync;
        }
        if let Some(power) = self.power {
            config.render.power = power;
        }
    }
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{trimmed}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be non-zero, got '{trimmed}'"));
    }
    Ok((width, height))
}

pub fn parse_color(value: &str) -> Result<[f32; 4], String> {
    let components = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|_| format!("invalid colour component '{}'", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match components.as_slice() {
        [r, g, b] => Ok([*r, *g, *b, 1.0]),
        [r, g, b, a] => Ok([*r, *g, *b, *a]),
        _ => Err(format!(
            "expected 3 or 4 comma-separated components, got {}",
            components.len()
        )),
    }
}

pub fn parse_switch(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("unknown switch value '{other}'; expected on or off")),
    }
}

pub fn parse_power(value: &str) -> Result<PowerSetting, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" => Ok(PowerSetting::Low),
        "high" | "high-performance" => Ok(PowerSetting::High),
        other => Err(format!("unknown power preference '{other}'; expected low or high")),
    }
}
