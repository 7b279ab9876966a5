use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use serde::de::DeserializeOwned;

use crate::{
    foundation::core::{Color, Fps, Resolution},
    foundation::error::{RenderTestError, RenderTestResult},
};

/// Settings of the scheduled render loop.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderTestConfig {
    pub connector: String,
    pub resolution: Resolution,
    pub fps: Fps,
    pub background: Color,
    /// Solid color the probe texture is filled with once at construction.
    pub probe_color: Color,
    pub probe_width: u16,
    pub probe_height: u16,
    /// Size of the centered box the probe texture is drawn into.
    pub box_width: u32,
    pub box_height: u32,
    pub rotate: bool,
    /// Radians added per frame.
    pub rotation_step: f64,
}

impl Default for RenderTestConfig {
    fn default() -> Self {
        Self {
            connector: "card1-HDMI-A-1".to_owned(),
            resolution: Resolution::R720p,
            fps: Fps::default(),
            background: Color::DARK_GRAY,
            probe_color: Color::GREEN,
            probe_width: 10,
            probe_height: 10,
            box_width: 500,
            box_height: 500,
            rotate: true,
            rotation_step: 0.05,
        }
    }
}

impl RenderTestConfig {
    pub fn validate(&self) -> RenderTestResult<()> {
        if self.connector.trim().is_empty() {
            return Err(RenderTestError::validation("connector must not be empty"));
        }
        if self.probe_width == 0 || self.probe_height == 0 {
            return Err(RenderTestError::validation("probe texture must be non-empty"));
        }
        if self.box_width == 0 || self.box_height == 0 {
            return Err(RenderTestError::validation("box must be non-empty"));
        }
        if !self.rotation_step.is_finite() {
            return Err(RenderTestError::validation("rotation_step must be finite"));
        }
        Ok(())
    }
}

/// How a draw index picks its palette entry.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PaletteIndexing {
    /// `i mod len`: every entry is used in turn.
    #[default]
    Wrapping,
    /// `i mod (len - 1)`: the reference tool's indexing, which never reaches the last entry.
    Legacy,
}

impl PaletteIndexing {
    pub fn index(self, i: usize, len: usize) -> usize {
        match self {
            Self::Wrapping => i % len.max(1),
            Self::Legacy => i.checked_rem(len.saturating_sub(1)).unwrap_or(0),
        }
    }
}

/// Settings of the open-loop quadrangle smoke test.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuadTestConfig {
    pub connector: String,
    pub resolution: Resolution,
    pub clear: Color,
    pub palette: Vec<Color>,
    pub palette_indexing: PaletteIndexing,
    /// Frames drawn are `cycles + 1`.
    pub cycles: u8,
    /// Quadrangles per frame are `quads + 1`.
    pub quads: u8,
    pub quad_width: f64,
    pub quad_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub frame_delay_ms: u64,
}

impl Default for QuadTestConfig {
    fn default() -> Self {
        Self {
            connector: "card0-HDMI-A-2".to_owned(),
            resolution: Resolution::R1080p,
            clear: Color::WHITE,
            palette: vec![Color::RED, Color::GREEN, Color::BLUE],
            palette_indexing: PaletteIndexing::default(),
            cycles: 10,
            quads: 10,
            quad_width: 60.0,
            quad_height: 120.0,
            offset_x: 30.0,
            offset_y: 60.0,
            frame_delay_ms: 1_000,
        }
    }
}

impl QuadTestConfig {
    pub fn validate(&self) -> RenderTestResult<()> {
        if self.connector.trim().is_empty() {
            return Err(RenderTestError::validation("connector must not be empty"));
        }
        if self.palette.is_empty() {
            return Err(RenderTestError::validation("palette must not be empty"));
        }
        if !(self.quad_width > 0.0 && self.quad_height > 0.0) {
            return Err(RenderTestError::validation("quad size must be positive"));
        }
        if !(self.offset_x.is_finite() && self.offset_y.is_finite()) {
            return Err(RenderTestError::validation("offset must be finite"));
        }
        Ok(())
    }

    /// Palette entry for draw index `i`.
    pub fn color(&self, i: usize) -> Color {
        let idx = self.palette_indexing.index(i, self.palette.len());
        self.palette.get(idx).copied().unwrap_or(self.clear)
    }
}

/// Read a JSON config file. Missing fields take their defaults.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> RenderTestResult<T> {
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let r = BufReader::new(f);
    let cfg = serde_json::from_reader(r)
        .with_context(|| format!("parse config JSON '{}'", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
