use crate::foundation::error::{RenderTestError, RenderTestResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// 2D transform handed to the renderer. Maps the unit square onto clip space.
pub type Matrix = kurbo::Affine;

/// Scheduler ticks are microseconds.
pub const TICKS_PER_MILLISECOND: u64 = 1_000;
pub const MILLISECONDS_PER_SECOND: u64 = 1_000;
pub const TICKS_PER_SECOND: u64 = TICKS_PER_MILLISECOND * MILLISECONDS_PER_SECOND;

/// Straight-alpha RGBA color, each channel in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const RED: Self = Self::rgba(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::rgba(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::rgba(0.0, 0.0, 1.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const GRAY: Self = Self::rgba(0.5, 0.5, 0.5, 1.0);
    pub const DARK_GRAY: Self = Self::rgba(0.25, 0.25, 0.25, 1.0);

    /// Quantize to straight RGBA8, clamping out-of-range channels.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn q(c: f32) -> u8 {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Integer pixel region on a target buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelBox {
    /// A `width` x `height` box centered on a `target_w` x `target_h` surface.
    pub fn centered(target_w: u32, target_h: u32, width: u32, height: u32) -> Self {
        let half = |v: u32| i64::from(v / 2);
        Self {
            x: (half(target_w) - half(width)) as i32,
            y: (half(target_h) - half(height)) as i32,
            width,
            height,
        }
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x) + f64::from(self.width),
            f64::from(self.y) + f64::from(self.height),
        )
    }
}

/// Target frame rate of a scheduled render loop. Always > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Fps(u8);

impl Fps {
    pub fn new(fps: u8) -> RenderTestResult<Self> {
        if fps == 0 {
            return Err(RenderTestError::validation("fps must be > 0"));
        }
        Ok(Self(fps))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Ticks between two activations: one second divided by the frame rate.
    pub fn interval_ticks(self) -> u64 {
        TICKS_PER_SECOND / u64::from(self.0)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for Fps {
    type Error = RenderTestError;

    fn try_from(value: u8) -> RenderTestResult<Self> {
        Self::new(value)
    }
}

impl From<Fps> for u8 {
    fn from(value: Fps) -> Self {
        value.0
    }
}

/// Screen resolutions a connector can be asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
pub enum Resolution {
    #[value(name = "480p")]
    #[serde(rename = "480p")]
    R480p,
    #[value(name = "720p")]
    #[serde(rename = "720p")]
    R720p,
    #[value(name = "1080p")]
    #[serde(rename = "1080p")]
    R1080p,
    #[value(name = "2160p")]
    #[serde(rename = "2160p")]
    R2160p,
}

impl Resolution {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::R480p => (720, 480),
            Self::R720p => (1280, 720),
            Self::R1080p => (1920, 1080),
            Self::R2160p => (3840, 2160),
        }
    }
}
