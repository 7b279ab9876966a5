use std::{path::PathBuf, sync::Arc};

use crate::{
    foundation::core::{Color, Matrix, PixelBox, Resolution},
    foundation::error::{RenderTestError, RenderTestResult},
    format::pixel::PixelFormat,
};

/// Opaque identifier of the GPU device a buffer was allocated on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

/// Renderer-allocated handle of an uploaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// A displayable or offscreen pixel buffer.
///
/// Connectors are buffers too: `render` presents their current contents. For plain offscreen
/// buffers presenting is a no-op.
pub trait Buffer: Send + Sync {
    fn width(&self) -> u16;

    fn height(&self) -> u16;

    fn identifier(&self) -> DeviceId;

    fn format(&self) -> &PixelFormat;

    /// Present the current contents.
    fn render(&self) -> RenderTestResult<()>;

    /// Copy out tightly packed RGBA8 rows, for buffers that are CPU mappable.
    fn read_pixels(&self) -> RenderTestResult<Vec<u8>> {
        Err(RenderTestError::backend("buffer is not CPU mappable"))
    }

    /// Replace the contents with tightly packed RGBA8 rows.
    fn write_pixels(&self, _rgba8: &[u8]) -> RenderTestResult<()> {
        Err(RenderTestError::backend("buffer is not CPU mappable"))
    }
}

/// Stateful drawing context.
///
/// Calls are only meaningful in the order `bind`, `begin`, draw calls, `end`, `unbind`.
/// [`crate::Pipeline`] enforces that order before any call reaches an implementation.
pub trait Renderer: Send {
    fn bind(&mut self, target: Arc<dyn Buffer>) -> RenderTestResult<()>;

    fn unbind(&mut self) -> RenderTestResult<()>;

    fn begin(&mut self, width: u16, height: u16) -> RenderTestResult<()>;

    fn clear(&mut self, color: Color) -> RenderTestResult<()>;

    /// Fill the unit square mapped through `transform` with a solid color.
    fn quadrangle(&mut self, color: Color, transform: &Matrix) -> RenderTestResult<()>;

    /// Upload `buffer` and return a handle that stays valid until released.
    fn texture(&mut self, buffer: Arc<dyn Buffer>) -> RenderTestResult<TextureId>;

    fn release_texture(&mut self, texture: TextureId) -> RenderTestResult<()>;

    /// Draw `texture` over `region`, with the unit square mapped through `transform`.
    fn render(
        &mut self,
        texture: TextureId,
        region: PixelBox,
        transform: &Matrix,
        opacity: f32,
    ) -> RenderTestResult<()>;

    /// Pixel-to-clip-space projection of the frame in progress.
    fn projection(&self) -> Matrix;

    /// Finish the frame; `present` flushes it into the bound buffer.
    fn end(&mut self, present: bool) -> RenderTestResult<()>;
}

/// Factory for connectors, renderers and offscreen buffers.
pub trait Backend: Send + Sync {
    /// Open a display connector by name, e.g. `card0-HDMI-A-1`.
    fn connector(
        &self,
        name: &str,
        resolution: Resolution,
        format: &PixelFormat,
        force_modeset: bool,
    ) -> RenderTestResult<Arc<dyn Buffer>>;

    /// Instantiate a renderer on the device a connector lives on.
    fn renderer(&self, device: DeviceId) -> RenderTestResult<Box<dyn Renderer>>;

    /// Allocate an offscreen buffer on `device`.
    fn create_buffer(
        &self,
        device: DeviceId,
        width: u16,
        height: u16,
        format: &PixelFormat,
    ) -> RenderTestResult<Arc<dyn Buffer>>;
}

/// Available backend kinds.
///
/// - `Headless` is always available: memory-backed connectors and a CPU renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Headless,
}

/// Backend-agnostic settings.
#[derive(Clone, Debug, Default)]
pub struct BackendSettings {
    /// If set, every presented connector frame is written here as a PNG.
    pub dump_dir: Option<PathBuf>,
}

/// Create a backend implementation.
pub fn create_backend(
    kind: BackendKind,
    settings: &BackendSettings,
) -> RenderTestResult<Box<dyn Backend>> {
    match kind {
        BackendKind::Headless => Ok(Box::new(crate::render::headless::HeadlessBackend::new(
            settings.clone(),
        ))),
    }
}
