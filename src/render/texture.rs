use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    foundation::core::Color,
    foundation::error::RenderTestResult,
    render::contract::{Buffer, TextureId},
    render::pipeline::Pipeline,
    trace::RENDERER,
};

/// A pixel buffer together with the renderer handle uploaded from it.
///
/// The handle references the buffer's memory, so [`Texture::release`] frees the handle first and
/// the buffer second.
pub struct Texture {
    buffer: Arc<dyn Buffer>,
    handle: TextureId,
}

impl Texture {
    /// Upload `buffer` through `pipeline`.
    pub fn upload(pipeline: &mut Pipeline, buffer: Arc<dyn Buffer>) -> RenderTestResult<Self> {
        let handle = pipeline.texture(Arc::clone(&buffer))?;
        info!(target: RENDERER, texture = handle.0, "submitted texture");
        Ok(Self { buffer, handle })
    }

    pub fn handle(&self) -> TextureId {
        self.handle
    }

    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }

    pub fn release(self, pipeline: &mut Pipeline) -> RenderTestResult<()> {
        let Self { buffer, handle } = self;
        let released = pipeline.release_texture(handle);
        debug!(target: RENDERER, texture = handle.0, "released texture");
        drop(buffer);
        released
    }
}

/// Fill a whole buffer with one color by running a single bracket against it.
pub fn fill_buffer(
    pipeline: &mut Pipeline,
    buffer: Arc<dyn Buffer>,
    color: Color,
) -> RenderTestResult<()> {
    info!(
        target: RENDERER,
        r = color.r,
        g = color.g,
        b = color.b,
        a = color.a,
        "filling texture with color"
    );

    let (width, height) = (buffer.width(), buffer.height());
    pipeline.bind(buffer)?;
    pipeline.begin(width, height)?;
    pipeline.clear(color)?;
    pipeline.end(true)?;
    pipeline.unbind()
}
