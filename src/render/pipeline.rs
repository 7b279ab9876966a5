use std::sync::Arc;

use tracing::debug;

use crate::{
    foundation::core::{Color, Matrix, PixelBox},
    foundation::error::{RenderTestError, RenderTestResult},
    render::contract::{Buffer, Renderer, TextureId},
    trace::RENDERER,
};

/// Where a [`Pipeline`] is in its bind/begin/end/unbind bracket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Unbound,
    Bound,
    InFrame,
}

impl PipelineState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Unbound => "unbound",
            Self::Bound => "bound",
            Self::InFrame => "in frame",
        }
    }
}

/// Order-checking front of a [`Renderer`].
///
/// Every call is validated against the current [`PipelineState`] and rejected with
/// [`RenderTestError::InvalidPipelineState`] before it reaches the renderer. State only advances
/// when the renderer accepted the call.
pub struct Pipeline {
    renderer: Box<dyn Renderer>,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self {
            renderer,
            state: PipelineState::Unbound,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn require(&self, op: &'static str, allowed: &[PipelineState]) -> RenderTestResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RenderTestError::invalid_pipeline(op, self.state.name()))
        }
    }

    pub fn bind(&mut self, target: Arc<dyn Buffer>) -> RenderTestResult<()> {
        self.require("bind", &[PipelineState::Unbound])?;
        debug!(
            target: RENDERER,
            width = target.width(),
            height = target.height(),
            "render bind"
        );
        self.renderer.bind(target)?;
        self.state = PipelineState::Bound;
        Ok(())
    }

    pub fn begin(&mut self, width: u16, height: u16) -> RenderTestResult<()> {
        self.require("begin", &[PipelineState::Bound])?;
        debug!(target: RENDERER, width, height, "render begin");
        self.renderer.begin(width, height)?;
        self.state = PipelineState::InFrame;
        Ok(())
    }

    pub fn clear(&mut self, color: Color) -> RenderTestResult<()> {
        self.require("clear", &[PipelineState::InFrame])?;
        debug!(target: RENDERER, ?color, "render clear");
        self.renderer.clear(color)
    }

    pub fn quadrangle(&mut self, color: Color, transform: &Matrix) -> RenderTestResult<()> {
        self.require("quadrangle", &[PipelineState::InFrame])?;
        self.renderer.quadrangle(color, transform)
    }

    pub fn render(
        &mut self,
        texture: TextureId,
        region: PixelBox,
        transform: &Matrix,
        opacity: f32,
    ) -> RenderTestResult<()> {
        self.require("render", &[PipelineState::InFrame])?;
        debug!(
            target: RENDERER,
            texture = texture.0,
            ?region,
            opacity,
            "render texture"
        );
        self.renderer.render(texture, region, transform, opacity)
    }

    pub fn projection(&self) -> Matrix {
        self.renderer.projection()
    }

    pub fn end(&mut self, present: bool) -> RenderTestResult<()> {
        self.require("end", &[PipelineState::InFrame])?;
        debug!(target: RENDERER, present, "render end");
        self.renderer.end(present)?;
        self.state = PipelineState::Bound;
        Ok(())
    }

    pub fn unbind(&mut self) -> RenderTestResult<()> {
        self.require("unbind", &[PipelineState::Bound])?;
        debug!(target: RENDERER, "render unbind");
        self.renderer.unbind()?;
        self.state = PipelineState::Unbound;
        Ok(())
    }

    /// Return to [`PipelineState::Unbound`] after a failed pass.
    ///
    /// An open frame is closed without presenting. Both steps run even when the first one fails,
    /// and the state is unbound afterwards either way. The first renderer error is returned.
    pub fn abort(&mut self) -> RenderTestResult<()> {
        let mut outcome = Ok(());
        if self.state == PipelineState::InFrame {
            debug!(target: RENDERER, "render abort frame");
            outcome = self.renderer.end(false);
            self.state = PipelineState::Bound;
        }
        if self.state == PipelineState::Bound {
            debug!(target: RENDERER, "render abort unbind");
            let unbound = self.renderer.unbind();
            self.state = PipelineState::Unbound;
            outcome = outcome.and(unbound);
        }
        outcome
    }

    /// Upload a buffer as a texture. Not allowed while a frame is open.
    pub fn texture(&mut self, buffer: Arc<dyn Buffer>) -> RenderTestResult<TextureId> {
        self.require("texture", &[PipelineState::Unbound, PipelineState::Bound])?;
        self.renderer.texture(buffer)
    }

    pub fn release_texture(&mut self, texture: TextureId) -> RenderTestResult<()> {
        self.require(
            "release_texture",
            &[PipelineState::Unbound, PipelineState::Bound],
        )?;
        self.renderer.release_texture(texture)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
