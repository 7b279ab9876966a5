use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    config::RenderTestConfig,
    foundation::core::{Color, PixelBox},
    foundation::error::{RenderTestError, RenderTestResult},
    foundation::math::{self, Rotation},
    format::pixel::{DRM_FORMAT_XRGB8888, PixelFormat, describe_format},
    render::contract::{Backend, Buffer},
    render::pipeline::Pipeline,
    render::texture::{Texture, fill_buffer},
    schedule::scheduler::{FramePass, FrameScheduler, FrameTiming},
    schedule::worker::Executor,
    trace::DRIVER,
};

/// Everything the driver owns exclusively while it lives.
struct Resources {
    connector: Arc<dyn Buffer>,
    pipeline: Pipeline,
    texture: Option<Texture>,
}

/// One activation: a textured, optionally rotating box centered on the connector.
pub(crate) struct RenderPass {
    resources: Option<Resources>,
    background: Color,
    box_width: u32,
    box_height: u32,
    rotate: bool,
    rotation: Rotation,
}

impl RenderPass {
    fn draw(&self, res: &mut Resources, texture: &Texture) -> RenderTestResult<()> {
        let (width, height) = (res.connector.width(), res.connector.height());

        res.pipeline.begin(width, height)?;
        res.pipeline.clear(self.background)?;

        let region = PixelBox::centered(
            u32::from(width),
            u32::from(height),
            self.box_width,
            self.box_height,
        );
        let angle = if self.rotate {
            self.rotation.angle()
        } else {
            0.0
        };
        let matrix = math::project_box(region, angle, res.pipeline.projection());

        res.pipeline.render(texture.handle(), region, &matrix, 1.0)?;
        res.pipeline.end(true)
    }
}

impl FramePass for RenderPass {
    fn render_frame(&mut self, timing: &FrameTiming) -> RenderTestResult<()> {
        let Some(mut res) = self.resources.take() else {
            return Err(RenderTestError::backend("render resources were released"));
        };
        let outcome = self.render_with(&mut res, timing);
        self.resources = Some(res);
        outcome
    }
}

impl RenderPass {
    fn render_with(&mut self, res: &mut Resources, timing: &FrameTiming) -> RenderTestResult<()> {
        let Some(texture) = res.texture.take() else {
            return Err(RenderTestError::backend("probe texture was released"));
        };

        debug!(target: DRIVER, frame = timing.number, "render bind");
        let outcome = res
            .pipeline
            .bind(Arc::clone(&res.connector))
            .and_then(|()| self.draw(res, &texture));
        res.texture = Some(texture);
        if let Err(err) = outcome {
            if let Err(reset) = res.pipeline.abort() {
                warn!(target: DRIVER, error = %reset, "resetting renderer failed");
            }
            return Err(err);
        }

        let presented = res.connector.render().map_err(|err| {
            if err.is_recoverable() {
                err
            } else {
                RenderTestError::presentation(err.to_string())
            }
        });

        // Unbind even when the present failed, so the next frame starts unbound.
        res.pipeline.unbind()?;
        self.rotation.advance();
        presented
    }
}

/// Drives a connector through a renderer at a fixed frame rate.
///
/// Construction acquires the connector, a renderer for its device and a filled probe texture.
/// Dropping the driver stops it, then releases the texture, the renderer and the connector, in
/// that order.
pub struct RenderLoopDriver {
    scheduler: FrameScheduler<RenderPass>,
}

impl RenderLoopDriver {
    #[tracing::instrument(
        name = "render_loop",
        skip(backend, executor, config),
        fields(connector = %config.connector, fps = config.fps.get())
    )]
    pub fn new(
        backend: &dyn Backend,
        executor: Arc<dyn Executor>,
        config: &RenderTestConfig,
    ) -> RenderTestResult<Self> {
        config.validate()?;
        let format = PixelFormat::linear(DRM_FORMAT_XRGB8888);
        info!(target: DRIVER, "{}", describe_format("requesting", &format));

        let connector = backend.connector(&config.connector, config.resolution, &format, false)?;
        info!(
            target: DRIVER,
            width = connector.width(),
            height = connector.height(),
            "created connector"
        );

        let renderer = backend.renderer(connector.identifier())?;
        info!(target: DRIVER, device = connector.identifier().0, "created renderer");
        let mut pipeline = Pipeline::new(renderer);

        let probe = backend.create_buffer(
            connector.identifier(),
            config.probe_width,
            config.probe_height,
            &format,
        )?;
        fill_buffer(&mut pipeline, Arc::clone(&probe), config.probe_color)?;
        info!(
            target: DRIVER,
            width = probe.width(),
            height = probe.height(),
            "created texture"
        );
        let texture = Texture::upload(&mut pipeline, probe)?;

        let pass = RenderPass {
            resources: Some(Resources {
                connector,
                pipeline,
                texture: Some(texture),
            }),
            background: config.background,
            box_width: config.box_width,
            box_height: config.box_height,
            rotate: config.rotate,
            rotation: Rotation::new(config.rotation_step),
        };

        Ok(Self {
            scheduler: FrameScheduler::new(executor, config.fps, pass),
        })
    }

    pub fn start(&self) {
        info!(target: DRIVER, "starting render test");
        self.scheduler.start();
    }

    pub fn stop(&self) {
        info!(target: DRIVER, "stopping render test");
        self.scheduler.stop();
    }

    pub fn running(&self) -> bool {
        self.scheduler.running()
    }

    /// Frames rendered since the last start.
    pub fn frames(&self) -> u64 {
        self.scheduler.frames()
    }

    /// Ticks between two frames.
    pub fn interval(&self) -> u64 {
        self.scheduler.interval()
    }

    /// Current rotation of the probe box, in radians.
    pub fn rotation(&self) -> f64 {
        self.scheduler.with_pass(|p| p.rotation.angle())
    }

    /// The error that stopped rendering, if any. Cleared by reading it and by `start`.
    pub fn last_error(&self) -> Option<RenderTestError> {
        self.scheduler.take_error()
    }
}

impl Drop for RenderLoopDriver {
    fn drop(&mut self) {
        self.scheduler.stop();

        let Some(Resources {
            connector,
            mut pipeline,
            texture,
        }) = self.scheduler.with_pass(|p| p.resources.take())
        else {
            return;
        };

        if let Some(texture) = texture
            && let Err(err) = texture.release(&mut pipeline)
        {
            warn!(target: DRIVER, error = %err, "releasing texture failed");
        }
        drop(pipeline);
        debug!(target: DRIVER, "released renderer");
        drop(connector);
        debug!(target: DRIVER, "released connector");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/driver/render_loop.rs"]
mod tests;
