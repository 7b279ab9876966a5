use std::{sync::Arc, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    config::QuadTestConfig,
    foundation::error::RenderTestResult,
    foundation::math,
    format::pixel::{DRM_FORMAT_ARGB8888, PixelFormat, describe_format},
    render::contract::{Backend, Buffer},
    render::pipeline::Pipeline,
    trace::DRIVER,
};

/// What a finished smoke test did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuadReport {
    pub frames: u32,
    pub quads: u32,
    /// Presents that failed and were skipped.
    pub missed_presents: u32,
}

/// Open-loop smoke test: a fixed number of frames, each a diagonal run of colored quadrangles,
/// with a fixed pause after every present.
pub struct QuadSmokeTest {
    pipeline: Pipeline,
    connector: Arc<dyn Buffer>,
    config: QuadTestConfig,
}

impl QuadSmokeTest {
    #[tracing::instrument(name = "quadtest", skip(backend, config), fields(connector = %config.connector))]
    pub fn new(backend: &dyn Backend, config: QuadTestConfig) -> RenderTestResult<Self> {
        config.validate()?;
        let format = PixelFormat::linear(DRM_FORMAT_ARGB8888);
        info!(target: DRIVER, "{}", describe_format("requesting", &format));

        let connector = backend.connector(&config.connector, config.resolution, &format, false)?;
        let renderer = backend.renderer(connector.identifier())?;
        info!(
            target: DRIVER,
            width = connector.width(),
            height = connector.height(),
            device = connector.identifier().0,
            "created connector and renderer"
        );

        Ok(Self {
            pipeline: Pipeline::new(renderer),
            connector,
            config,
        })
    }

    pub fn config(&self) -> &QuadTestConfig {
        &self.config
    }

    /// Draw every frame. The renderer stays bound to the connector for the whole run.
    pub fn run(&mut self) -> RenderTestResult<QuadReport> {
        let (width, height) = (self.connector.width(), self.connector.height());
        let delay = Duration::from_millis(self.config.frame_delay_ms);
        let mut report = QuadReport::default();

        info!(target: DRIVER, "render bind");
        self.pipeline.bind(Arc::clone(&self.connector))?;

        if let Err(err) = self.draw_cycles(width, height, delay, &mut report) {
            if let Err(reset) = self.pipeline.abort() {
                warn!(target: DRIVER, error = %reset, "resetting renderer failed");
            }
            return Err(err);
        }

        info!(target: DRIVER, "render unbind");
        self.pipeline.unbind()?;
        Ok(report)
    }

    fn draw_cycles(
        &mut self,
        width: u16,
        height: u16,
        delay: Duration,
        report: &mut QuadReport,
    ) -> RenderTestResult<()> {
        for cycle in 0..=self.config.cycles {
            debug!(target: DRIVER, cycle, "render begin");
            self.pipeline.begin(width, height)?;
            self.pipeline.clear(self.config.clear)?;

            let projection = self.pipeline.projection();
            let mut quad = math::quad(self.config.quad_width, self.config.quad_height);
            for i in 0..=self.config.quads {
                let color = self.config.color(usize::from(i));
                debug!(target: DRIVER, quad = i, ?color, "render quadrangle");
                self.pipeline.quadrangle(color, &(projection * quad))?;
                quad = math::translate(quad, self.config.offset_x, self.config.offset_y);
                report.quads += 1;
            }

            debug!(target: DRIVER, cycle, "render end");
            self.pipeline.end(true)?;

            match self.connector.render() {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => {
                    warn!(target: DRIVER, cycle, error = %err, "present failed");
                    report.missed_presents += 1;
                }
                Err(err) => return Err(err),
            }
            report.frames += 1;

            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/driver/quads.rs"]
mod tests;
