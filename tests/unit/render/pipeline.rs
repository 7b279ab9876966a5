use super::*;
use crate::format::pixel::{DRM_FORMAT_XRGB8888, PixelFormat};
use crate::render::contract::DeviceId;

struct MockBuffer {
    format: PixelFormat,
}

impl Buffer for MockBuffer {
    fn width(&self) -> u16 {
        8
    }

    fn height(&self) -> u16 {
        4
    }

    fn identifier(&self) -> DeviceId {
        DeviceId(0)
    }

    fn format(&self) -> &PixelFormat {
        &self.format
    }

    fn render(&self) -> RenderTestResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct MockRenderer {
    calls: Vec<&'static str>,
    fail_begin: bool,
}

impl Renderer for MockRenderer {
    fn bind(&mut self, _target: Arc<dyn Buffer>) -> RenderTestResult<()> {
        self.calls.push("bind");
        Ok(())
    }

    fn unbind(&mut self) -> RenderTestResult<()> {
        self.calls.push("unbind");
        Ok(())
    }

    fn begin(&mut self, _width: u16, _height: u16) -> RenderTestResult<()> {
        self.calls.push("begin");
        if self.fail_begin {
            return Err(RenderTestError::backend("no context"));
        }
        Ok(())
    }

    fn clear(&mut self, _color: Color) -> RenderTestResult<()> {
        self.calls.push("clear");
        Ok(())
    }

    fn quadrangle(&mut self, _color: Color, _transform: &Matrix) -> RenderTestResult<()> {
        self.calls.push("quadrangle");
        Ok(())
    }

    fn texture(&mut self, _buffer: Arc<dyn Buffer>) -> RenderTestResult<TextureId> {
        self.calls.push("texture");
        Ok(TextureId(1))
    }

    fn release_texture(&mut self, _texture: TextureId) -> RenderTestResult<()> {
        self.calls.push("release_texture");
        Ok(())
    }

    fn render(
        &mut self,
        _texture: TextureId,
        _region: PixelBox,
        _transform: &Matrix,
        _opacity: f32,
    ) -> RenderTestResult<()> {
        self.calls.push("render");
        Ok(())
    }

    fn projection(&self) -> Matrix {
        Matrix::IDENTITY
    }

    fn end(&mut self, _present: bool) -> RenderTestResult<()> {
        self.calls.push("end");
        Ok(())
    }
}

fn buffer() -> Arc<dyn Buffer> {
    Arc::new(MockBuffer {
        format: PixelFormat::linear(DRM_FORMAT_XRGB8888),
    })
}

fn is_invalid(err: RenderTestError, want_op: &str, want_state: &str) -> bool {
    matches!(err, RenderTestError::InvalidPipelineState { op, state } if op == want_op && state == want_state)
}

#[test]
fn full_bracket_walks_every_state() {
    let mut p = Pipeline::new(Box::new(MockRenderer::default()));
    assert_eq!(p.state(), PipelineState::Unbound);

    p.bind(buffer()).unwrap();
    assert_eq!(p.state(), PipelineState::Bound);
    p.begin(8, 4).unwrap();
    assert_eq!(p.state(), PipelineState::InFrame);
    p.clear(Color::WHITE).unwrap();
    p.quadrangle(Color::RED, &Matrix::IDENTITY).unwrap();
    p.render(
        TextureId(1),
        PixelBox {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        },
        &Matrix::IDENTITY,
        1.0,
    )
    .unwrap();
    p.end(true).unwrap();
    assert_eq!(p.state(), PipelineState::Bound);
    p.unbind().unwrap();
    assert_eq!(p.state(), PipelineState::Unbound);
}

#[test]
fn draw_calls_outside_a_frame_are_rejected() {
    let mut p = Pipeline::new(Box::new(MockRenderer::default()));

    assert!(is_invalid(p.clear(Color::WHITE).unwrap_err(), "clear", "unbound"));
    assert!(is_invalid(p.begin(1, 1).unwrap_err(), "begin", "unbound"));
    assert!(is_invalid(p.end(true).unwrap_err(), "end", "unbound"));
    assert!(is_invalid(p.unbind().unwrap_err(), "unbind", "unbound"));

    p.bind(buffer()).unwrap();
    assert!(is_invalid(
        p.quadrangle(Color::RED, &Matrix::IDENTITY).unwrap_err(),
        "quadrangle",
        "bound"
    ));
    assert!(is_invalid(p.bind(buffer()).unwrap_err(), "bind", "bound"));
}

#[test]
fn unbind_and_texture_ops_are_rejected_mid_frame() {
    let mut p = Pipeline::new(Box::new(MockRenderer::default()));
    p.bind(buffer()).unwrap();
    p.begin(8, 4).unwrap();

    assert!(is_invalid(p.unbind().unwrap_err(), "unbind", "in frame"));
    assert!(is_invalid(p.texture(buffer()).unwrap_err(), "texture", "in frame"));
    assert!(is_invalid(
        p.release_texture(TextureId(1)).unwrap_err(),
        "release_texture",
        "in frame"
    ));
}

#[test]
fn failed_call_does_not_advance_state() {
    let mut p = Pipeline::new(Box::new(MockRenderer {
        fail_begin: true,
        ..MockRenderer::default()
    }));
    p.bind(buffer()).unwrap();
    assert!(p.begin(8, 4).is_err());
    assert_eq!(p.state(), PipelineState::Bound);
    p.unbind().unwrap();
}

#[test]
fn textures_can_be_managed_while_unbound() {
    let mut p = Pipeline::new(Box::new(MockRenderer::default()));
    let id = p.texture(buffer()).unwrap();
    p.release_texture(id).unwrap();
}

#[test]
fn abort_closes_an_open_frame_and_unbinds() {
    let mut p = Pipeline::new(Box::new(MockRenderer::default()));
    p.bind(buffer()).unwrap();
    p.begin(8, 4).unwrap();

    p.abort().unwrap();
    assert_eq!(p.state(), PipelineState::Unbound);
    p.release_texture(TextureId(1)).unwrap();
    p.bind(buffer()).unwrap();
}

#[test]
fn abort_after_failed_begin_unbinds() {
    let mut p = Pipeline::new(Box::new(MockRenderer {
        fail_begin: true,
        ..MockRenderer::default()
    }));
    p.bind(buffer()).unwrap();
    assert!(p.begin(8, 4).is_err());

    p.abort().unwrap();
    assert_eq!(p.state(), PipelineState::Unbound);
}

#[test]
fn abort_is_a_no_op_when_unbound() {
    let mut p = Pipeline::new(Box::new(MockRenderer::default()));
    p.abort().unwrap();
    assert_eq!(p.state(), PipelineState::Unbound);
}
