//! Memory-backed connectors and a CPU renderer.
//!
//! Lets both harness binaries and the test-suite run the full render protocol without a DRM
//! device. Pixels are straight-alpha RGBA8, tightly packed, row-major, whatever the fourcc says.

use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Context as _;
use tracing::{debug, info};

use crate::{
    foundation::core::{Color, Matrix, PixelBox, Point, Rect, Resolution},
    foundation::error::{RenderTestError, RenderTestResult},
    foundation::math,
    foundation::sync::lock,
    format::pixel::{DRM_FORMAT_ABGR8888, DRM_FORMAT_ARGB8888, DRM_FORMAT_MOD_LINEAR, PixelFormat},
    render::contract::{Backend, BackendSettings, Buffer, DeviceId, Renderer, TextureId},
    trace::{BACKEND, BUFFER},
};

fn byte_len(width: u16, height: u16) -> usize {
    usize::from(width) * usize::from(height) * 4
}

fn has_alpha(format: &PixelFormat) -> bool {
    matches!(format.fourcc(), DRM_FORMAT_ARGB8888 | DRM_FORMAT_ABGR8888)
}

/// Offscreen buffer held in process memory.
pub struct MemoryBuffer {
    device: DeviceId,
    width: u16,
    height: u16,
    format: PixelFormat,
    pixels: Mutex<Vec<u8>>,
}

impl MemoryBuffer {
    pub fn new(device: DeviceId, width: u16, height: u16, format: PixelFormat) -> Self {
        Self {
            device,
            width,
            height,
            format,
            pixels: Mutex::new(vec![0; byte_len(width, height)]),
        }
    }
}

impl Buffer for MemoryBuffer {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn identifier(&self) -> DeviceId {
        self.device
    }

    fn format(&self) -> &PixelFormat {
        &self.format
    }

    fn render(&self) -> RenderTestResult<()> {
        Ok(())
    }

    fn read_pixels(&self) -> RenderTestResult<Vec<u8>> {
        Ok(lock(&self.pixels).clone())
    }

    fn write_pixels(&self, rgba8: &[u8]) -> RenderTestResult<()> {
        let mut pixels = lock(&self.pixels);
        if rgba8.len() != pixels.len() {
            return Err(RenderTestError::backend(format!(
                "pixel upload is {} bytes, buffer holds {}",
                rgba8.len(),
                pixels.len()
            )));
        }
        pixels.copy_from_slice(rgba8);
        Ok(())
    }
}

/// Display connector without a display: counts presents and can dump them as PNG files.
pub struct HeadlessConnector {
    name: String,
    surface: MemoryBuffer,
    presented: AtomicU64,
    dump_dir: Option<PathBuf>,
}

impl HeadlessConnector {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of successful presents so far.
    pub fn presented(&self) -> u64 {
        self.presented.load(Ordering::Acquire)
    }

    fn dump(&self, dir: &std::path::Path, frame: u64) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create dump dir '{}'", dir.display()))?;
        let path = dir.join(format!("{}-{frame:05}.png", self.name));
        let data = lock(&self.surface.pixels).clone();
        image::save_buffer_with_format(
            &path,
            &data,
            u32::from(self.surface.width),
            u32::from(self.surface.height),
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

impl Buffer for HeadlessConnector {
    fn width(&self) -> u16 {
        self.surface.width
    }

    fn height(&self) -> u16 {
        self.surface.height
    }

    fn identifier(&self) -> DeviceId {
        self.surface.device
    }

    fn format(&self) -> &PixelFormat {
        &self.surface.format
    }

    fn render(&self) -> RenderTestResult<()> {
        let frame = self.presented.load(Ordering::Acquire) + 1;
        if let Some(dir) = &self.dump_dir {
            self.dump(dir, frame)
                .map_err(|e| RenderTestError::presentation(format!("{e:#}")))?;
        }
        self.presented.store(frame, Ordering::Release);
        debug!(target: BUFFER, connector = %self.name, frame, "presented");
        Ok(())
    }

    fn read_pixels(&self) -> RenderTestResult<Vec<u8>> {
        self.surface.read_pixels()
    }

    fn write_pixels(&self, rgba8: &[u8]) -> RenderTestResult<()> {
        self.surface.write_pixels(rgba8)
    }
}

/// Parse `card<N>-<output>` into the device number.
fn parse_connector_name(name: &str) -> Option<DeviceId> {
    let rest = name.strip_prefix("card")?;
    let (card, output) = rest.split_once('-')?;
    if output.is_empty() || card.is_empty() {
        return None;
    }
    card.parse().ok().map(DeviceId)
}

/// Backend that resolves `card<N>-<output>` names to memory-backed connectors.
pub struct HeadlessBackend {
    settings: BackendSettings,
    devices: Mutex<HashSet<DeviceId>>,
}

impl HeadlessBackend {
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            settings,
            devices: Mutex::new(HashSet::new()),
        }
    }

    /// Like [`Backend::connector`], keeping the concrete type so presents can be inspected.
    pub fn open_connector(
        &self,
        name: &str,
        resolution: Resolution,
        format: &PixelFormat,
    ) -> RenderTestResult<Arc<HeadlessConnector>> {
        let device = parse_connector_name(name).ok_or_else(|| {
            RenderTestError::connector_unavailable(format!("'{name}' is not a card<N>-<output> name"))
        })?;
        if !format.accepts(DRM_FORMAT_MOD_LINEAR) {
            return Err(RenderTestError::connector_unavailable(format!(
                "'{name}' only scans out linear buffers"
            )));
        }

        let (w, h) = resolution.dimensions();
        let (width, height) = (
            u16::try_from(w).map_err(|_| RenderTestError::validation("width overflow"))?,
            u16::try_from(h).map_err(|_| RenderTestError::validation("height overflow"))?,
        );

        lock(&self.devices).insert(device);
        info!(
            target: BACKEND,
            connector = name,
            device = device.0,
            width,
            height,
            "opened headless connector"
        );

        Ok(Arc::new(HeadlessConnector {
            name: name.to_owned(),
            surface: MemoryBuffer::new(device, width, height, format.clone()),
            presented: AtomicU64::new(0),
            dump_dir: self.settings.dump_dir.clone(),
        }))
    }
}

impl Backend for HeadlessBackend {
    fn connector(
        &self,
        name: &str,
        resolution: Resolution,
        format: &PixelFormat,
        _force_modeset: bool,
    ) -> RenderTestResult<Arc<dyn Buffer>> {
        let connector: Arc<dyn Buffer> = self.open_connector(name, resolution, format)?;
        Ok(connector)
    }

    fn renderer(&self, device: DeviceId) -> RenderTestResult<Box<dyn Renderer>> {
        if !lock(&self.devices).contains(&device) {
            return Err(RenderTestError::renderer_unavailable(format!(
                "device {} has no open connector",
                device.0
            )));
        }
        Ok(Box::new(CpuRenderer::new(device)))
    }

    fn create_buffer(
        &self,
        device: DeviceId,
        width: u16,
        height: u16,
        format: &PixelFormat,
    ) -> RenderTestResult<Arc<dyn Buffer>> {
        if width == 0 || height == 0 {
            return Err(RenderTestError::validation("buffer size must be non-zero"));
        }
        Ok(Arc::new(MemoryBuffer::new(
            device,
            width,
            height,
            format.clone(),
        )))
    }
}

struct Canvas {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

struct TextureData {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl TextureData {
    fn sample(&self, u: f64, v: f64) -> [u8; 4] {
        let x = ((u * f64::from(self.width)) as usize).min(usize::from(self.width) - 1);
        let y = ((v * f64::from(self.height)) as usize).min(usize::from(self.height) - 1);
        let i = (y * usize::from(self.width) + x) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

/// Straight-alpha source-over of `src` (with extra `opacity`) onto `dst`.
fn blend(dst: &mut [u8], src: [u8; 4], opacity: f32) {
    let a = (f32::from(src[3]) / 255.0) * opacity.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let s = f32::from(src[c]);
        let d = f32::from(dst[c]);
        dst[c] = (s * a + d * (1.0 - a)).round() as u8;
    }
    let da = f32::from(dst[3]) / 255.0;
    dst[3] = ((a + da * (1.0 - a)) * 255.0).round() as u8;
}

/// Software renderer drawing into the bound buffer through an in-memory canvas.
pub struct CpuRenderer {
    device: DeviceId,
    target: Option<Arc<dyn Buffer>>,
    canvas: Option<Canvas>,
    projection: Matrix,
    textures: HashMap<TextureId, TextureData>,
    next_texture: u64,
}

impl CpuRenderer {
    pub fn new(device: DeviceId) -> Self {
        Self {
            device,
            target: None,
            canvas: None,
            projection: Matrix::IDENTITY,
            textures: HashMap::new(),
            next_texture: 1,
        }
    }

    fn canvas(&mut self, op: &'static str) -> RenderTestResult<&mut Canvas> {
        self.canvas
            .as_mut()
            .ok_or_else(|| RenderTestError::invalid_pipeline(op, "no frame"))
    }

    /// Run `shade` for every canvas pixel whose center falls inside the unit square mapped
    /// through `transform` (clip space). `shade` gets the unit-square coordinates.
    fn rasterize(
        &mut self,
        op: &'static str,
        transform: &Matrix,
        mut shade: impl FnMut(f64, f64, &mut [u8]),
    ) -> RenderTestResult<()> {
        let to_pixels = self.projection.inverse() * *transform;
        if to_pixels.determinant().abs() < f64::EPSILON {
            return Ok(());
        }
        let from_pixels = to_pixels.inverse();

        let canvas = self.canvas(op)?;
        let bounds = Rect::new(0.0, 0.0, f64::from(canvas.width), f64::from(canvas.height));
        let area = to_pixels
            .transform_rect_bbox(Rect::new(0.0, 0.0, 1.0, 1.0))
            .intersect(bounds);
        if area.is_zero_area() {
            return Ok(());
        }

        let stride = usize::from(canvas.width) * 4;
        for y in (area.y0.floor() as usize)..(area.y1.ceil() as usize) {
            for x in (area.x0.floor() as usize)..(area.x1.ceil() as usize) {
                let p = from_pixels * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y) {
                    let i = y * stride + x * 4;
                    shade(p.x, p.y, &mut canvas.data[i..i + 4]);
                }
            }
        }
        Ok(())
    }
}

impl Renderer for CpuRenderer {
    fn bind(&mut self, target: Arc<dyn Buffer>) -> RenderTestResult<()> {
        if target.identifier() != self.device {
            return Err(RenderTestError::backend(format!(
                "buffer lives on device {}, renderer on {}",
                target.identifier().0,
                self.device.0
            )));
        }
        self.target = Some(target);
        Ok(())
    }

    fn unbind(&mut self) -> RenderTestResult<()> {
        self.canvas = None;
        self.target = None;
        Ok(())
    }

    fn begin(&mut self, width: u16, height: u16) -> RenderTestResult<()> {
        if self.target.is_none() {
            return Err(RenderTestError::invalid_pipeline("begin", "unbound"));
        }
        self.projection = math::projection(u32::from(width), u32::from(height));
        self.canvas = Some(Canvas {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        });
        Ok(())
    }

    fn clear(&mut self, color: Color) -> RenderTestResult<()> {
        let rgba = color.to_rgba8();
        for px in self.canvas("clear")?.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        Ok(())
    }

    fn quadrangle(&mut self, color: Color, transform: &Matrix) -> RenderTestResult<()> {
        let rgba = color.to_rgba8();
        self.rasterize("quadrangle", transform, |_, _, px| blend(px, rgba, 1.0))
    }

    fn texture(&mut self, buffer: Arc<dyn Buffer>) -> RenderTestResult<TextureId> {
        let mut data = buffer.read_pixels()?;
        if !has_alpha(buffer.format()) {
            for px in data.chunks_exact_mut(4) {
                px[3] = 255;
            }
        }
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(
            id,
            TextureData {
                width: buffer.width(),
                height: buffer.height(),
                data,
            },
        );
        Ok(id)
    }

    fn release_texture(&mut self, texture: TextureId) -> RenderTestResult<()> {
        self.textures
            .remove(&texture)
            .map(|_| ())
            .ok_or_else(|| RenderTestError::backend(format!("unknown texture {}", texture.0)))
    }

    fn render(
        &mut self,
        texture: TextureId,
        region: PixelBox,
        transform: &Matrix,
        opacity: f32,
    ) -> RenderTestResult<()> {
        // Pull the texture out so the rasterizer can borrow the canvas mutably.
        let tex = self
            .textures
            .remove(&texture)
            .ok_or_else(|| RenderTestError::backend(format!("unknown texture {}", texture.0)))?;

        let drawn = if region.width == 0 || region.height == 0 || tex.width == 0 || tex.height == 0 {
            Ok(())
        } else {
            self.rasterize("render", transform, |u, v, px| {
                blend(px, tex.sample(u, v), opacity)
            })
        };

        self.textures.insert(texture, tex);
        drawn
    }

    fn projection(&self) -> Matrix {
        self.projection
    }

    fn end(&mut self, present: bool) -> RenderTestResult<()> {
        let canvas = self
            .canvas
            .take()
            .ok_or_else(|| RenderTestError::invalid_pipeline("end", "no frame"))?;
        if !present {
            return Ok(());
        }
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| RenderTestError::invalid_pipeline("end", "unbound"))?;
        if (canvas.width, canvas.height) != (target.width(), target.height()) {
            return Err(RenderTestError::backend(format!(
                "frame is {}x{}, target is {}x{}",
                canvas.width,
                canvas.height,
                target.width(),
                target.height()
            )));
        }
        target.write_pixels(&canvas.data)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/headless.rs"]
mod tests;
