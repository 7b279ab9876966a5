#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod format;
pub mod foundation;
pub mod render;
pub mod schedule;
pub mod trace;

pub use config::{PaletteIndexing, QuadTestConfig, RenderTestConfig, load_json};
pub use driver::console::{Command, run_console};
pub use driver::quads::{QuadReport, QuadSmokeTest};
pub use driver::render_loop::RenderLoopDriver;
pub use format::pixel::{
    DRM_FORMAT_ABGR8888, DRM_FORMAT_ARGB8888, DRM_FORMAT_MOD_INVALID, DRM_FORMAT_MOD_LINEAR,
    DRM_FORMAT_XRGB8888, PixelFormat, Vendor, describe_format, fourcc_code, mod_code, mod_vendor,
    vendor_name,
};
pub use foundation::core::{
    Color, Fps, MILLISECONDS_PER_SECOND, Matrix, PixelBox, Resolution, TICKS_PER_MILLISECOND,
    TICKS_PER_SECOND,
};
pub use foundation::error::{RenderTestError, RenderTestResult};
pub use foundation::math::Rotation;
pub use render::contract::{
    Backend, BackendKind, BackendSettings, Buffer, DeviceId, Renderer, TextureId, create_backend,
};
pub use render::headless::{CpuRenderer, HeadlessBackend, HeadlessConnector, MemoryBuffer};
pub use render::pipeline::{Pipeline, PipelineState};
pub use render::texture::{Texture, fill_buffer};
pub use schedule::clock::{Clock, MonotonicClock};
pub use schedule::scheduler::{FramePass, FrameScheduler, FrameTiming};
pub use schedule::worker::{Activity, ActivityId, Executor, ManualExecutor, SimpleWorker};
pub use trace::TraceSession;
