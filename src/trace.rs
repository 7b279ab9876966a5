//! Explicit logging sink.
//!
//! Nothing is installed globally. A [`TraceSession`] becomes the default `tracing` dispatcher
//! of the thread that opens it, and of any [`crate::SimpleWorker`] spawned from that thread
//! while it is open. Dropping the session closes the sink.

use tracing::{dispatcher::DefaultGuard, level_filters::LevelFilter};
use tracing_subscriber::{filter::Targets, fmt::MakeWriter, prelude::*};

pub const DRIVER: &str = "rendertest::driver";
pub const BUFFER: &str = "rendertest::buffer";
pub const BACKEND: &str = "rendertest::backend";
pub const RENDERER: &str = "rendertest::renderer";
pub const SCHEDULE: &str = "rendertest::schedule";

/// Every target the harness logs under.
pub const ALL_TARGETS: [&str; 5] = [DRIVER, BUFFER, BACKEND, RENDERER, SCHEDULE];

pub struct TraceSession {
    _guard: DefaultGuard,
}

impl TraceSession {
    /// Log `targets` at `level` and above to stderr.
    pub fn open(targets: &[&str], level: LevelFilter) -> Self {
        Self::open_with_writer(targets, level, std::io::stderr)
    }

    pub fn open_with_writer<W>(targets: &[&str], level: LevelFilter, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let filter = targets
            .iter()
            .fold(Targets::new(), |f, t| f.with_target(*t, level));
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .with_filter(filter),
        );

        Self {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    /// Flush and uninstall. Same as dropping.
    pub fn close(self) {}
}

#[cfg(test)]
#[path = "../tests/unit/trace.rs"]
mod tests;
