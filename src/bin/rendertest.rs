use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing::{info, level_filters::LevelFilter, warn};

use rendertest::trace::{ALL_TARGETS, DRIVER};

/// Draw a rotating probe texture on a connector at a fixed frame rate.
///
/// Press `S` (then Enter) to start or stop rendering, `Q` to quit.
#[derive(Parser, Debug)]
#[command(name = "rendertest", version)]
struct Cli {
    /// Connector to drive, e.g. `card1-HDMI-A-1`.
    connector: Option<String>,

    /// JSON config file; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target frame rate.
    #[arg(long)]
    fps: Option<u8>,

    /// Requested connector resolution.
    #[arg(long, value_enum)]
    resolution: Option<rendertest::Resolution>,

    /// Write every presented frame to this directory as PNG.
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Start rendering without waiting for `S`.
    #[arg(long)]
    autostart: bool,

    /// Only log warnings and errors.
    #[arg(long)]
    quiet: bool,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Headless)]
    backend: BackendChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Headless,
}

fn load_config(cli: &Cli) -> anyhow::Result<rendertest::RenderTestConfig> {
    let mut cfg: rendertest::RenderTestConfig = match &cli.config {
        Some(path) => rendertest::load_json(path)?,
        None => rendertest::RenderTestConfig::default(),
    };
    if let Some(connector) = &cli.connector {
        cfg.connector.clone_from(connector);
    }
    if let Some(fps) = cli.fps {
        cfg.fps = rendertest::Fps::new(fps)?;
    }
    if let Some(resolution) = cli.resolution {
        cfg.resolution = resolution;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    let session = rendertest::TraceSession::open(&ALL_TARGETS, level);
    info!(target: DRIVER, "rendertest - version {}", env!("CARGO_PKG_VERSION"));

    let cfg = load_config(&cli)?;

    let kind = match cli.backend {
        BackendChoice::Headless => rendertest::BackendKind::Headless,
    };
    let settings = rendertest::BackendSettings {
        dump_dir: cli.dump_dir.clone(),
    };
    let backend = rendertest::create_backend(kind, &settings)?;

    let worker = Arc::new(rendertest::SimpleWorker::spawn(Arc::new(
        rendertest::MonotonicClock::new(),
    ))?);
    let driver = rendertest::RenderLoopDriver::new(backend.as_ref(), worker.clone(), &cfg)
        .with_context(|| format!("set up render test on '{}'", cfg.connector))?;

    if cli.autostart {
        driver.start();
    }

    rendertest::run_console(&driver, std::io::stdin().lock()).context("read console input")?;

    if let Some(err) = driver.last_error() {
        warn!(target: DRIVER, error = %err, "rendering stopped on error");
    }
    info!(target: DRIVER, frames = driver.frames(), "exiting rendertest");

    drop(driver);
    drop(worker);
    session.close();
    Ok(())
}
