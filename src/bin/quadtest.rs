use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing::{info, level_filters::LevelFilter};

use rendertest::trace::{ALL_TARGETS, DRIVER};

/// Draw a fixed number of frames of colored quadrangles, pausing after each present.
#[derive(Parser, Debug)]
#[command(name = "quadtest", version)]
struct Cli {
    /// Connector to drive, e.g. `card0-HDMI-A-2`.
    connector: Option<String>,

    /// JSON config file; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Last cycle index; `cycles + 1` frames are drawn.
    #[arg(long)]
    cycles: Option<u8>,

    /// Last quadrangle index per frame.
    #[arg(long)]
    quads: Option<u8>,

    /// Pause after each present, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// How draw indices pick palette colors.
    #[arg(long, value_enum)]
    palette_indexing: Option<rendertest::PaletteIndexing>,

    /// Requested connector resolution.
    #[arg(long, value_enum)]
    resolution: Option<rendertest::Resolution>,

    /// Write every presented frame to this directory as PNG.
    #[arg(long)]
    dump_dir: Option<PathBuf>,

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

fn load_config(cli: &Cli) -> anyhow::Result<rendertest::QuadTestConfig> {
    let mut cfg: rendertest::QuadTestConfig = match &cli.config {
        Some(path) => rendertest::load_json(path)?,
        None => rendertest::QuadTestConfig::default(),
    };
    if let Some(connector) = &cli.connector {
        cfg.connector.clone_from(connector);
    }
    if let Some(cycles) = cli.cycles {
        cfg.cycles = cycles;
    }
    if let Some(quads) = cli.quads {
        cfg.quads = quads;
    }
    if let Some(delay_ms) = cli.delay_ms {
        cfg.frame_delay_ms = delay_ms;
    }
    if let Some(indexing) = cli.palette_indexing {
        cfg.palette_indexing = indexing;
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
    info!(target: DRIVER, "quadtest - version {}", env!("CARGO_PKG_VERSION"));

    let cfg = load_config(&cli)?;

    let kind = match cli.backend {
        BackendChoice::Headless => rendertest::BackendKind::Headless,
    };
    let settings = rendertest::BackendSettings {
        dump_dir: cli.dump_dir.clone(),
    };
    let backend = rendertest::create_backend(kind, &settings)?;

    let connector = cfg.connector.clone();
    let mut test = rendertest::QuadSmokeTest::new(backend.as_ref(), cfg)
        .with_context(|| format!("set up quad test on '{connector}'"))?;
    let report = test.run().context("run quad test")?;

    info!(
        target: DRIVER,
        frames = report.frames,
        quads = report.quads,
        missed_presents = report.missed_presents,
        "exiting quadtest"
    );

    drop(test);
    session.close();
    Ok(())
}
