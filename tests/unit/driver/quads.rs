use super::*;
use crate::config::PaletteIndexing;
use crate::foundation::core::Resolution;
use crate::render::contract::BackendSettings;
use crate::render::headless::HeadlessBackend;

fn config(indexing: PaletteIndexing) -> QuadTestConfig {
    QuadTestConfig {
        connector: "card0-HDMI-A-2".to_owned(),
        resolution: Resolution::R480p,
        palette_indexing: indexing,
        frame_delay_ms: 0,
        ..QuadTestConfig::default()
    }
}

#[test]
fn runs_inclusive_cycle_and_quad_counts() {
    let backend = HeadlessBackend::new(BackendSettings::default());
    let mut test = QuadSmokeTest::new(&backend, config(PaletteIndexing::Wrapping)).unwrap();
    let report = test.run().unwrap();
    assert_eq!(report.frames, 11);
    assert_eq!(report.quads, 121);
    assert_eq!(report.missed_presents, 0);
}

#[test]
fn quads_step_diagonally_with_palette_colors() {
    let backend = HeadlessBackend::new(BackendSettings::default());
    let format = PixelFormat::linear(DRM_FORMAT_ARGB8888);

    for (indexing, third) in [
        (PaletteIndexing::Wrapping, [0, 0, 255, 255]),
        (PaletteIndexing::Legacy, [255, 0, 0, 255]),
    ] {
        let mut test = QuadSmokeTest::new(&backend, config(indexing)).unwrap();
        test.run().unwrap();

        let data = test.connector.read_pixels().unwrap();
        let width = usize::from(test.connector.width());
        let px = |x: usize, y: usize| {
            let i = (y * width + x) * 4;
            [data[i], data[i + 1], data[i + 2], data[i + 3]]
        };

        assert_eq!(px(10, 10), [255, 0, 0, 255]);
        assert_eq!(px(35, 125), [0, 255, 0, 255]);
        assert_eq!(px(65, 125), third);
        assert_eq!(px(700, 10), [255, 255, 255, 255]);
        assert_eq!(test.connector.format(), &format);
    }
}

#[test]
fn empty_palette_is_rejected() {
    let backend = HeadlessBackend::new(BackendSettings::default());
    let mut cfg = config(PaletteIndexing::Wrapping);
    cfg.palette.clear();
    assert!(QuadSmokeTest::new(&backend, cfg).is_err());
}
