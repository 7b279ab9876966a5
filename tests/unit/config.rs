use super::*;

fn temp_json(name: &str, body: &str) -> std::path::PathBuf {
    let dir = std::path::PathBuf::from("target").join("config_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn defaults_match_reference_constants() {
    let r = RenderTestConfig::default();
    assert_eq!(r.connector, "card1-HDMI-A-1");
    assert_eq!(r.resolution, Resolution::R720p);
    assert_eq!(r.fps.get(), 1);
    assert_eq!(r.background, Color::DARK_GRAY);
    assert_eq!((r.probe_width, r.probe_height), (10, 10));
    assert_eq!((r.box_width, r.box_height), (500, 500));
    assert!(r.validate().is_ok());

    let q = QuadTestConfig::default();
    assert_eq!(q.connector, "card0-HDMI-A-2");
    assert_eq!(q.resolution, Resolution::R1080p);
    assert_eq!(q.palette.len(), 3);
    assert_eq!((q.cycles, q.quads), (10, 10));
    assert_eq!(q.palette_indexing, PaletteIndexing::Wrapping);
    assert!(q.validate().is_ok());
}

#[test]
fn missing_fields_take_defaults() {
    let path = temp_json("partial.json", r#"{ "fps": 30, "resolution": "480p" }"#);
    let cfg: RenderTestConfig = load_json(&path).unwrap();
    assert_eq!(cfg.fps.get(), 30);
    assert_eq!(cfg.resolution, Resolution::R480p);
    assert_eq!(cfg.connector, "card1-HDMI-A-1");
}

#[test]
fn zero_fps_is_rejected_at_parse_time() {
    let path = temp_json("zero_fps.json", r#"{ "fps": 0 }"#);
    let err = load_json::<RenderTestConfig>(&path).unwrap_err();
    assert!(format!("{err:#}").contains("fps must be > 0"));
}

#[test]
fn unknown_fields_are_rejected() {
    let path = temp_json("unknown.json", r#"{ "frames_per_second": 30 }"#);
    assert!(load_json::<RenderTestConfig>(&path).is_err());
}

#[test]
fn missing_file_names_the_path() {
    let err = load_json::<QuadTestConfig>(std::path::Path::new("target/does/not/exist.json"))
        .unwrap_err();
    assert!(err.to_string().contains("exist.json"));
}

#[test]
fn validate_rejects_degenerate_values() {
    let mut r = RenderTestConfig::default();
    r.box_width = 0;
    assert!(matches!(r.validate(), Err(RenderTestError::Validation(_))));

    let mut q = QuadTestConfig::default();
    q.palette.clear();
    assert!(q.validate().is_err());

    let mut q = QuadTestConfig::default();
    q.quad_height = 0.0;
    assert!(q.validate().is_err());

    let mut q = QuadTestConfig::default();
    q.connector = "  ".to_owned();
    assert!(q.validate().is_err());
}

#[test]
fn palette_indexing_modes() {
    let wrap: Vec<usize> = (0..=10).map(|i| PaletteIndexing::Wrapping.index(i, 3)).collect();
    assert_eq!(wrap, vec![0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1]);

    let legacy: Vec<usize> = (0..=4).map(|i| PaletteIndexing::Legacy.index(i, 3)).collect();
    assert_eq!(legacy, vec![0, 1, 0, 1, 0]);

    assert_eq!(PaletteIndexing::Legacy.index(7, 1), 0);
    assert_eq!(PaletteIndexing::Wrapping.index(7, 1), 0);
}

#[test]
fn color_follows_indexing() {
    let mut q = QuadTestConfig::default();
    assert_eq!(q.color(2), Color::BLUE);
    q.palette_indexing = PaletteIndexing::Legacy;
    assert_eq!(q.color(2), Color::RED);
}

#[test]
fn indexing_serializes_snake_case() {
    let s = serde_json::to_string(&PaletteIndexing::Legacy).unwrap();
    assert_eq!(s, "\"legacy\"");
}
