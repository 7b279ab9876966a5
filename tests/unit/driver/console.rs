use super::*;
use std::sync::Arc;

use crate::config::RenderTestConfig;
use crate::foundation::core::Resolution;
use crate::render::contract::BackendSettings;
use crate::render::headless::HeadlessBackend;
use crate::schedule::worker::ManualExecutor;

fn driver(backend: &HeadlessBackend, exec: &Arc<ManualExecutor>) -> RenderLoopDriver {
    let cfg = RenderTestConfig {
        resolution: Resolution::R480p,
        ..RenderTestConfig::default()
    };
    RenderLoopDriver::new(backend, exec.clone(), &cfg).unwrap()
}

#[test]
fn keys_are_case_insensitive() {
    assert_eq!(Command::from_key(b's'), Some(Command::Toggle));
    assert_eq!(Command::from_key(b'S'), Some(Command::Toggle));
    assert_eq!(Command::from_key(b'q'), Some(Command::Quit));
    assert_eq!(Command::from_key(b'\n'), None);
}

#[test]
fn s_toggles_the_driver() {
    let backend = HeadlessBackend::new(BackendSettings::default());
    let exec = Arc::new(ManualExecutor::new(1));
    let d = driver(&backend, &exec);

    run_console(&d, &b"s\n"[..]).unwrap();
    assert!(d.running());

    run_console(&d, &b"S"[..]).unwrap();
    assert!(!d.running());
    assert_eq!(exec.pending(), 0);
}

#[test]
fn quit_stops_reading() {
    let backend = HeadlessBackend::new(BackendSettings::default());
    let exec = Arc::new(ManualExecutor::new(1));
    let d = driver(&backend, &exec);

    run_console(&d, &b"xQs"[..]).unwrap();
    assert!(!d.running());
}

#[test]
fn end_of_input_returns() {
    let backend = HeadlessBackend::new(BackendSettings::default());
    let exec = Arc::new(ManualExecutor::new(1));
    let d = driver(&backend, &exec);

    run_console(&d, &b""[..]).unwrap();
    assert!(!d.running());
}
