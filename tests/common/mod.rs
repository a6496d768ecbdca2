//! Shared helpers for integration tests.

#![allow(dead_code)]

use lantern::{EngineSettings, HeadlessContext, Scene, UploadGate};

/// Routes `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scene with the default stage/camera/viewport/pipeline and a headless gate.
pub fn headless_scene() -> Scene {
    init_logging();
    let gate = UploadGate::new(HeadlessContext::new());
    Scene::new(EngineSettings::default(), gate).expect("scene construction")
}
