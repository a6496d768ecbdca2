//! Upload Gate Tests
//!
//! Tests for:
//! - Off-thread uploads blocking until the owner pumps
//! - Owner-thread inline execution
//! - Concurrent uploads of one texture running one after another
//! - Shutdown rejecting new and queued work
//! - Scene-level upload / delete releasing GPU objects

mod common;

use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use lantern::renderer::{HeadlessContext, UploadGate, UploadOptions};
use lantern::{EngineError, EngineSettings, Scene, Texture};

fn wait_for_pending(gate: &UploadGate, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while gate.pending() < count {
        assert!(Instant::now() < deadline, "worker never queued its upload");
        thread::sleep(Duration::from_millis(1));
    }
}

// ============================================================================
// Cross-thread
// ============================================================================

#[test]
fn worker_upload_waits_for_owner_pump() {
    common::init_logging();
    let context = HeadlessContext::new();
    let stats = context.stats();
    let gate = UploadGate::new(context);
    let texture = Texture::solid(4, 4, [10, 20, 30, 255]);

    let worker = {
        let gate = gate.clone();
        let texture = texture.clone();
        thread::spawn(move || texture.upload(&gate, UploadOptions::default()))
    };

    wait_for_pending(&gate, 1);
    assert!(!worker.is_finished());
    assert!(texture.gpu_handle().is_none());

    assert_eq!(gate.pump().unwrap(), 1);
    let handle = worker.join().unwrap().unwrap();

    assert_eq!(texture.gpu_handle(), Some(handle));
    assert!(texture.is_empty(), "free_after releases the CPU copy");
    assert_eq!(stats.uploads.load(Ordering::Relaxed), 1);
    assert_eq!(gate.pending(), 0);
}

#[test]
fn pump_timeout_drains_late_work() {
    let gate = UploadGate::new(HeadlessContext::new());

    let worker = {
        let gate = gate.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            gate.execute(|_| 7_u32)
        })
    };

    let mut executed = 0;
    let deadline = Instant::now() + Duration::from_secs(5);
    while executed == 0 && Instant::now() < deadline {
        executed += gate.pump_timeout(Duration::from_millis(50)).unwrap();
    }
    assert_eq!(executed, 1);
    assert_eq!(worker.join().unwrap().unwrap(), 7);
}

#[test]
fn owner_runs_tasks_inline() {
    let gate = UploadGate::new(HeadlessContext::new());
    assert!(gate.is_owner_thread());

    let texture = Texture::solid(1, 1, [0; 4]);
    let handle = texture.upload(&gate, UploadOptions::default()).unwrap();
    assert_eq!(texture.gpu_handle(), Some(handle));
    assert_eq!(gate.pending(), 0);
}

#[test]
fn non_owner_can_not_pump() {
    let gate = UploadGate::new(HeadlessContext::new());
    let remote = gate.clone();
    let result = thread::spawn(move || (remote.is_owner_thread(), remote.pump()))
        .join()
        .unwrap();

    assert!(!result.0);
    assert!(matches!(result.1, Err(EngineError::InvalidOperation(_))));
}

// ============================================================================
// Same texture, several uploaders
// ============================================================================

const KEEP_PIXELS: UploadOptions = UploadOptions {
    free_after: false,
    generate_mipmaps: true,
    repeat: true,
    linear: false,
};

#[test]
fn two_workers_uploading_one_texture_share_a_gpu_object() {
    let context = HeadlessContext::new();
    let stats = context.stats();
    let gate = UploadGate::new(context);
    let texture = Texture::solid(2, 2, [5; 4]);

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let gate = gate.clone();
            let texture = texture.clone();
            thread::spawn(move || texture.upload(&gate, KEEP_PIXELS))
        })
        .collect();

    wait_for_pending(&gate, 2);
    assert_eq!(gate.pump().unwrap(), 2);

    let handles: Vec<_> = workers
        .into_iter()
        .map(|w| w.join().unwrap().unwrap())
        .collect();
    assert_eq!(handles[0], handles[1]);
    assert_eq!(texture.gpu_handle(), Some(handles[0]));
    assert_eq!(stats.uploads.load(Ordering::Relaxed), 2);
}

#[test]
fn owner_upload_does_not_wait_for_queued_worker_upload() {
    let context = HeadlessContext::new();
    let stats = context.stats();
    let gate = UploadGate::new(context);
    let texture = Texture::solid(2, 2, [5; 4]);

    let worker = {
        let gate = gate.clone();
        let texture = texture.clone();
        thread::spawn(move || texture.upload(&gate, KEEP_PIXELS))
    };
    wait_for_pending(&gate, 1);

    // Runs inline while the worker is still parked on its reply
    let owner_handle = texture.upload(&gate, KEEP_PIXELS).unwrap();
    assert_eq!(stats.uploads.load(Ordering::Relaxed), 1);
    assert!(!worker.is_finished());

    assert_eq!(gate.pump().unwrap(), 1);
    let worker_handle = worker.join().unwrap().unwrap();
    assert_eq!(worker_handle, owner_handle);
    assert_eq!(stats.uploads.load(Ordering::Relaxed), 2);
}

#[test]
fn scene_upload_while_worker_upload_is_queued() {
    let context = HeadlessContext::new();
    let stats = context.stats();
    let mut scene = Scene::new(EngineSettings::default(), UploadGate::new(context)).unwrap();
    let id = scene
        .resources_mut()
        .new_texture_with(Texture::solid(1, 1, [9; 4]))
        .unwrap();

    let worker = {
        let gate = scene.gate().clone();
        let texture = scene.resources().texture(id).unwrap().clone();
        thread::spawn(move || texture.upload(&gate, KEEP_PIXELS))
    };
    wait_for_pending(scene.gate(), 1);

    let handle = scene.upload_texture(id, KEEP_PIXELS).unwrap();
    scene.gate().pump().unwrap();
    assert_eq!(worker.join().unwrap().unwrap(), handle);
    assert_eq!(stats.uploads.load(Ordering::Relaxed), 2);
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn shutdown_rejects_new_work() {
    let gate = UploadGate::new(HeadlessContext::new());
    gate.shutdown();
    assert!(gate.is_closed());

    let remote = gate.clone();
    let result = thread::spawn(move || remote.execute(|_| ())).join().unwrap();
    assert!(matches!(result, Err(EngineError::UploadQueueClosed)));
}

#[test]
fn shutdown_fails_queued_callers() {
    let gate = UploadGate::new(HeadlessContext::new());
    let worker = {
        let gate = gate.clone();
        thread::spawn(move || gate.execute(|_| ()))
    };

    wait_for_pending(&gate, 1);
    gate.shutdown();

    let result = worker.join().unwrap();
    assert!(matches!(result, Err(EngineError::UploadQueueClosed)));
    assert_eq!(gate.pending(), 0);
}

// ============================================================================
// Scene integration
// ============================================================================

#[test]
fn scene_upload_and_delete_release_gpu_object() {
    let context = HeadlessContext::new();
    let stats = context.stats();
    let mut scene = Scene::new(EngineSettings::default(), UploadGate::new(context)).unwrap();

    let id = scene
        .resources_mut()
        .new_texture_with(Texture::solid(2, 2, [1; 4]))
        .unwrap();
    let handle = scene
        .upload_texture(
            id,
            UploadOptions {
                free_after: false,
                ..UploadOptions::default()
            },
        )
        .unwrap();
    assert_eq!(scene.resources().texture(id).unwrap().gpu_handle(), Some(handle));
    assert!(!scene.resources().texture(id).unwrap().is_empty());

    scene.delete_texture(id).unwrap();
    assert!(!scene.resources().has_texture(id));
    assert_eq!(stats.releases.load(Ordering::Relaxed), 1);

    assert!(scene.delete_texture(id).unwrap_err().is_not_found());
    assert_eq!(stats.releases.load(Ordering::Relaxed), 1);
}

#[test]
fn never_uploaded_texture_releases_nothing() {
    let context = HeadlessContext::new();
    let stats = context.stats();
    let mut scene = Scene::new(EngineSettings::default(), UploadGate::new(context)).unwrap();

    let id = scene.resources_mut().new_texture().unwrap();
    scene.delete_texture(id).unwrap();
    assert_eq!(stats.releases.load(Ordering::Relaxed), 0);
}
