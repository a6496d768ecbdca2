//! Cross-Thread Upload Gate
//!
//! GPU state may only be mutated on the thread that owns the graphics
//! context. [`UploadGate`] enforces that rule for every thread in the
//! process:
//!
//! - On the owner thread, [`UploadGate::execute`] runs the task immediately.
//! - On any other thread, the task is sent over a channel to the owner and
//!   the caller blocks until the owner has run it and replied.
//!
//! The owner drains the channel by calling [`UploadGate::pump`] (typically
//! once per frame) or [`UploadGate::pump_timeout`].
//!
//! ```rust,ignore
//! let gate = UploadGate::new(HeadlessContext::new());
//! let worker = {
//!     let gate = gate.clone();
//!     let texture = texture.clone();
//!     std::thread::spawn(move || texture.upload(&gate, UploadOptions::default()))
//! };
//! while !worker.is_finished() {
//!     gate.pump_timeout(Duration::from_millis(10))?;
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

// ============================================================================
// Context contract
// ============================================================================

/// Opaque GPU texture object id handed out by a [`GraphicsContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuTextureHandle(u64);

impl GpuTextureHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Pixel data borrowed from a texture for the duration of an upload.
#[derive(Debug, Clone, Copy)]
pub struct TextureImage<'a> {
    pub width: u32,
    pub height: u32,
    pub bpp: u32,
    pub data: &'a [u8],
}

impl TextureImage<'_> {
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * (self.bpp as usize / 8)
    }
}

/// Sampling and lifetime options applied when a texture is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    /// Release the CPU copy once the GPU copy exists.
    pub free_after: bool,
    pub generate_mipmaps: bool,
    /// Repeat addressing; clamp to edge otherwise.
    pub repeat: bool,
    /// Linear filtering; nearest otherwise.
    pub linear: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            free_after: true,
            generate_mipmaps: true,
            repeat: true,
            linear: false,
        }
    }
}

/// GPU-state-mutating operations the core needs from a backend.
///
/// Implementations are only ever invoked on the gate's owner thread.
pub trait GraphicsContext: Send {
    /// Creates (or refills, when `existing` is set) a GPU texture.
    fn upload_texture(
        &mut self,
        existing: Option<GpuTextureHandle>,
        image: &TextureImage<'_>,
        options: &UploadOptions,
    ) -> Result<GpuTextureHandle>;

    fn release_texture(&mut self, handle: GpuTextureHandle);
}

// ============================================================================
// Headless context
// ============================================================================

/// Counters shared between a [`HeadlessContext`] and its creator.
#[derive(Debug, Default)]
pub struct HeadlessStats {
    pub uploads: AtomicU64,
    pub releases: AtomicU64,
}

/// A [`GraphicsContext`] without a GPU.
///
/// Hands out sequential handles and validates sizes the way a real API
/// would, which makes it suitable for servers, tools and tests.
#[derive(Debug)]
pub struct HeadlessContext {
    next_handle: u64,
    stats: Arc<HeadlessStats>,
}

impl HeadlessContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            stats: Arc::new(HeadlessStats::default()),
        }
    }

    /// Counters that stay readable after the context is moved into a gate.
    #[must_use]
    pub fn stats(&self) -> Arc<HeadlessStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext for HeadlessContext {
    fn upload_texture(
        &mut self,
        existing: Option<GpuTextureHandle>,
        image: &TextureImage<'_>,
        _options: &UploadOptions,
    ) -> Result<GpuTextureHandle> {
        if image.data.len() != image.expected_len() {
            let err = EngineError::Gpu {
                site: "HeadlessContext::upload_texture",
                message: format!(
                    "{}x{}@{}bpp needs {} bytes, got {}",
                    image.width,
                    image.height,
                    image.bpp,
                    image.expected_len(),
                    image.data.len()
                ),
            };
            log::error!("{err}");
            return Err(err);
        }

        self.stats.uploads.fetch_add(1, Ordering::Relaxed);
        Ok(existing.unwrap_or_else(|| {
            let handle = GpuTextureHandle(self.next_handle);
            self.next_handle += 1;
            handle
        }))
    }

    fn release_texture(&mut self, _handle: GpuTextureHandle) {
        self.stats.releases.fetch_add(1, Ordering::Relaxed);
    }
}

// ============================================================================
// Gate
// ============================================================================

type UploadTask = Box<dyn FnOnce(&mut dyn GraphicsContext) + Send>;

struct GateInner {
    owner: ThreadId,
    context: Mutex<Box<dyn GraphicsContext>>,
    sender: flume::Sender<UploadTask>,
    receiver: flume::Receiver<UploadTask>,
    closed: AtomicBool,
}

/// Routes GPU work onto the thread that owns the graphics context.
///
/// Cloning is cheap; every clone talks to the same owner.
#[derive(Clone)]
pub struct UploadGate {
    inner: Arc<GateInner>,
}

impl UploadGate {
    /// Creates a gate owned by the calling thread.
    pub fn new(context: impl GraphicsContext + 'static) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            inner: Arc::new(GateInner {
                owner: thread::current().id(),
                context: Mutex::new(Box::new(context)),
                sender,
                receiver,
                closed: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn owner(&self) -> ThreadId {
        self.inner.owner
    }

    #[must_use]
    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.inner.owner
    }

    /// Tasks waiting for the owner to pump.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.receiver.len()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Runs `task` against the graphics context on the owner thread.
    ///
    /// Off the owner thread this blocks until the owner has pumped the task.
    pub fn execute<R, F>(&self, task: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GraphicsContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_owner_thread() {
            return self.with_context(task);
        }

        if self.is_closed() {
            return Err(EngineError::UploadQueueClosed);
        }

        let (done_tx, done_rx) = flume::bounded(1);
        let job: UploadTask = Box::new(move |ctx| {
            let _ = done_tx.send(task(ctx));
        });

        self.inner
            .sender
            .send(job)
            .map_err(|_| EngineError::UploadQueueClosed)?;
        log::trace!("Queued upload task from {:?}", thread::current().id());

        // Lost a race with shutdown: nobody will pump this queue again.
        if self.is_closed() {
            self.inner.receiver.try_iter().for_each(drop);
        }

        done_rx.recv().map_err(|_| EngineError::UploadQueueClosed)
    }

    /// Borrows the context directly. Owner thread only.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut dyn GraphicsContext) -> R) -> Result<R> {
        self.ensure_owner("with_context")?;
        let Some(mut context) = self.inner.context.try_lock() else {
            return Err(EngineError::InvalidOperation(
                "graphics context is already borrowed on the owner thread".into(),
            ));
        };
        Ok(f(&mut **context))
    }

    /// Runs every queued task. Owner thread only.
    pub fn pump(&self) -> Result<usize> {
        self.ensure_owner("pump")?;
        let mut context = self.inner.context.lock();
        let mut executed = 0;
        for task in self.inner.receiver.try_iter() {
            task(&mut **context);
            executed += 1;
        }
        if executed > 0 {
            log::trace!("Pumped {executed} upload task(s)");
        }
        Ok(executed)
    }

    /// Waits up to `timeout` for a task, then drains the queue.
    pub fn pump_timeout(&self, timeout: Duration) -> Result<usize> {
        self.ensure_owner("pump_timeout")?;
        match self.inner.receiver.recv_timeout(timeout) {
            Ok(task) => {
                {
                    let mut context = self.inner.context.lock();
                    task(&mut **context);
                }
                Ok(1 + self.pump()?)
            }
            Err(_) => Ok(0),
        }
    }

    /// Rejects new tasks and drops queued ones; their callers get
    /// [`EngineError::UploadQueueClosed`].
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let dropped = self.inner.receiver.try_iter().count();
        if dropped > 0 {
            log::warn!("Upload gate shut down with {dropped} task(s) still queued");
        }
    }

    fn ensure_owner(&self, what: &str) -> Result<()> {
        if self.is_owner_thread() {
            Ok(())
        } else {
            Err(EngineError::InvalidOperation(format!(
                "UploadGate::{what} called off the owner thread ({:?})",
                self.inner.owner
            )))
        }
    }
}

impl std::fmt::Debug for UploadGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadGate")
            .field("owner", &self.inner.owner)
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}
