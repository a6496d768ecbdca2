//! Render Pipeline
//!
//! A pipeline entry binds one stage, seen through one camera, into one
//! viewport of one render target. Every frame the scene walks the active
//! entries in priority order and renders each as a sequence.
//!
//! # Entry lifecycle
//!
//! ```text
//! add() ──► Configured ──activate()──► Active
//!              ▲                          │
//!              └──────deactivate()────────┘
//!
//! remove() from either state: the id stops resolving.
//! ```
//!
//! Bindings are fixed at creation. Rebinding means removing the entry and
//! adding a new one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{CameraId, PipelineId, StageId, TextureId, ViewportId};
use crate::errors::{EngineError, Result};

/// Sequence ordering key. Lower values render first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RenderPriority(pub i32);

impl RenderPriority {
    pub const ABSOLUTE_BACKGROUND: Self = Self(-250);
    pub const BACKGROUND: Self = Self(-100);
    pub const DISTANT: Self = Self(-50);
    pub const MAIN: Self = Self(0);
    pub const NEAR: Self = Self(50);
    pub const FOREGROUND: Self = Self(100);
    pub const ABSOLUTE_FOREGROUND: Self = Self(250);
}

impl Default for RenderPriority {
    fn default() -> Self {
        Self::MAIN
    }
}

/// Where a sequence draws to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderTarget {
    #[default]
    Window,
    /// Render-to-texture.
    Texture(TextureId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Configured,
    Active,
}

#[derive(Debug, Clone)]
pub struct PipelineEntry {
    stage: StageId,
    camera: CameraId,
    viewport: ViewportId,
    target: RenderTarget,
    priority: RenderPriority,
    state: PipelineState,
    seq: u64,
}

impl PipelineEntry {
    #[inline]
    #[must_use]
    pub fn stage(&self) -> StageId {
        self.stage
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> CameraId {
        self.camera
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> ViewportId {
        self.viewport
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> RenderTarget {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn priority(&self) -> RenderPriority {
        self.priority
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == PipelineState::Active
    }

    /// Insertion sequence, used as the tie-break between equal priorities.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.seq
    }
}

/// Ordered set of pipeline entries.
#[derive(Debug, Default)]
pub struct Pipeline {
    entries: BTreeMap<PipelineId, PipelineEntry>,
    next_seq: u64,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new entry in the `Configured` state.
    pub fn add(
        &mut self,
        stage: StageId,
        camera: CameraId,
        viewport: ViewportId,
        target: RenderTarget,
        priority: RenderPriority,
    ) -> PipelineId {
        let id = PipelineId::allocate();
        let seq = self.next_seq;
        self.next_seq += 1;

        self.entries.insert(
            id,
            PipelineEntry {
                stage,
                camera,
                viewport,
                target,
                priority,
                state: PipelineState::Configured,
                seq,
            },
        );
        id
    }

    pub fn entry(&self, id: PipelineId) -> Result<&PipelineEntry> {
        self.entries
            .get(&id)
            .ok_or_else(|| EngineError::not_found("Pipeline", id.get()))
    }

    fn entry_mut(&mut self, id: PipelineId) -> Result<&mut PipelineEntry> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found("Pipeline", id.get()))
    }

    #[must_use]
    pub fn contains(&self, id: PipelineId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn activate(&mut self, id: PipelineId) -> Result<()> {
        let entry = self.entry_mut(id)?;
        if entry.state != PipelineState::Active {
            entry.state = PipelineState::Active;
            log::debug!("Pipeline {id} activated (priority {})", entry.priority.0);
        }
        Ok(())
    }

    pub fn deactivate(&mut self, id: PipelineId) -> Result<()> {
        let entry = self.entry_mut(id)?;
        if entry.state != PipelineState::Configured {
            entry.state = PipelineState::Configured;
            log::debug!("Pipeline {id} deactivated");
        }
        Ok(())
    }

    pub fn remove(&mut self, id: PipelineId) -> Result<PipelineEntry> {
        self.entries
            .remove(&id)
            .ok_or_else(|| EngineError::not_found("Pipeline", id.get()))
    }

    /// Drops every entry bound to `stage`. Returns how many were removed.
    pub fn remove_referencing_stage(&mut self, stage: StageId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.stage != stage);
        before - self.entries.len()
    }

    /// Drops every entry bound to `camera`.
    pub fn remove_referencing_camera(&mut self, camera: CameraId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.camera != camera);
        before - self.entries.len()
    }

    /// Active entries by ascending priority, then insertion order.
    #[must_use]
    pub fn active_in_order(&self) -> Vec<(PipelineId, &PipelineEntry)> {
        let mut active: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_active())
            .map(|(id, entry)| (*id, entry))
            .collect();

        // (priority, seq) is unique, so an unstable sort is deterministic
        active.sort_unstable_by_key(|(_, entry)| (entry.priority, entry.seq));
        active
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
