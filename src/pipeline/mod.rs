// =============================================================================
// PIPELINE FACADE - TYPED BOUNDARY OVER THE MEDIA ENGINE
// =============================================================================
//
// Everything the player knows about the engine goes through PipelineFacade.
// The facade owns the engine handle and is the only thing allowed to destroy
// or rebuild it; recreate() swaps handles in one call so callers never see a
// half-replaced pipeline.
//
// drain_events() MUST return immediately. It is called from the UI cadence
// tick and a blocking pop there freezes the whole window.
//
// =============================================================================

pub mod error;
pub mod event;
pub mod surface;

#[cfg(test)]
pub mod fake;
#[cfg(feature = "gstreamer")]
pub mod playbin;

pub use error::*;
pub use event::*;
pub use surface::*;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine-level state, ordered the way the engine walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EngineState {
    Null,
    Ready,
    Paused,
    Playing,
}

impl EngineState {
    pub fn name(self) -> &'static str {
        match self {
            EngineState::Null => "NULL",
            EngineState::Ready => "READY",
            EngineState::Paused => "PAUSED",
            EngineState::Playing => "PLAYING",
        }
    }
}

/// Volume percentage, always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Volume(u8);

impl Volume {
    pub const MAX: u8 = 100;

    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Linear gain as engines expect it (1.0 == 100%).
    pub fn as_linear(self) -> f64 {
        self.0 as f64 / Self::MAX as f64
    }
}

/// How the engine resolves a seek target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeekMode {
    /// Jump to the nearest key frame. Fast, may land slightly off target.
    #[default]
    KeyUnit,
    /// Decode up to the exact position.
    Accurate,
}

/// Result of a seeking query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekInfo {
    pub enabled: bool,
    pub start: Option<Duration>,
    pub end: Option<Duration>,
}

/// Engine clock value for `time`. Saturates one below `u64::MAX`, which
/// engines reserve for "no time".
pub fn clock_nanos(time: Duration) -> u64 {
    u64::try_from(time.as_nanos())
        .unwrap_or(u64::MAX)
        .min(u64::MAX - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
}

impl StreamKind {
    pub fn label(self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
            StreamKind::Subtitle => "subtitle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamCounts {
    pub video: u32,
    pub audio: u32,
    pub subtitle: u32,
}

impl StreamCounts {
    pub fn of(&self, kind: StreamKind) -> u32 {
        match kind {
            StreamKind::Video => self.video,
            StreamKind::Audio => self.audio,
            StreamKind::Subtitle => self.subtitle,
        }
    }
}

/// Per-stream metadata. Every field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamTags {
    pub codec: Option<String>,
    pub language: Option<String>,
    pub bitrate: Option<u32>,
}

pub trait PipelineFacade {
    /// Binds a new source. Does not start playback; cached duration is stale
    /// afterwards.
    fn set_source(&mut self, uri: &str);

    /// Attaches the surface frames are rendered into. Remembered across
    /// [`PipelineFacade::recreate`].
    fn bind_surface(&mut self, surface: OutputSurface);

    /// Synchronous state request. On failure the handle must be treated as
    /// invalid until [`PipelineFacade::recreate`] is called.
    fn request_state(&mut self, target: EngineState) -> Result<(), PipelineError>;

    /// Destroys the current handle and builds a fresh one bound to the last
    /// surface, source, volume and mute setting.
    fn recreate(&mut self) -> Result<(), PipelineError>;

    fn query_seekable(&self) -> Result<SeekInfo, PipelineError>;

    fn query_duration(&self) -> Result<Duration, PipelineError>;

    fn query_position(&self) -> Result<Duration, PipelineError>;

    /// Flushing seek. Returns once the request is queued; the new position
    /// shows up in a later [`PipelineFacade::query_position`].
    fn seek(&mut self, position: Duration, mode: SeekMode) -> Result<(), PipelineError>;

    fn set_volume(&mut self, volume: Volume);

    fn set_muted(&mut self, muted: bool);

    /// Everything pending on the event channel, oldest first. Never blocks.
    fn drain_events(&mut self) -> Vec<EngineMessage>;

    fn query_stream_counts(&self) -> StreamCounts;

    /// `None` when the engine has no tag list for that stream.
    fn query_stream_tags(&self, kind: StreamKind, index: u32) -> Option<StreamTags>;

    /// Drops to the null state and releases the handle. Safe to call twice.
    fn shutdown(&mut self);
}
