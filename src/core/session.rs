use std::time::Duration;

use crate::pipeline::Volume;

/// Where the session stands, as far as the player is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayState {
    Idle,
    Ready,
    Paused,
    Playing,
    /// Fatal engine error; only a reopen leaves this state.
    Error,
}

impl PlayState {
    /// Paused and Playing are the only states with a running media clock.
    pub fn has_clock(self) -> bool {
        matches!(self, PlayState::Paused | PlayState::Playing)
    }

    pub fn display_text(self) -> &'static str {
        match self {
            PlayState::Idle => "No video loaded",
            PlayState::Ready => "Stopped",
            PlayState::Paused => "Paused",
            PlayState::Playing => "Playing",
            PlayState::Error => "Error",
        }
    }
}

/// Interval within which a seek is currently permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekRange {
    pub start: Duration,
    pub end: Duration,
}

impl SeekRange {
    /// `None` when the engine reported an inverted range.
    pub fn new(start: Duration, end: Duration) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn clamp(&self, position: Duration) -> Duration {
        position.clamp(self.start, self.end)
    }
}

/// The one playback session. Only the state synchronizer writes to it; the
/// rest of the player reads it through the getters.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub(crate) state: PlayState,
    pub(crate) uri: Option<String>,
    pub(crate) duration: Option<Duration>,
    pub(crate) seek_enabled: bool,
    pub(crate) seek_range: Option<SeekRange>,
    pub(crate) volume: Volume,
    pub(crate) muted: bool,
    pub(crate) last_error: Option<String>,
}

impl Session {
    pub fn new(volume: Volume, muted: bool) -> Self {
        Self {
            state: PlayState::Idle,
            uri: None,
            duration: None,
            seek_enabled: false,
            seek_range: None,
            volume,
            muted,
            last_error: None,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// `None` until the engine has answered a duration query.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn seek_enabled(&self) -> bool {
        self.seek_enabled
    }

    pub fn seek_range(&self) -> Option<SeekRange> {
        if self.seek_enabled {
            self.seek_range
        } else {
            None
        }
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Forget everything learned about the current media.
    pub(crate) fn reset_media(&mut self) {
        self.duration = None;
        self.seek_enabled = false;
        self.seek_range = None;
    }
}
