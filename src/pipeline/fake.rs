//! Scripted in-memory engine used by the player tests.
//!
//! Behaves like a well-mannered playbin: state requests succeed unless a
//! failure is queued, seeks move the position immediately, and every state
//! change is posted on the event channel. Tests poke the public fields to
//! script durations, positions and failures, and read `calls` to check
//! ordering.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::pipeline::{
    EngineMessage, EngineState, OutputSurface, PipelineError, PipelineFacade, SeekInfo, SeekMode,
    StreamCounts, StreamKind, StreamTags, Volume,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    SetSource(String),
    BindSurface(u64),
    RequestState(EngineState),
    Recreate,
    Seek(Duration),
    SetVolume(u8),
    SetMuted(bool),
    Shutdown,
}

pub struct FakePipeline {
    live: bool,
    state: EngineState,
    source: Option<String>,
    surface: Option<OutputSurface>,
    volume: Volume,
    muted: bool,
    bus_sender: mpsc::UnboundedSender<EngineMessage>,
    bus_receiver: mpsc::UnboundedReceiver<EngineMessage>,

    // Script
    pub duration: Option<Duration>,
    pub position: Duration,
    /// Overrides the default "seekable over the whole duration" answer.
    pub seek_info: Option<SeekInfo>,
    pub fail_seek_query: bool,
    pub fail_position_query: bool,
    pub fail_duration_query: bool,
    /// The next request for this state fails and kills the handle.
    pub fail_next_transition: Option<EngineState>,
    pub fail_recreate: bool,
    pub stream_counts: StreamCounts,
    pub stream_tags: HashMap<(StreamKind, u32), StreamTags>,

    // Recording
    pub calls: Vec<FakeCall>,
    pub recreate_count: u32,
    /// Whether a READY request has succeeded on the current handle.
    pub ready_since_creation: bool,
}

impl FakePipeline {
    pub fn new() -> Self {
        let (bus_sender, bus_receiver) = mpsc::unbounded_channel();
        Self {
            live: true,
            state: EngineState::Null,
            source: None,
            surface: None,
            volume: Volume::clamped(100),
            muted: false,
            bus_sender,
            bus_receiver,
            duration: None,
            position: Duration::ZERO,
            seek_info: None,
            fail_seek_query: false,
            fail_position_query: false,
            fail_duration_query: false,
            fail_next_transition: None,
            fail_recreate: false,
            stream_counts: StreamCounts::default(),
            stream_tags: HashMap::new(),
            calls: Vec::new(),
            recreate_count: 0,
            ready_since_creation: false,
        }
    }

    /// Queues a message as if the engine had posted it.
    pub fn post(&self, message: EngineMessage) {
        let _ = self.bus_sender.send(message);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn bound_surface(&self) -> Option<u64> {
        self.surface.as_ref().map(OutputSurface::id)
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                FakeCall::Seek(position) => Some(*position),
                _ => None,
            })
            .collect()
    }

    fn has_clock(&self) -> bool {
        self.live && self.state >= EngineState::Paused
    }
}

impl PipelineFacade for FakePipeline {
    fn set_source(&mut self, uri: &str) {
        self.calls.push(FakeCall::SetSource(uri.to_string()));
        self.source = Some(uri.to_string());
        self.position = Duration::ZERO;
    }

    fn bind_surface(&mut self, surface: OutputSurface) {
        self.calls.push(FakeCall::BindSurface(surface.id()));
        self.surface = Some(surface);
    }

    fn request_state(&mut self, target: EngineState) -> Result<(), PipelineError> {
        self.calls.push(FakeCall::RequestState(target));

        if self.fail_next_transition == Some(target) {
            self.fail_next_transition = None;
            self.live = false;
        }
        if !self.live {
            return Err(PipelineError::TransitionFailed { target });
        }

        let old = self.state;
        self.state = target;
        if target == EngineState::Ready {
            self.ready_since_creation = true;
            self.position = Duration::ZERO;
        }
        if old != target {
            self.post(EngineMessage::StateChanged {
                old,
                new: target,
                from_pipeline: true,
            });
        }
        Ok(())
    }

    fn recreate(&mut self) -> Result<(), PipelineError> {
        self.calls.push(FakeCall::Recreate);

        // Fresh handle, fresh bus
        let (bus_sender, bus_receiver) = mpsc::unbounded_channel();
        self.bus_sender = bus_sender;
        self.bus_receiver = bus_receiver;
        self.state = EngineState::Null;
        self.ready_since_creation = false;
        self.position = Duration::ZERO;

        if self.fail_recreate {
            self.live = false;
            return Err(PipelineError::CreationFailed("playbin unavailable".to_string()));
        }

        self.live = true;
        self.recreate_count += 1;
        if let Some(surface) = self.surface.clone() {
            self.bind_surface(surface);
        }
        let (volume, muted) = (self.volume, self.muted);
        self.set_volume(volume);
        self.set_muted(muted);
        Ok(())
    }

    fn query_seekable(&self) -> Result<SeekInfo, PipelineError> {
        if !self.live || self.fail_seek_query {
            return Err(PipelineError::SeekQueryFailed);
        }
        Ok(self.seek_info.unwrap_or(SeekInfo {
            enabled: true,
            start: Some(Duration::ZERO),
            end: self.duration,
        }))
    }

    fn query_duration(&self) -> Result<Duration, PipelineError> {
        if !self.has_clock() || self.fail_duration_query {
            return Err(PipelineError::DurationQueryFailed);
        }
        self.duration.ok_or(PipelineError::DurationQueryFailed)
    }

    fn query_position(&self) -> Result<Duration, PipelineError> {
        if !self.has_clock() || self.fail_position_query {
            return Err(PipelineError::PositionQueryFailed);
        }
        Ok(self.position)
    }

    fn seek(&mut self, position: Duration, _mode: SeekMode) -> Result<(), PipelineError> {
        self.calls.push(FakeCall::Seek(position));
        if !self.has_clock() {
            return Err(PipelineError::SeekFailed { position });
        }
        self.position = position;
        Ok(())
    }

    fn set_volume(&mut self, volume: Volume) {
        self.calls.push(FakeCall::SetVolume(volume.percent()));
        self.volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.calls.push(FakeCall::SetMuted(muted));
        self.muted = muted;
    }

    fn drain_events(&mut self) -> Vec<EngineMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.bus_receiver.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn query_stream_counts(&self) -> StreamCounts {
        self.stream_counts
    }

    fn query_stream_tags(&self, kind: StreamKind, index: u32) -> Option<StreamTags> {
        self.stream_tags.get(&(kind, index)).cloned()
    }

    fn shutdown(&mut self) {
        self.calls.push(FakeCall::Shutdown);
        self.state = EngineState::Null;
        self.live = false;
    }
}
