// =============================================================================
// STATE SYNCHRONIZER
// =============================================================================
//
// Owns the session and the pipeline. User commands and classified pipeline
// events both land here; nothing else writes to the session.
//
//   Idle --open/READY ok--> Ready --play/PLAYING ok--> Playing <--> Paused
//   Playing|Paused --stop/READY ok--> Ready        Playing --EOS--> Ready
//   any --request_state fails--> (recreate handle, READY) --> Ready
//   any --fatal engine error--> Error   (only open() leaves Error)
//
// Session state changes only after the engine has accepted the request.
// Bus state-change reports can be stale, so they never move the session;
// they only trigger a seekability refresh when the pipeline hits PLAYING.
//
// =============================================================================

use std::time::{Duration, Instant};

use crate::core::{PlayState, PlayerConfig, SeekRange, Session};
use crate::pipeline::{
    EngineMessage, EngineState, OutputSurface, PipelineError, PipelineFacade, SeekInfo, SeekMode,
    Volume,
};
use crate::player::{Cadence, PlayerEvent, StreamInspector, StreamReport};

pub struct StateSynchronizer<P: PipelineFacade> {
    pipeline: P,
    session: Session,
    cadence: Cadence,
    default_volume: Volume,
    seek_mode: SeekMode,
    closed: bool,
}

impl<P: PipelineFacade> StateSynchronizer<P> {
    pub fn new(mut pipeline: P, surface: OutputSurface, config: &PlayerConfig) -> Self {
        let default_volume = Volume::clamped(config.default_volume as i64);

        pipeline.bind_surface(surface);
        pipeline.set_volume(default_volume);
        pipeline.set_muted(config.start_muted);

        Self {
            pipeline,
            session: Session::new(default_volume, config.start_muted),
            cadence: Cadence::new(config.tick_interval()),
            default_volume,
            seek_mode: config.seek_mode,
            closed: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    #[cfg(test)]
    pub(crate) fn pipeline_mut(&mut self) -> &mut P {
        &mut self.pipeline
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn default_volume(&self) -> Volume {
        self.default_volume
    }

    /// True when a cadence tick is due.
    pub fn poll_cadence(&mut self, now: Instant) -> bool {
        !self.closed && self.cadence.poll(now)
    }

    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.cadence.time_until_next(now)
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Stops whatever is playing, binds `uri` and starts playing it.
    pub fn open(&mut self, uri: &str) -> Result<(), PipelineError> {
        if self.closed {
            log::warn!("Ignoring open of {} after close", uri);
            return Ok(());
        }
        log::info!("Opening {}", uri);

        if self.session.state == PlayState::Error {
            // The errored handle is not trusted with a new source
            if let Err(err) = self.pipeline.recreate() {
                self.fail(&err);
                return Err(err);
            }
        } else if let Err(err) = self.stop() {
            if self.session.state == PlayState::Error {
                return Err(err);
            }
        }

        self.pipeline.set_source(uri);
        self.session.uri = Some(uri.to_string());
        self.session.reset_media();
        self.session.last_error = None;

        self.request(EngineState::Ready)?;
        self.enter_ready();
        self.play()
    }

    pub fn play(&mut self) -> Result<(), PipelineError> {
        let from = self.session.state;
        match from {
            PlayState::Playing => return Ok(()),
            PlayState::Idle => {
                log::debug!("Play ignored, no source loaded");
                return Ok(());
            }
            PlayState::Error => {
                log::warn!("Play ignored, the source has to be reopened first");
                return Ok(());
            }
            PlayState::Ready | PlayState::Paused => {}
        }

        self.request(EngineState::Playing)?;
        self.session.state = PlayState::Playing;
        log::info!("Playing {}", self.session.uri().unwrap_or_default());

        if from == PlayState::Ready {
            self.update_seekability();
        }
        self.cadence.start(Instant::now());
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PipelineError> {
        match self.session.state {
            PlayState::Playing => {}
            PlayState::Paused => return Ok(()),
            other => {
                log::debug!("Pause ignored while {:?}", other);
                return Ok(());
            }
        }

        self.request(EngineState::Paused)?;
        self.session.state = PlayState::Paused;
        log::info!("Paused");
        Ok(())
    }

    /// Play/pause button semantics.
    pub fn toggle_playback(&mut self) -> Result<(), PipelineError> {
        if self.session.state == PlayState::Playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Back to Ready. A no-op unless something is playing or paused.
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        if !self.session.state.has_clock() {
            self.cadence.stop();
            return Ok(());
        }

        self.request(EngineState::Ready)?;
        self.cadence.stop();
        self.enter_ready();
        log::info!("Stopped");
        Ok(())
    }

    /// Queues a flushing seek. Lands within the known duration and seek
    /// range; ignored while the source reports it cannot seek.
    pub fn seek_to(&mut self, seconds: f64) -> Result<(), PipelineError> {
        if !self.session.state.has_clock() {
            log::debug!("Seek ignored while {:?}", self.session.state);
            return Ok(());
        }
        if !self.session.seek_enabled {
            log::warn!("Seeking is DISABLED for this stream");
            return Ok(());
        }

        let mut target = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX);
        if let Some(duration) = self.session.duration {
            target = target.min(duration);
        }
        if let Some(range) = self.session.seek_range() {
            target = range.clamp(target);
        }

        log::debug!("Seeking to {:?}", target);
        self.pipeline.seek(target, self.seek_mode)
    }

    pub fn set_volume(&mut self, value: i64) {
        if self.closed {
            return;
        }
        let volume = Volume::clamped(value);
        if volume.percent() as i64 != value {
            log::debug!("Volume {} clamped to {}", value, volume.percent());
        }
        self.session.volume = volume;
        self.pipeline.set_volume(volume);
    }

    pub fn toggle_mute(&mut self) {
        if self.closed {
            return;
        }
        self.session.muted = !self.session.muted;
        self.pipeline.set_muted(self.session.muted);
        log::debug!("Muted: {}", self.session.muted);
    }

    /// Stop, release the engine, ignore everything afterwards.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        log::info!("Closing session");

        if let Err(err) = self.stop() {
            log::warn!("Stop during close failed: {}", err);
        }
        self.cadence.stop();
        self.pipeline.shutdown();
        self.session.state = PlayState::Idle;
        self.closed = true;
    }

    // =========================================================================
    // PIPELINE EVENTS
    // =========================================================================

    pub fn apply_event(&mut self, event: PlayerEvent) {
        if self.closed {
            return;
        }

        match event {
            PlayerEvent::StateChanged(old, new) => {
                log::debug!("Pipeline state changed from {} to {}", old.name(), new.name());
                if new == EngineState::Playing && self.session.state == PlayState::Playing {
                    self.update_seekability();
                }
            }
            PlayerEvent::DurationInvalidated => {
                log::debug!("Duration changed, requerying on next tick");
                self.session.duration = None;
            }
            PlayerEvent::EndOfStream => {
                if self.session.state == PlayState::Playing {
                    log::info!("End-Of-Stream reached");
                    if let Err(err) = self.stop() {
                        log::warn!("Stop after End-Of-Stream failed: {}", err);
                    }
                } else {
                    log::debug!("Ignoring End-Of-Stream while {:?}", self.session.state);
                }
            }
            PlayerEvent::FatalError(message) => {
                log::error!("Error received from pipeline");
                self.fail(&PipelineError::Fatal { message });
            }
        }
    }

    pub(crate) fn drain_engine_messages(&mut self) -> Vec<EngineMessage> {
        if self.closed {
            return Vec::new();
        }
        self.pipeline.drain_events()
    }

    // =========================================================================
    // QUERIES (cached into the session)
    // =========================================================================

    pub fn refresh_duration(&mut self) -> Result<Duration, PipelineError> {
        let duration = self.pipeline.query_duration()?;
        log::debug!("The playbin duration is {:?}", duration);
        self.session.duration = Some(duration);
        Ok(duration)
    }

    /// A failed query counts as "not seekable" until the next success.
    pub fn refresh_seekability(&mut self) -> Result<SeekInfo, PipelineError> {
        match self.pipeline.query_seekable() {
            Ok(info) => {
                self.session.seek_enabled = info.enabled;
                self.session.seek_range = match (info.enabled, info.start, info.end) {
                    (true, Some(start), Some(end)) => SeekRange::new(start, end),
                    _ => None,
                };
                if info.enabled {
                    log::debug!("Seeking is ENABLED from {:?} to {:?}", info.start, info.end);
                } else {
                    log::debug!("Seeking is DISABLED for this stream");
                }
                Ok(info)
            }
            Err(err) => {
                self.session.seek_enabled = false;
                self.session.seek_range = None;
                Err(err)
            }
        }
    }

    /// Takes a duration learned from somewhere other than a duration query
    /// (the end of the seek range).
    pub fn adopt_duration(&mut self, duration: Duration) {
        if self.session.duration != Some(duration) {
            log::debug!("Duration updated to {:?}", duration);
            self.session.duration = Some(duration);
        }
    }

    /// Current position, never past the known duration.
    pub fn query_position(&self) -> Result<Duration, PipelineError> {
        let position = self.pipeline.query_position()?;
        Ok(match self.session.duration {
            Some(duration) => position.min(duration),
            None => position,
        })
    }

    pub fn inspect_streams(&self) -> StreamReport {
        if self.closed {
            return StreamReport::default();
        }
        StreamInspector::inspect(&self.pipeline)
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn request(&mut self, target: EngineState) -> Result<(), PipelineError> {
        match self.pipeline.request_state(target) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.recover(&err);
                Err(err)
            }
        }
    }

    /// Swap in a fresh handle and settle in Ready (Idle without a source).
    fn recover(&mut self, cause: &PipelineError) {
        log::warn!("{}; rebuilding pipeline", cause);
        self.cadence.stop();

        if let Err(err) = self.pipeline.recreate() {
            self.fail(&err);
            return;
        }
        self.session.reset_media();

        if self.session.uri.is_none() {
            self.session.state = PlayState::Idle;
            return;
        }
        match self.pipeline.request_state(EngineState::Ready) {
            Ok(()) => {
                self.enter_ready();
                log::info!("Pipeline rebuilt and ready");
            }
            Err(err) => self.fail(&err),
        }
    }

    fn fail(&mut self, err: &PipelineError) {
        log::error!("{}", err);
        self.cadence.stop();
        self.session.state = PlayState::Error;
        self.session.last_error = Some(err.to_string());
    }

    /// A failed query is already recorded as "not seekable".
    fn update_seekability(&mut self) {
        if let Err(err) = self.refresh_seekability() {
            log::debug!("{}; seeking stays disabled", err);
        }
    }

    /// Messages queued before READY describe the previous run. Ready always
    /// comes back at the default volume.
    fn enter_ready(&mut self) {
        self.session.state = PlayState::Ready;
        self.restore_default_volume();
        let stale = self.pipeline.drain_events();
        if !stale.is_empty() {
            log::debug!("Discarded {} stale pipeline messages", stale.len());
        }
    }

    fn restore_default_volume(&mut self) {
        if self.session.volume != self.default_volume {
            self.session.volume = self.default_volume;
            self.pipeline.set_volume(self.default_volume);
        }
    }
}
