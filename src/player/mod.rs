pub mod cadence;
pub mod feedback;
pub mod inspector;
pub mod pump;
pub mod synchronizer;

pub use cadence::*;
pub use feedback::*;
pub use inspector::*;
pub use pump::*;
pub use synchronizer::*;

use std::time::{Duration, Instant};

use crate::core::{PlayerConfig, Session};
use crate::pipeline::{OutputSurface, PipelineError, PipelineFacade};

/// Everything the presentation layer can ask of the player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Open(String),
    Play,
    Pause,
    TogglePlayback,
    Stop,
    SeekTo(f64),
    SetVolume(i64),
    ToggleMute,
    Close,
}

/// Glue between the window and the player core: routes commands to the
/// synchronizer and runs the drain-and-refresh cycle when the cadence says so.
pub struct PlaybackController<P: PipelineFacade> {
    sync: StateSynchronizer<P>,
    feedback: FeedbackDriver,
    show_stream_info: bool,
    stream_report: Option<StreamReport>,
    /// Inspect streams on the next tick that knows the duration.
    report_pending: bool,
}

impl<P: PipelineFacade> PlaybackController<P> {
    pub fn new(pipeline: P, surface: OutputSurface, config: &PlayerConfig) -> Self {
        let sync = StateSynchronizer::new(pipeline, surface, config);
        let feedback = FeedbackDriver::new(sync.session());
        Self {
            sync,
            feedback,
            show_stream_info: config.show_stream_info,
            stream_report: None,
            report_pending: false,
        }
    }

    pub fn dispatch(&mut self, command: PlayerCommand) -> Result<(), PipelineError> {
        log::debug!("Command: {:?}", command);

        let result = match command {
            PlayerCommand::Open(uri) => {
                self.stream_report = None;
                self.report_pending = self.show_stream_info;
                self.sync.open(&uri)
            }
            PlayerCommand::Play => self.sync.play(),
            PlayerCommand::Pause => self.sync.pause(),
            PlayerCommand::TogglePlayback => self.sync.toggle_playback(),
            PlayerCommand::Stop => self.sync.stop(),
            PlayerCommand::SeekTo(seconds) => self.sync.seek_to(seconds),
            PlayerCommand::SetVolume(value) => {
                self.sync.set_volume(value);
                Ok(())
            }
            PlayerCommand::ToggleMute => {
                self.sync.toggle_mute();
                Ok(())
            }
            PlayerCommand::Close => {
                self.sync.close();
                Ok(())
            }
        };

        self.feedback.reflect_state(self.sync.session());
        result
    }

    /// Called every frame. Runs a tick when one is due.
    pub fn on_frame(&mut self, now: Instant) -> Option<TickReport> {
        if !self.sync.poll_cadence(now) {
            return None;
        }
        Some(self.tick())
    }

    /// One drain-and-refresh cycle, regardless of the cadence.
    pub fn tick(&mut self) -> TickReport {
        let dispatched = MessagePump::pump(&mut self.sync);
        if dispatched > 0 {
            log::trace!("Dispatched {} pipeline events", dispatched);
        }
        let report = self.feedback.tick(&mut self.sync);

        // Stream counts stay at zero until the engine has prerolled, and a
        // known duration means it has
        if self.report_pending && report.duration.is_some() {
            self.report_pending = false;
            self.refresh_stream_report();
        }
        report
    }

    /// Asks for a fresh stream report once the current media has prerolled.
    pub fn request_stream_report(&mut self) {
        self.report_pending = true;
    }

    pub fn refresh_stream_report(&mut self) -> &StreamReport {
        self.stream_report.insert(self.sync.inspect_streams())
    }

    pub fn stream_report(&self) -> Option<&StreamReport> {
        self.stream_report.as_ref()
    }

    pub fn presentation(&self) -> &Presentation {
        self.feedback.presentation()
    }

    pub fn session(&self) -> &Session {
        self.sync.session()
    }

    pub fn synchronizer(&self) -> &StateSynchronizer<P> {
        &self.sync
    }

    #[cfg(test)]
    pub(crate) fn synchronizer_mut(&mut self) -> &mut StateSynchronizer<P> {
        &mut self.sync
    }

    pub fn begin_drag(&mut self) {
        self.feedback.begin_drag();
    }

    pub fn drag_to(&mut self, seconds: u64) {
        self.feedback.drag_to(seconds);
    }

    /// Lets go of the position slider and seeks to where it was dropped.
    pub fn end_drag(&mut self) -> Result<(), PipelineError> {
        let seconds = self.feedback.end_drag();
        self.dispatch(PlayerCommand::SeekTo(seconds as f64))
    }

    pub fn is_dragging(&self) -> bool {
        self.feedback.is_dragging()
    }

    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.sync.time_until_next_tick(now)
    }
}
