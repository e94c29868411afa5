// =============================================================================
// UI FEEDBACK DRIVER
// =============================================================================
//
// Turns the session into things a window can draw: slider range and value,
// the elapsed/total clock, the play/pause label and which surface to show.
// Runs once per cadence tick and after every command.
//
// The user's hand on the position slider always wins: while a drag is in
// progress no tick writes the slider value.
//
// =============================================================================

use std::time::Duration;

use crate::core::{PlayState, Session};
use crate::pipeline::PipelineFacade;
use crate::player::StateSynchronizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceView {
    /// Black area shown while nothing is rendering.
    Placeholder,
    Video,
}

/// Label of the play/pause button. Shows the action, not the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLabel {
    Play,
    Pause,
}

impl ButtonLabel {
    pub fn text(self) -> &'static str {
        match self {
            ButtonLabel::Play => "Play",
            ButtonLabel::Pause => "Pause",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub view: SurfaceView,
    pub button: ButtonLabel,
    /// Upper end of the position slider in seconds; `None` while unknown.
    pub slider_max: Option<u64>,
    pub slider_value: u64,
    pub time_text: String,
    pub volume_control: u8,
    pub muted: bool,
    pub status: String,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            view: SurfaceView::Placeholder,
            button: ButtonLabel::Play,
            slider_max: None,
            slider_value: 0,
            time_text: clock_text(Duration::ZERO, None),
            volume_control: 0,
            muted: false,
            status: PlayState::Idle.display_text().to_string(),
        }
    }
}

/// What one tick learned from the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub duration: Option<Duration>,
    pub position: Option<Duration>,
    pub auto_stopped: bool,
}

pub struct FeedbackDriver {
    presentation: Presentation,
    dragging: bool,
}

impl FeedbackDriver {
    pub fn new(session: &Session) -> Self {
        let mut driver = Self {
            presentation: Presentation::default(),
            dragging: false,
        };
        driver.reflect_state(session);
        driver
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn drag_to(&mut self, seconds: u64) {
        if !self.dragging {
            return;
        }
        self.presentation.slider_value = match self.presentation.slider_max {
            Some(max) => seconds.min(max),
            None => seconds,
        };
    }

    /// Releases the slider; returns where it was let go, in seconds.
    pub fn end_drag(&mut self) -> u64 {
        self.dragging = false;
        self.presentation.slider_value
    }

    pub fn tick<P: PipelineFacade>(&mut self, sync: &mut StateSynchronizer<P>) -> TickReport {
        let mut report = TickReport::default();
        if sync.session().state().has_clock() {
            self.refresh_numbers(sync, &mut report);
        }
        self.reflect_state(sync.session());
        report
    }

    fn refresh_numbers<P: PipelineFacade>(
        &mut self,
        sync: &mut StateSynchronizer<P>,
        report: &mut TickReport,
    ) {
        let mut duration = match sync.session().duration() {
            Some(duration) => duration,
            None => match sync.refresh_duration() {
                Ok(duration) => duration,
                Err(err) => {
                    log::debug!("{}", err);
                    self.presentation.slider_max = None;
                    return;
                }
            },
        };

        if sync.session().state() == PlayState::Playing {
            if let Ok(info) = sync.refresh_seekability() {
                match info.end {
                    Some(end) if info.enabled && end > Duration::ZERO && end != duration => {
                        sync.adopt_duration(end);
                        duration = end;
                    }
                    _ => {}
                }
            }
        }
        self.presentation.slider_max = Some(duration.as_secs());
        report.duration = Some(duration);

        let position = match sync.query_position() {
            Ok(position) => position,
            Err(err) => {
                log::debug!("{}", err);
                return;
            }
        };
        report.position = Some(position);

        if position == duration {
            log::info!("Reached the end of the media at {:?}", position);
            if let Err(err) = sync.stop() {
                log::warn!("Automatic stop failed: {}", err);
            }
            report.auto_stopped = true;
            return;
        }

        self.presentation.time_text = clock_text(position, Some(duration));
        if !self.dragging {
            self.presentation.slider_value = position.as_secs();
        }
    }

    /// Label, surface and idle-state resets. No engine queries.
    pub fn reflect_state(&mut self, session: &Session) {
        let state = session.state();
        let p = &mut self.presentation;

        p.volume_control = session.volume().percent();
        p.muted = session.muted();
        p.status = match (state, session.last_error()) {
            (PlayState::Error, Some(error)) => format!("Error: {}", error),
            _ => state.display_text().to_string(),
        };

        match state {
            PlayState::Playing => {
                p.view = SurfaceView::Video;
                p.button = ButtonLabel::Pause;
            }
            PlayState::Paused => {
                p.view = SurfaceView::Video;
                p.button = ButtonLabel::Play;
            }
            PlayState::Ready | PlayState::Idle | PlayState::Error => {
                p.view = SurfaceView::Placeholder;
                p.button = ButtonLabel::Play;
                p.slider_max = session.duration().map(|d| d.as_secs());
                p.time_text = clock_text(Duration::ZERO, session.duration());
                if !self.dragging {
                    p.slider_value = 0;
                }
            }
        }
    }
}

/// `HH:MM:SS`, truncated to whole seconds.
pub fn format_clock(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

fn clock_text(position: Duration, duration: Option<Duration>) -> String {
    format!(
        "{} / {}",
        format_clock(position),
        format_clock(duration.unwrap_or_default())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerConfig;
    use crate::pipeline::fake::FakePipeline;
    use crate::pipeline::{OutputSurface, SeekInfo};

    fn playing(duration: Option<Duration>) -> (StateSynchronizer<FakePipeline>, FeedbackDriver) {
        let (surface, _frames) = OutputSurface::new();
        let mut fake = FakePipeline::new();
        fake.duration = duration;
        let mut sync = StateSynchronizer::new(fake, surface, &PlayerConfig::default());
        sync.open("file:///movie.mp4").unwrap();
        let driver = FeedbackDriver::new(sync.session());
        (sync, driver)
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::ZERO), "00:00:00");
        assert_eq!(format_clock(Duration::from_millis(5_999)), "00:00:05");
        assert_eq!(format_clock(Duration::from_secs(120)), "00:02:00");
        assert_eq!(format_clock(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "03:25:07");
    }

    #[test]
    fn test_idle_presentation() {
        let session = Session::new(crate::pipeline::Volume::clamped(50), false);
        let driver = FeedbackDriver::new(&session);
        let p = driver.presentation();

        assert_eq!(p.view, SurfaceView::Placeholder);
        assert_eq!(p.button, ButtonLabel::Play);
        assert_eq!(p.slider_max, None);
        assert_eq!(p.time_text, "00:00:00 / 00:00:00");
        assert_eq!(p.volume_control, 50);
        assert_eq!(p.status, "No video loaded");
    }

    #[test]
    fn test_tick_publishes_position_and_range() {
        let (mut sync, mut driver) = playing(Some(Duration::from_secs(120)));
        sync.pipeline_mut().position = Duration::from_secs(5);

        let report = driver.tick(&mut sync);

        assert_eq!(report.duration, Some(Duration::from_secs(120)));
        assert_eq!(report.position, Some(Duration::from_secs(5)));
        let p = driver.presentation();
        assert_eq!(p.slider_max, Some(120));
        assert_eq!(p.slider_value, 5);
        assert_eq!(p.time_text, "00:00:05 / 00:02:00");
        assert_eq!(p.view, SurfaceView::Video);
        assert_eq!(p.button, ButtonLabel::Pause);
    }

    #[test]
    fn test_failed_duration_query_leaves_range_unset() {
        let (mut sync, mut driver) = playing(None);
        sync.pipeline_mut().position = Duration::from_secs(3);

        for _ in 0..3 {
            let report = driver.tick(&mut sync);
            assert_eq!(report, TickReport::default());
        }

        assert_eq!(driver.presentation().slider_max, None);
        assert_eq!(driver.presentation().slider_value, 0);
        assert!(sync.session().duration().is_none());

        // Retried on the next tick once the engine knows
        sync.pipeline_mut().duration = Some(Duration::from_secs(30));
        driver.tick(&mut sync);
        assert_eq!(driver.presentation().slider_max, Some(30));
        assert_eq!(driver.presentation().slider_value, 3);
    }

    #[test]
    fn test_failed_position_query_skips_position_only() {
        let (mut sync, mut driver) = playing(Some(Duration::from_secs(60)));
        sync.pipeline_mut().position = Duration::from_secs(10);
        driver.tick(&mut sync);

        sync.pipeline_mut().fail_position_query = true;
        sync.pipeline_mut().position = Duration::from_secs(11);
        let report = driver.tick(&mut sync);

        assert_eq!(report.position, None);
        assert_eq!(report.duration, Some(Duration::from_secs(60)));
        assert_eq!(driver.presentation().slider_value, 10);
        assert_eq!(sync.session().state(), PlayState::Playing);
    }

    #[test]
    fn test_seek_range_end_updates_duration() {
        let (mut sync, mut driver) = playing(Some(Duration::from_secs(60)));
        driver.tick(&mut sync);

        sync.pipeline_mut().seek_info = Some(SeekInfo {
            enabled: true,
            start: Some(Duration::ZERO),
            end: Some(Duration::from_secs(75)),
        });
        let report = driver.tick(&mut sync);

        assert_eq!(report.duration, Some(Duration::from_secs(75)));
        assert_eq!(sync.session().duration(), Some(Duration::from_secs(75)));
        assert_eq!(driver.presentation().slider_max, Some(75));
    }

    #[test]
    fn test_position_at_duration_stops_playback() {
        let (mut sync, mut driver) = playing(Some(Duration::from_secs(120)));
        sync.pipeline_mut().position = Duration::from_secs(120);

        let report = driver.tick(&mut sync);

        assert!(report.auto_stopped);
        assert_eq!(sync.session().state(), PlayState::Ready);
        assert!(!sync.cadence().is_running());
        let p = driver.presentation();
        assert_eq!(p.button, ButtonLabel::Play);
        assert_eq!(p.view, SurfaceView::Placeholder);
        assert_eq!(p.slider_value, 0);
    }

    #[test]
    fn test_drag_suppresses_tick_writes_until_release() {
        let (mut sync, mut driver) = playing(Some(Duration::from_secs(120)));
        sync.pipeline_mut().position = Duration::from_secs(5);
        driver.tick(&mut sync);

        driver.begin_drag();
        driver.drag_to(80);
        sync.pipeline_mut().position = Duration::from_secs(6);
        driver.tick(&mut sync);
        assert_eq!(driver.presentation().slider_value, 80);
        assert_eq!(driver.presentation().time_text, "00:00:06 / 00:02:00");

        assert_eq!(driver.end_drag(), 80);
        driver.tick(&mut sync);
        assert_eq!(driver.presentation().slider_value, 6);
    }

    #[test]
    fn test_drag_is_clamped_to_range() {
        let (mut sync, mut driver) = playing(Some(Duration::from_secs(120)));
        driver.tick(&mut sync);

        driver.drag_to(50);
        assert_eq!(driver.presentation().slider_value, 0);

        driver.begin_drag();
        driver.drag_to(500);
        assert_eq!(driver.end_drag(), 120);
    }

    #[test]
    fn test_paused_shows_video_with_play_label() {
        let (mut sync, mut driver) = playing(Some(Duration::from_secs(120)));
        sync.pause().unwrap();

        driver.tick(&mut sync);

        assert_eq!(driver.presentation().view, SurfaceView::Video);
        assert_eq!(driver.presentation().button, ButtonLabel::Play);
    }

    #[test]
    fn test_error_status_carries_message() {
        let (mut sync, mut driver) = playing(Some(Duration::from_secs(120)));
        sync.apply_event(crate::player::PlayerEvent::FatalError(
            "Could not decode stream.".to_string(),
        ));

        driver.tick(&mut sync);

        assert_eq!(driver.presentation().status, "Error: Could not decode stream.");
        assert_eq!(driver.presentation().view, SurfaceView::Placeholder);
    }

    #[test]
    fn test_ready_restores_default_volume_control() {
        let (mut sync, mut driver) = playing(Some(Duration::from_secs(120)));
        sync.set_volume(85);
        driver.reflect_state(sync.session());
        assert_eq!(driver.presentation().volume_control, 85);

        sync.stop().unwrap();
        driver.tick(&mut sync);

        assert_eq!(driver.presentation().volume_control, 50);
    }
}
