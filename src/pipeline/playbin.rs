//! GStreamer `playbin` behind the [`PipelineFacade`] boundary.
//!
//! Video goes to an RGBA `appsink` whose callback publishes every decoded
//! frame on the bound [`OutputSurface`]; audio uses playbin's automatic sink.

use std::time::Duration;

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;

use crate::pipeline::{
    clock_nanos, EngineMessage, EngineState, OutputSurface, PipelineError, PipelineFacade, SeekInfo, SeekMode,
    StreamCounts, StreamKind, StreamTags, VideoFrame, Volume,
};

pub struct PlaybinPipeline {
    playbin: Option<gst::Element>,
    source: Option<String>,
    surface: Option<OutputSurface>,
    volume: Volume,
    muted: bool,
}

impl PlaybinPipeline {
    pub fn new() -> Result<Self, PipelineError> {
        gst::init().map_err(|e| PipelineError::CreationFailed(e.to_string()))?;

        let playbin = build_playbin()?;
        log::info!("Created playbin ({})", gst::version_string());

        Ok(Self {
            playbin: Some(playbin),
            source: None,
            surface: None,
            volume: Volume::clamped(Volume::MAX as i64),
            muted: false,
        })
    }

    /// Pushes everything we remember onto a freshly built handle.
    fn configure(&self, playbin: &gst::Element) {
        if let Some(uri) = &self.source {
            playbin.set_property("uri", uri);
        }
        if let Some(surface) = &self.surface {
            playbin.set_property("video-sink", &video_sink(surface.clone()));
        }
        playbin.set_property("volume", self.volume.as_linear());
        playbin.set_property("mute", self.muted);
    }

    fn translate(&self, message: &gst::Message) -> EngineMessage {
        use gst::MessageView;

        match message.view() {
            MessageView::StateChanged(change) => {
                let from_pipeline = match (message.src(), &self.playbin) {
                    (Some(src), Some(playbin)) => src == playbin.upcast_ref::<gst::Object>(),
                    _ => false,
                };
                EngineMessage::StateChanged {
                    old: engine_state(change.old()),
                    new: engine_state(change.current()),
                    from_pipeline,
                }
            }
            MessageView::DurationChanged(_) => EngineMessage::DurationChanged,
            MessageView::Eos(_) => EngineMessage::EndOfStream,
            MessageView::Error(err) => EngineMessage::Error {
                message: err.error().to_string(),
                debug: err.debug().map(|d| d.to_string()),
            },
            MessageView::Warning(warning) => EngineMessage::Warning {
                message: warning.error().to_string(),
            },
            _ => EngineMessage::Other(format!("{:?}", message.type_())),
        }
    }
}

impl Drop for PlaybinPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl PipelineFacade for PlaybinPipeline {
    fn set_source(&mut self, uri: &str) {
        log::info!("Setting source: {}", uri);
        self.source = Some(uri.to_string());
        if let Some(playbin) = &self.playbin {
            playbin.set_property("uri", uri);
        }
    }

    fn bind_surface(&mut self, surface: OutputSurface) {
        log::debug!("Binding output surface #{}", surface.id());
        if let Some(playbin) = &self.playbin {
            playbin.set_property("video-sink", &video_sink(surface.clone()));
        }
        self.surface = Some(surface);
    }

    fn request_state(&mut self, target: EngineState) -> Result<(), PipelineError> {
        let playbin = self
            .playbin
            .as_ref()
            .ok_or(PipelineError::TransitionFailed { target })?;

        playbin
            .set_state(gst_state(target))
            .map(|_| ())
            .map_err(|_| PipelineError::TransitionFailed { target })
    }

    fn recreate(&mut self) -> Result<(), PipelineError> {
        if let Some(old) = self.playbin.take() {
            log::debug!("Destroying playbin");
            let _ = old.set_state(gst::State::Null);
        }

        let playbin = build_playbin()?;
        self.configure(&playbin);
        self.playbin = Some(playbin);
        log::info!("Playbin recreated");
        Ok(())
    }

    fn query_seekable(&self) -> Result<SeekInfo, PipelineError> {
        let playbin = self.playbin.as_ref().ok_or(PipelineError::SeekQueryFailed)?;

        let mut query = gst::query::Seeking::new(gst::Format::Time);
        if !playbin.query(&mut query) {
            return Err(PipelineError::SeekQueryFailed);
        }
        let (enabled, start, end) = query.result();
        Ok(SeekInfo {
            enabled,
            start: formatted_time(start),
            end: formatted_time(end),
        })
    }

    fn query_duration(&self) -> Result<Duration, PipelineError> {
        self.playbin
            .as_ref()
            .and_then(|playbin| playbin.query_duration::<gst::ClockTime>())
            .map(|t| Duration::from_nanos(t.nseconds()))
            .ok_or(PipelineError::DurationQueryFailed)
    }

    fn query_position(&self) -> Result<Duration, PipelineError> {
        self.playbin
            .as_ref()
            .and_then(|playbin| playbin.query_position::<gst::ClockTime>())
            .map(|t| Duration::from_nanos(t.nseconds()))
            .ok_or(PipelineError::PositionQueryFailed)
    }

    fn seek(&mut self, position: Duration, mode: SeekMode) -> Result<(), PipelineError> {
        let playbin = self
            .playbin
            .as_ref()
            .ok_or(PipelineError::SeekFailed { position })?;

        let flags = match mode {
            SeekMode::KeyUnit => gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
            SeekMode::Accurate => gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE,
        };
        let target = gst::ClockTime::from_nseconds(clock_nanos(position));
        playbin
            .seek_simple(flags, target)
            .map_err(|_| PipelineError::SeekFailed { position })
    }

    fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        if let Some(playbin) = &self.playbin {
            playbin.set_property("volume", volume.as_linear());
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(playbin) = &self.playbin {
            playbin.set_property("mute", muted);
        }
    }

    fn drain_events(&mut self) -> Vec<EngineMessage> {
        let Some(bus) = self.playbin.as_ref().and_then(|playbin| playbin.bus()) else {
            return Vec::new();
        };

        let mut messages = Vec::new();
        while let Some(message) = bus.pop() {
            messages.push(self.translate(&message));
        }
        messages
    }

    fn query_stream_counts(&self) -> StreamCounts {
        let Some(playbin) = &self.playbin else {
            return StreamCounts::default();
        };
        let count = |property: &str| playbin.property::<i32>(property).max(0) as u32;
        StreamCounts {
            video: count("n-video"),
            audio: count("n-audio"),
            subtitle: count("n-text"),
        }
    }

    fn query_stream_tags(&self, kind: StreamKind, index: u32) -> Option<StreamTags> {
        let playbin = self.playbin.as_ref()?;
        let signal = match kind {
            StreamKind::Video => "get-video-tags",
            StreamKind::Audio => "get-audio-tags",
            StreamKind::Subtitle => "get-text-tags",
        };
        let tags = playbin.emit_by_name::<Option<gst::TagList>>(signal, &[&(index as i32)])?;

        let codec = match kind {
            StreamKind::Video => tags.get::<gst::tags::VideoCodec>().map(|v| v.get().to_string()),
            StreamKind::Audio => tags.get::<gst::tags::AudioCodec>().map(|v| v.get().to_string()),
            StreamKind::Subtitle => None,
        };
        Some(StreamTags {
            codec,
            language: tags
                .get::<gst::tags::LanguageCode>()
                .map(|v| v.get().to_string()),
            bitrate: tags.get::<gst::tags::Bitrate>().map(|v| v.get()),
        })
    }

    fn shutdown(&mut self) {
        if let Some(playbin) = self.playbin.take() {
            log::debug!("Shutting down playbin");
            let _ = playbin.set_state(gst::State::Null);
        }
        if let Some(surface) = &self.surface {
            surface.clear();
        }
    }
}

fn build_playbin() -> Result<gst::Element, PipelineError> {
    gst::ElementFactory::make("playbin")
        .name("playbin")
        .build()
        .map_err(|e| PipelineError::CreationFailed(e.to_string()))
}

fn video_sink(surface: OutputSurface) -> gst::Element {
    let caps = gst_video::VideoCapsBuilder::new()
        .format(gst_video::VideoFormat::Rgba)
        .build();

    let appsink = gst_app::AppSink::builder()
        .caps(&caps)
        .max_buffers(2)
        .drop(true)
        .build();

    appsink.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |sink| {
                let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                match sample_to_frame(&sample) {
                    Some(frame) => surface.present(frame),
                    None => log::debug!("Dropping unreadable video sample"),
                }
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );

    appsink.upcast()
}

/// Copies a sample into a tightly packed RGBA frame (row stride removed).
fn sample_to_frame(sample: &gst::Sample) -> Option<VideoFrame> {
    let buffer = sample.buffer()?;
    let info = gst_video::VideoInfo::from_caps(sample.caps()?).ok()?;
    let map = buffer.map_readable().ok()?;

    let width = info.width();
    let height = info.height();
    let stride = usize::try_from(*info.stride().first()?).ok()?;
    let row = width as usize * 4;
    if stride < row {
        return None;
    }

    let mut rgba = Vec::with_capacity(row * height as usize);
    for line in map.as_slice().chunks(stride).take(height as usize) {
        rgba.extend_from_slice(line.get(..row)?);
    }

    Some(VideoFrame {
        width,
        height,
        rgba,
        timestamp: buffer.pts().map(|t| Duration::from_nanos(t.nseconds())),
    })
}

fn gst_state(state: EngineState) -> gst::State {
    match state {
        EngineState::Null => gst::State::Null,
        EngineState::Ready => gst::State::Ready,
        EngineState::Paused => gst::State::Paused,
        EngineState::Playing => gst::State::Playing,
    }
}

fn engine_state(state: gst::State) -> EngineState {
    match state {
        gst::State::Ready => EngineState::Ready,
        gst::State::Paused => EngineState::Paused,
        gst::State::Playing => EngineState::Playing,
        _ => EngineState::Null,
    }
}

fn formatted_time(value: gst::GenericFormattedValue) -> Option<Duration> {
    match value {
        gst::GenericFormattedValue::Time(Some(t)) => Some(Duration::from_nanos(t.nseconds())),
        _ => None,
    }
}
