use eframe::egui;
use std::time::{Duration, Instant};

use crate::core::{source_uri, PlayState};
use crate::pipeline::{FrameReceiver, PipelineError, PipelineFacade, VideoFrame};
use crate::player::{PlaybackController, PlayerCommand, SurfaceView};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "ogv", "flv", "ts"];

/// Modal "Tips" box shown when a command could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDialog {
    pub message: String,
}

pub struct PlayerApp<P: PipelineFacade> {
    pub controller: PlaybackController<P>,
    pub frames: FrameReceiver,
    pub texture: Option<egui::TextureHandle>,
    pub show_streams: bool,
    pub error_dialog: Option<ErrorDialog>,
}

impl<P: PipelineFacade> PlayerApp<P> {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        controller: PlaybackController<P>,
        frames: FrameReceiver,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        Self {
            controller,
            frames,
            texture: None,
            show_streams: false,
            error_dialog: None,
        }
    }

    /// Runs a command and turns a failure into the error dialog.
    pub fn run(&mut self, command: PlayerCommand) {
        let pausing = match command {
            PlayerCommand::Pause => true,
            PlayerCommand::TogglePlayback => {
                self.controller.session().state() == PlayState::Playing
            }
            _ => false,
        };
        let failure_text = match command {
            _ if pausing => "Failed to pause!",
            PlayerCommand::Stop => "Failed to stop!",
            _ => "Failed to render video!",
        };
        let opening = matches!(command, PlayerCommand::Open(_));

        if let Err(err) = self.controller.dispatch(command) {
            self.report_failure(failure_text, &err);
        }
        if opening && self.show_streams {
            self.controller.request_stream_report();
        }
    }

    fn report_failure(&mut self, text: &str, err: &PipelineError) {
        log::error!("{}: {} ({:?})", text, err, err.severity());
        self.error_dialog = Some(ErrorDialog {
            message: text.to_string(),
        });
    }

    pub fn open_file_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Please choose video file")
            .add_filter("Video", VIDEO_EXTENSIONS)
            .pick_file();

        let Some(path) = picked else {
            return;
        };
        match source_uri(&path.to_string_lossy()) {
            Ok(uri) => self.run(PlayerCommand::Open(uri)),
            Err(e) => {
                log::error!("Cannot open {}: {}", path.display(), e);
                self.error_dialog = Some(ErrorDialog {
                    message: format!("Cannot open {}", path.display()),
                });
            }
        }
    }

    pub fn toggle_stream_window(&mut self) {
        self.show_streams = !self.show_streams;
        if self.show_streams {
            self.controller.refresh_stream_report();
            // Counts may still be zero before preroll
            if self.controller.session().duration().is_none() {
                self.controller.request_stream_report();
            }
        }
    }

    /// Uploads the newest frame, if the engine produced one since last time.
    fn receive_frame(&mut self, ctx: &egui::Context) {
        if !self.frames.has_changed().unwrap_or(false) {
            return;
        }
        let frame = self.frames.borrow_and_update().clone();

        match frame.as_deref().and_then(frame_image) {
            Some(image) => match &mut self.texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.texture =
                        Some(ctx.load_texture("video_frame", image, egui::TextureOptions::LINEAR))
                }
            },
            None => self.texture = None,
        }
    }

    fn show_video(&self, ui: &mut egui::Ui) {
        let available = ui.available_rect_before_wrap();
        let texture = match self.controller.presentation().view {
            SurfaceView::Video => self.texture.as_ref(),
            SurfaceView::Placeholder => None,
        };

        ui.painter().rect_filled(available, 0.0, egui::Color32::BLACK);
        if let Some(texture) = texture {
            let size = fit_within(texture.size_vec2(), available.size());
            let rect = egui::Rect::from_center_size(available.center(), size);
            ui.painter().image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        ui.allocate_rect(available, egui::Sense::hover());
    }

    fn show_position_bar(&mut self, ui: &mut egui::Ui) {
        let presentation = self.controller.presentation();
        let mut value = presentation.slider_value;
        let max = presentation.slider_max.unwrap_or(0);
        let enabled = presentation.slider_max.is_some();
        let time_text = presentation.time_text.clone();

        ui.horizontal(|ui| {
            ui.spacing_mut().slider_width = (ui.available_width() - 140.0).max(100.0);
            let response = ui.add_enabled(
                enabled,
                egui::Slider::new(&mut value, 0..=max).show_value(false),
            );

            if response.drag_started() {
                self.controller.begin_drag();
            }
            if self.controller.is_dragging() && response.changed() {
                self.controller.drag_to(value);
            }
            if response.drag_stopped() {
                if let Err(err) = self.controller.end_drag() {
                    log::warn!("Seek failed: {}", err);
                }
            } else if response.changed() && !self.controller.is_dragging() {
                // Plain click on the track
                self.run(PlayerCommand::SeekTo(value as f64));
            }

            ui.monospace(time_text);
        });
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        let presentation = self.controller.presentation();
        let button = presentation.button;
        let muted = presentation.muted;
        let mut volume = presentation.volume_control;
        let has_source = self.controller.session().uri().is_some();

        ui.horizontal(|ui| {
            if ui.button("📁 Open").clicked() {
                self.open_file_dialog();
            }
            if ui
                .add_enabled(has_source, egui::Button::new(button.text()))
                .clicked()
            {
                self.run(PlayerCommand::TogglePlayback);
            }
            if ui
                .add_enabled(has_source, egui::Button::new("⏹ Stop"))
                .clicked()
            {
                self.run(PlayerCommand::Stop);
            }

            ui.separator();

            if ui.button(if muted { "🔇 Unmute" } else { "🔊 Mute" }).clicked() {
                self.run(PlayerCommand::ToggleMute);
            }
            if ui
                .add(egui::Slider::new(&mut volume, 0..=100).text("Volume"))
                .changed()
            {
                self.run(PlayerCommand::SetVolume(volume as i64));
            }

            ui.separator();

            if ui
                .add_enabled(has_source, egui::Button::new("ℹ Streams"))
                .clicked()
            {
                self.toggle_stream_window();
            }
        });
    }

    fn show_stream_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_streams;
        egui::Window::new("Streams")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| match self.controller.stream_report() {
                Some(report) if !report.is_empty() => {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.monospace(report.to_string());
                    });
                }
                _ => {
                    ui.label("No stream information available");
                }
            });
        self.show_streams = open;
    }

    fn show_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.error_dialog else {
            return;
        };
        let mut dismissed = false;

        egui::Window::new("Tips")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(&dialog.message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.error_dialog = None;
        }
    }
}

impl<P: PipelineFacade> eframe::App for PlayerApp<P> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.controller.on_frame(now);
        self.receive_frame(ctx);

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_position_bar(ui);
            self.show_controls(ui);
            ui.horizontal(|ui| {
                ui.label("Status:");
                ui.label(&self.controller.presentation().status);
                if let Some(uri) = self.controller.session().uri() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(uri);
                    });
                }
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.show_video(ui));

        if self.show_streams {
            self.show_stream_window(ctx);
        }
        self.show_error_dialog(ctx);

        // Frames arrive from the engine thread while playing
        if self.controller.session().state() == PlayState::Playing {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else if let Some(wait) = self.controller.time_until_next_tick(now) {
            ctx.request_repaint_after(wait);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("Window closed, shutting down player");
        self.run(PlayerCommand::Close);
    }
}

/// Largest size with the frame's aspect ratio that fits in `bounds`.
pub fn fit_within(frame: egui::Vec2, bounds: egui::Vec2) -> egui::Vec2 {
    if frame.x <= 0.0 || frame.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (bounds.x / frame.x).min(bounds.y / frame.y);
    frame * scale
}

/// `None` for frames whose buffer does not match their dimensions.
pub fn frame_image(frame: &VideoFrame) -> Option<egui::ColorImage> {
    if !frame.is_complete() {
        log::warn!(
            "Invalid frame data size: expected {}, got {}",
            frame.width as usize * frame.height as usize * 4,
            frame.rgba.len()
        );
        return None;
    }
    Some(egui::ColorImage::from_rgba_unmultiplied(
        [frame.width as usize, frame.height as usize],
        &frame.rgba,
    ))
}
