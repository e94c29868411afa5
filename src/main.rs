use eframe::egui;
use multi_player::core::{source_uri, PlayerConfig};
use multi_player::gui::PlayerApp;
use multi_player::pipeline::playbin::PlaybinPipeline;
use multi_player::pipeline::OutputSurface;
use multi_player::player::{PlaybackController, PlayerCommand};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = PlayerConfig::load()?;
    let source = std::env::args().nth(1).map(|arg| source_uri(&arg)).transpose()?;

    let pipeline = PlaybinPipeline::new()?;
    let (surface, frames) = OutputSurface::new();
    let mut controller = PlaybackController::new(pipeline, surface, &config);

    if let Some(uri) = source {
        if let Err(e) = controller.dispatch(PlayerCommand::Open(uri.clone())) {
            log::error!("Failed to start {}: {}", uri, e);
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([400.0, 300.0])
            .with_title("MultiPlayer"),
        ..Default::default()
    };

    eframe::run_native(
        "MultiPlayer",
        options,
        Box::new(move |cc| Ok(Box::new(PlayerApp::new(cc, controller, frames)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
