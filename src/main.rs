mod app;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "TikZ Sketch",
        native_options,
        Box::new(|cc| Ok(Box::new(app::SketchApp::new(cc)))),
    )
}
