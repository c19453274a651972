use crate::capture::{CaptureRequest, capture_region};
use crate::ocr::GeminiClient;
use crate::ui::event::{Event, EventHandler};
use crate::ui::shutdown::TASK_TRACKER;
use anyhow::{Context, Result, bail};
use egui::Context as UiContext;
use log::info;
use std::fs;
use std::time::Instant;

pub const LOG_DIR: &str = "logs";

pub fn open_log_dir() -> Result<()> {
    fs::create_dir_all(LOG_DIR).context("could not create log directory")?;
    open::that(LOG_DIR).context("could not open log directory")
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("could not copy text to clipboard")?;
    info!("Text copied to clipboard");
    Ok(())
}

/// Grabs the selected region and hands it to the OCR client in the
/// background. The outcome arrives as [`Event::OcrFinished`].
pub fn capture_and_recognize(
    ctx: &UiContext,
    request: &CaptureRequest,
    client: GeminiClient,
    prompt: String,
) -> Result<()> {
    if TASK_TRACKER.is_closed() {
        bail!("shutting down, OCR request not started");
    }
    let image = capture_region(request)?;

    let ctx = ctx.clone();
    TASK_TRACKER.spawn(async move {
        let now = Instant::now();
        info!("Start ocr");

        let result = client
            .extract_text(&image, &prompt)
            .await
            .map_err(|err| format!("{err:#}"));

        info!("End ocr elapsed: {:.2?}", now.elapsed());
        ctx.emit(Event::OcrFinished(result));
    });

    Ok(())
}
