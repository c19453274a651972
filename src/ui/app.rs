use super::event::{Event, EventHandler};
use super::overlay::{OverlayOutcome, SelectionOverlay};
use super::results::{ResultsAction, ResultsWindow};
use super::settings::{SettingsAction, SettingsDialog};
use super::shutdown::{running_ocr_tasks, shutdown_tasks};
use super::toast::{Toast, Toasts};
use crate::action::{capture_and_recognize, copy_to_clipboard, open_log_dir};
use crate::capture::CaptureRequest;
use crate::hotkey::{CaptureHotkey, forward_presses};
use crate::ocr::GeminiClient;
use crate::settings::{AppSettings, settings_path};
use crate::tray::TrayIcon;
use anyhow::Result;
use egui::{Color32, Context, RichText, Spinner, ViewportCommand};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Time for the compositor to take the overlay off screen before grabbing.
const CAPTURE_DELAY: Duration = Duration::from_millis(150);

struct PendingCapture {
    request: CaptureRequest,
    at: Instant,
}

pub struct ScreenOcrApp {
    settings: AppSettings,
    settings_path: PathBuf,
    client: Option<GeminiClient>,
    hotkey: Option<CaptureHotkey>,
    tray: Option<TrayIcon>,
    quitting: bool,
    raise_requested: bool,

    overlay: Option<SelectionOverlay>,
    pending_capture: Option<PendingCapture>,

    settings_dialog: Option<SettingsDialog>,
    results: Option<ResultsWindow>,
    toasts: Toasts,
}

impl ScreenOcrApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = settings_path();
        let settings = AppSettings::load(&settings_path);
        let mut app = Self::with_settings(settings, settings_path);

        let ctx = cc.egui_ctx.clone();
        forward_presses(move |id| ctx.emit(Event::HotkeyPressed(id)));
        let hotkey = app.settings.hotkey.clone();
        if let Err(err) = app.register_hotkey(&hotkey) {
            error!("Hotkey registration failed: {err:#}");
            app.toast(Toast::error(format!("Hotkey registration failed: {err}")));
        }

        let ctx = cc.egui_ctx.clone();
        match TrayIcon::install(move |command| ctx.emit(Event::Tray(command))) {
            Ok(tray) => app.tray = Some(tray),
            Err(err) => info!("Running without tray icon: {err:#}"),
        }

        if !app.settings.has_api_key() {
            warn!("API key not found. Please set up your API key in settings.");
            app.open_settings();
        } else if app.tray.is_some() {
            cc.egui_ctx.send_viewport_cmd(ViewportCommand::Minimized(true));
        }

        info!("ScreenOCR started successfully");
        app
    }

    fn with_settings(settings: AppSettings, settings_path: PathBuf) -> Self {
        let mut app = Self {
            client: None,
            hotkey: None,
            tray: None,
            quitting: false,
            raise_requested: false,
            overlay: None,
            pending_capture: None,
            settings_dialog: None,
            results: None,
            toasts: Toasts::default(),
            settings,
            settings_path,
        };
        app.rebuild_client();
        app
    }

    /// Makes `value` the active hotkey. On failure the previous hotkey, if
    /// any, stays registered.
    fn register_hotkey(&mut self, value: &str) -> Result<()> {
        match self.hotkey.as_mut() {
            Some(hotkey) => hotkey.update(value),
            None => {
                self.hotkey = Some(CaptureHotkey::register(value)?);
                Ok(())
            }
        }
    }

    fn rebuild_client(&mut self) {
        self.client = None;
        if !self.settings.has_api_key() {
            return;
        }

        match GeminiClient::new(&self.settings.api_key, &self.settings.model) {
            Ok(client) => self.client = Some(client),
            Err(err) => error!("Could not create OCR client: {err:#}"),
        }
    }

    pub(crate) fn is_capture_hotkey(&self, id: u32) -> bool {
        self.hotkey.as_ref().is_some_and(|hotkey| hotkey.is_trigger(id))
    }

    pub(crate) fn toast(&mut self, toast: Toast) {
        self.toasts.push(toast);
        self.raise_requested = true;
    }

    /// Brings the main window to the front on the next frame.
    pub(crate) fn request_raise(&mut self) {
        self.raise_requested = true;
    }

    pub(crate) fn quit(&mut self, ctx: &Context) {
        info!("Exit requested");
        self.quitting = true;
        ctx.send_viewport_cmd(ViewportCommand::Close);
    }

    pub(crate) fn start_capture(&mut self) {
        if self.client.is_none() {
            warn!("API key not set. Opening settings window.");
            self.toast(Toast::error("Please set your API key first."));
            self.open_settings();
            return;
        }
        if self.overlay.is_some() || self.pending_capture.is_some() {
            return;
        }

        info!("Showing screenshot overlay");
        self.overlay = Some(SelectionOverlay::default());
    }

    pub(crate) fn show_ocr_result(&mut self, text: String) {
        if self.settings.enable_double_check {
            self.results = Some(ResultsWindow::new(text));
            self.request_raise();
            return;
        }

        self.copy_text(&text);
    }

    pub(crate) fn show_ocr_error(&mut self, err: &str) {
        error!("Error processing screenshot: {err}");
        self.toast(Toast::error(format!("Error processing screenshot: {err}")));
    }

    fn copy_text(&mut self, text: &str) {
        match copy_to_clipboard(text) {
            Ok(()) => self.toast(Toast::info("Text copied to clipboard!")),
            Err(err) => {
                error!("Error copying to clipboard: {err:#}");
                self.toast(Toast::error(format!("Error copying to clipboard: {err}")));
            }
        }
    }

    pub(crate) fn open_settings(&mut self) {
        if self.settings_dialog.is_none() {
            self.settings_dialog = Some(SettingsDialog::new(&self.settings));
        }
    }

    fn apply_settings(&mut self, mut settings: AppSettings) {
        if settings.hotkey != self.settings.hotkey
            && let Err(err) = self.register_hotkey(&settings.hotkey)
        {
            error!("Hotkey registration failed, keeping {}: {err:#}", self.settings.hotkey);
            self.toast(Toast::error(format!(
                "Hotkey registration failed, keeping {}: {err}",
                self.settings.hotkey
            )));
            settings.hotkey = self.settings.hotkey.clone();
        }
        self.settings = settings;

        match self.settings.save(&self.settings_path) {
            Ok(()) => self.toast(Toast::info("Settings saved")),
            Err(err) => {
                error!("Error saving settings: {err:#}");
                self.toast(Toast::error(format!("Error saving settings: {err}")));
            }
        }

        self.rebuild_client();
    }

    fn show_overlay(&mut self, ctx: &Context) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };

        let outcome = ctx.show_viewport_immediate(
            SelectionOverlay::viewport_id(),
            SelectionOverlay::viewport_builder(),
            |ctx, _class| overlay.show(ctx),
        );

        match outcome {
            OverlayOutcome::Pending => {}
            OverlayOutcome::Cancelled => self.overlay = None,
            OverlayOutcome::Selected(request) => {
                self.overlay = None;
                self.pending_capture = Some(PendingCapture {
                    request,
                    at: Instant::now() + CAPTURE_DELAY,
                });
                ctx.request_repaint_after(CAPTURE_DELAY);
            }
        }
    }

    fn check_pending_capture(&mut self, ctx: &Context) {
        let now = Instant::now();
        let Some(pending) = self.pending_capture.take_if(|pending| pending.at <= now) else {
            if let Some(pending) = &self.pending_capture {
                ctx.request_repaint_after(pending.at - now);
            }
            return;
        };
        let Some(client) = self.client.clone() else {
            warn!("OCR client went away before the capture, dropping selection");
            return;
        };

        let prompt = self.settings.active_prompt().to_string();
        if let Err(err) = capture_and_recognize(ctx, &pending.request, client, prompt) {
            error!("Error capturing screenshot: {err:#}");
            self.toast(Toast::error(format!("Error capturing screenshot: {err}")));
        }
    }

    fn handle_close(&mut self, ctx: &Context) {
        if self.tray.is_some() && !self.quitting {
            info!("Minimizing to tray");
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
            ctx.send_viewport_cmd(ViewportCommand::Minimized(true));
            return;
        }

        info!("ScreenOCR shutting down");
        let running = shutdown_tasks();
        if running > 0 {
            info!("Discarding results of {running} unfinished OCR request(s)");
        }
    }

    fn show_dialogs(&mut self, ctx: &Context) {
        if let Some(dialog) = self.settings_dialog.as_mut() {
            match dialog.show(ctx) {
                SettingsAction::None => {}
                SettingsAction::Cancel => self.settings_dialog = None,
                SettingsAction::Save(settings) => {
                    self.settings_dialog = None;
                    self.apply_settings(settings);
                }
            }
        }

        if let Some(results) = self.results.as_mut() {
            match results.show(ctx) {
                ResultsAction::None => {}
                ResultsAction::Copy(text) => self.copy_text(&text),
                ResultsAction::Close => self.results = None,
            }
        }
    }

    fn show_main_panel(&mut self, ctx: &Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Screen OCR");

            let hotkey = self
                .hotkey
                .as_ref()
                .map_or_else(|| "not registered".to_string(), CaptureHotkey::label);
            ui.label(format!("Hotkey: {hotkey}"));

            ui.horizontal(|ui| {
                ui.label("API key:");
                if self.settings.has_api_key() {
                    ui.label(RichText::from("\u{2714}").color(Color32::GREEN));
                } else {
                    ui.label(RichText::from("\u{2716}").color(Color32::RED));
                }
            });

            let running = running_ocr_tasks();
            if running > 0 {
                ui.horizontal(|ui| {
                    ui.add(Spinner::new());
                    ui.label(format!("Recognizing text... ({running} running)"));
                });
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Capture").clicked() {
                    ctx.emit(Event::StartCapture);
                }
                if ui.button("Settings").clicked() {
                    self.open_settings();
                }
                if ui.button("Open Log Folder").clicked()
                    && let Err(err) = open_log_dir()
                {
                    error!("Failed to open log folder: {err:#}");
                }
                if ui.button("Quit").clicked() {
                    self.quit(ctx);
                }
            });
        });
    }
}

impl eframe::App for ScreenOcrApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        ctx.update_state(self);

        if ctx.input(|i| i.viewport().close_requested()) {
            self.handle_close(ctx);
        }
        if std::mem::take(&mut self.raise_requested) {
            ctx.send_viewport_cmd(ViewportCommand::Minimized(false));
            ctx.send_viewport_cmd(ViewportCommand::Focus);
        }

        self.show_overlay(ctx);
        self.check_pending_capture(ctx);

        self.show_main_panel(ctx);
        self.show_dialogs(ctx);
        self.toasts.show(ctx);
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        Color32::TRANSPARENT.to_normalized_gamma_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_HOTKEY;
    use crate::tray::TrayCommand;

    fn app(name: &str) -> ScreenOcrApp {
        let dir = std::env::temp_dir().join(format!("screen_ocr_app_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        ScreenOcrApp::with_settings(AppSettings::default(), dir.join(name))
    }

    #[test]
    fn double_checked_result_opens_window_in_front() {
        let mut app = app("result.json");
        app.settings.enable_double_check = true;

        app.show_ocr_result("recognized".to_string());

        assert!(app.results.is_some());
        assert!(app.raise_requested);
    }

    #[test]
    fn ocr_error_brings_window_forward() {
        let mut app = app("error.json");

        app.show_ocr_error("timeout");

        assert!(app.raise_requested);
        assert!(app.results.is_none());
    }

    #[test]
    fn rejected_hotkey_is_not_persisted() {
        let mut app = app("hotkey.json");
        let mut draft = app.settings.clone();
        draft.hotkey = "ctrl+nonsense".to_string();
        draft.model = "other-model".to_string();

        app.apply_settings(draft);

        assert_eq!(app.settings.hotkey, DEFAULT_HOTKEY);
        assert_eq!(app.settings.model, "other-model");

        let saved = AppSettings::load(&app.settings_path);
        assert_eq!(saved.hotkey, DEFAULT_HOTKEY);
        assert_eq!(saved.model, "other-model");
    }

    #[test]
    fn tray_menu_opens_settings_and_exits() {
        let ctx = Context::default();
        let mut app = app("tray.json");

        ctx.handle_event(&mut app, Event::Tray(TrayCommand::Settings));
        assert!(app.settings_dialog.is_some());
        assert!(app.raise_requested);

        ctx.handle_event(&mut app, Event::Tray(TrayCommand::Exit));
        assert!(app.quitting);
    }
}
