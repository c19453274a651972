use crate::tray::TrayCommand;
use crate::ui::app::ScreenOcrApp;
use egui::{Context, Id};
use std::sync::LazyLock;

#[derive(Debug, Clone)]
pub enum Event {
    HotkeyPressed(u32),
    StartCapture,
    OcrFinished(Result<String, String>),
    Tray(TrayCommand),
}

pub trait EventHandler {
    fn emit(&self, value: Event);

    fn get_events(&self) -> Vec<Event>;

    fn update_state(&self, state: &mut ScreenOcrApp) {
        let events = self.get_events();

        for x in events {
            self.handle_event(state, x);
        }
    }

    fn handle_event(&self, state: &mut ScreenOcrApp, event: Event);
}

static EVENT_LIST_ID: LazyLock<Id> = LazyLock::new(|| Id::new("EVENT_LIST"));

impl EventHandler for Context {
    fn emit(&self, value: Event) {
        self.data_mut(|x| {
            x.get_temp_mut_or_insert_with(*EVENT_LIST_ID, Vec::new)
                .push(value);
        });
        self.request_repaint();
    }

    fn get_events(&self) -> Vec<Event> {
        self.data_mut(|x| x.remove_temp(*EVENT_LIST_ID).unwrap_or_default())
    }

    fn handle_event(&self, state: &mut ScreenOcrApp, event: Event) {
        match event {
            Event::HotkeyPressed(id) => {
                if state.is_capture_hotkey(id) {
                    state.start_capture();
                }
            }
            Event::StartCapture => state.start_capture(),
            Event::OcrFinished(Ok(text)) => state.show_ocr_result(text),
            Event::OcrFinished(Err(err)) => state.show_ocr_error(&err),
            Event::Tray(TrayCommand::Show) => state.request_raise(),
            Event::Tray(TrayCommand::Capture) => state.start_capture(),
            Event::Tray(TrayCommand::Settings) => {
                state.open_settings();
                state.request_raise();
            }
            Event::Tray(TrayCommand::Exit) => state.quit(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_drained_in_order() {
        let ctx = Context::default();

        ctx.emit(Event::StartCapture);
        ctx.emit(Event::OcrFinished(Ok("text".to_string())));

        let events = ctx.get_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::StartCapture));
        assert!(matches!(&events[1], Event::OcrFinished(Ok(text)) if text == "text"));
        assert!(ctx.get_events().is_empty());
    }

    #[test]
    fn emit_works_from_other_threads() {
        let ctx = Context::default();

        let remote = ctx.clone();
        std::thread::spawn(move || remote.emit(Event::HotkeyPressed(7)))
            .join()
            .unwrap();

        let events = ctx.get_events();
        assert!(matches!(events.as_slice(), [Event::HotkeyPressed(7)]));
    }
}
