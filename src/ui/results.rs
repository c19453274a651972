use egui::{Context, Id};

pub enum ResultsAction {
    None,
    Copy(String),
    Close,
}

/// Lets the user review and edit recognized text before copying it.
pub struct ResultsWindow {
    text: String,
}

impl ResultsWindow {
    pub fn new(text: String) -> Self {
        log::info!("Results window displayed");
        Self { text }
    }

    pub fn show(&mut self, ctx: &Context) -> ResultsAction {
        let mut open = true;
        let mut action = ResultsAction::None;

        egui::Window::new("OCR Result")
            .id(Id::new("ocr_result_window"))
            .open(&mut open)
            .default_size([480.0, 320.0])
            .collapsible(false)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(ui.available_height() - 36.0)
                    .show(ui, |ui| {
                        ui.add(
                            egui::TextEdit::multiline(&mut self.text)
                                .desired_width(f32::INFINITY)
                                .desired_rows(12),
                        );
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Copy to Clipboard").clicked() {
                        action = ResultsAction::Copy(self.text.clone());
                    }
                    if ui.button("Close").clicked() {
                        action = ResultsAction::Close;
                    }
                });
            });

        if !open {
            return ResultsAction::Close;
        }
        action
    }
}
