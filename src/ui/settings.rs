use crate::action::open_log_dir;
use crate::hotkey::parse_hotkey;
use crate::settings::{AppSettings, PromptTemplate};
use egui::{CollapsingHeader, Color32, Id, RichText};
use log::{error, info};

pub enum SettingsAction {
    None,
    Save(AppSettings),
    Cancel,
}

/// Edits a copy of the settings; nothing is applied until Save.
pub struct SettingsDialog {
    draft: AppSettings,
    show_api_key: bool,
    prompt_editor: Option<PromptEditor>,
    error: Option<String>,
}

struct PromptEditor {
    original: Option<String>,
    name: String,
    text: String,
    error: Option<String>,
}

enum PromptEdit {
    Add,
    Edit(PromptTemplate),
    Delete(String),
}

impl SettingsDialog {
    pub fn new(settings: &AppSettings) -> Self {
        info!("Settings window opened");
        Self {
            draft: settings.clone(),
            show_api_key: false,
            prompt_editor: None,
            error: None,
        }
    }

    pub fn show(&mut self, ctx: &egui::Context) -> SettingsAction {
        let mut open = true;
        let mut action = SettingsAction::None;

        egui::Window::new("Settings")
            .id(Id::new("settings_window"))
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                self.show_api_settings(ui);
                ui.separator();
                self.show_capture_settings(ui);
                self.show_prompt_config(ui);
                self.show_debug_config(ui);

                if let Some(error) = &self.error {
                    ui.label(RichText::new(error).color(Color32::RED));
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        action = self.validate();
                    }
                    if ui.button("Cancel").clicked() {
                        action = SettingsAction::Cancel;
                    }
                });
            });

        self.show_prompt_editor(ctx);

        if !open {
            return SettingsAction::Cancel;
        }
        action
    }

    fn validate(&mut self) -> SettingsAction {
        if let Err(err) = parse_hotkey(&self.draft.hotkey) {
            self.error = Some(err.to_string());
            return SettingsAction::None;
        }
        self.error = None;
        SettingsAction::Save(self.draft.clone())
    }

    fn show_api_settings(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("API Key:");
            ui.add(
                egui::TextEdit::singleline(&mut self.draft.api_key)
                    .password(!self.show_api_key)
                    .desired_width(260.0),
            );
            ui.checkbox(&mut self.show_api_key, "Show");
        });

        ui.horizontal(|ui| {
            ui.label("Model:");
            ui.text_edit_singleline(&mut self.draft.model);
        });
    }

    fn show_capture_settings(&mut self, ui: &mut egui::Ui) {
        ui.checkbox(
            &mut self.draft.enable_double_check,
            "Double Check (review text before copying)",
        );

        ui.horizontal(|ui| {
            ui.label("Hotkey:");
            ui.text_edit_singleline(&mut self.draft.hotkey);
            if parse_hotkey(&self.draft.hotkey).is_ok() {
                ui.label(RichText::from("\u{2714}").color(Color32::GREEN));
            } else {
                ui.label(RichText::from("\u{2716}").color(Color32::RED));
            }
        });
    }

    fn show_prompt_config(&mut self, ui: &mut egui::Ui) {
        let mut edit = None;

        CollapsingHeader::new("Prompt Templates").show(ui, |ui| {
            ui.radio_value(&mut self.draft.selected_prompt, None, "First template");

            for prompt in &self.draft.prompts {
                ui.horizontal(|ui| {
                    ui.radio_value(
                        &mut self.draft.selected_prompt,
                        Some(prompt.name.clone()),
                        &prompt.name,
                    );
                    if ui.small_button("Edit").clicked() {
                        edit = Some(PromptEdit::Edit(prompt.clone()));
                    }
                    if ui.small_button("Delete").clicked() {
                        edit = Some(PromptEdit::Delete(prompt.name.clone()));
                    }
                });
            }

            if ui.button("Add Prompt").clicked() {
                edit = Some(PromptEdit::Add);
            }
        });

        match edit {
            Some(PromptEdit::Add) => self.prompt_editor = Some(PromptEditor::new(None)),
            Some(PromptEdit::Edit(prompt)) => {
                self.prompt_editor = Some(PromptEditor::new(Some(prompt)));
            }
            Some(PromptEdit::Delete(name)) => {
                if let Err(err) = self.draft.remove_prompt(&name) {
                    error!("Failed to delete prompt: {err}");
                }
            }
            None => {}
        }
    }

    fn show_prompt_editor(&mut self, ctx: &egui::Context) {
        let Some(editor) = &mut self.prompt_editor else {
            return;
        };

        let mut open = true;
        let mut finished = false;
        egui::Window::new("Prompt")
            .id(Id::new("prompt_editor_window"))
            .open(&mut open)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Name:");
                    ui.text_edit_singleline(&mut editor.name);
                });
                ui.label("Prompt:");
                ui.add(
                    egui::TextEdit::multiline(&mut editor.text)
                        .desired_rows(8)
                        .desired_width(360.0),
                );

                if let Some(error) = &editor.error {
                    ui.label(RichText::new(error).color(Color32::RED));
                }

                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        let result = match &editor.original {
                            Some(old) => self.draft.update_prompt(old, &editor.name, &editor.text),
                            None => self.draft.add_prompt(&editor.name, &editor.text),
                        };
                        match result {
                            Ok(()) => finished = true,
                            Err(err) => editor.error = Some(err.to_string()),
                        }
                    }
                    if ui.button("Cancel").clicked() {
                        finished = true;
                    }
                });
            });

        if finished || !open {
            self.prompt_editor = None;
        }
    }

    fn show_debug_config(&mut self, ui: &mut egui::Ui) {
        CollapsingHeader::new("Debug").show(ui, |ui| {
            if ui.button("Open Log Folder").clicked()
                && let Err(err) = open_log_dir()
            {
                error!("Failed to open log folder: {err:#}");
            }
        });
    }
}

impl PromptEditor {
    fn new(prompt: Option<PromptTemplate>) -> Self {
        match prompt {
            Some(prompt) => Self {
                original: Some(prompt.name.clone()),
                name: prompt.name,
                text: prompt.text,
                error: None,
            },
            None => Self {
                original: None,
                name: String::new(),
                text: String::new(),
                error: None,
            },
        }
    }
}
