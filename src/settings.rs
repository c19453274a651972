use crate::ocr::{DEFAULT_MODEL, DEFAULT_PROMPT};
use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = "config";
pub const CONFIG_DIR_ENV: &str = "SCREEN_OCR_CONFIG_DIR";
const SETTINGS_FILENAME: &str = "settings.json";

pub const DEFAULT_HOTKEY: &str = "ctrl+shift+KeyT";
pub const DEFAULT_PROMPT_NAME: &str = "Default OCR";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: String,
    pub text: String,
}

impl PromptTemplate {
    /// Trims both fields and rejects blank ones.
    pub fn new(name: &str, text: &str) -> Result<Self> {
        let (name, text) = (name.trim(), text.trim());
        if name.is_empty() {
            bail!("Please enter a name for the prompt.");
        }
        if text.is_empty() {
            bail!("Please enter text for the prompt.");
        }
        Ok(Self {
            name: name.to_string(),
            text: text.to_string(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    #[serde(alias = "ApiKey")]
    pub api_key: String,
    pub enable_double_check: bool,
    pub hotkey: String,
    pub model: String,
    pub prompts: Vec<PromptTemplate>,
    pub selected_prompt: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            enable_double_check: true,
            hotkey: DEFAULT_HOTKEY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompts: vec![PromptTemplate {
                name: DEFAULT_PROMPT_NAME.to_string(),
                text: DEFAULT_PROMPT.to_string(),
            }],
            selected_prompt: None,
        }
    }
}

pub fn config_dir() -> PathBuf {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(CONFIG_DIR),
    }
}

pub fn settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILENAME)
}

impl AppSettings {
    /// Reads the settings file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load(path: &Path) -> Self {
        debug!("Loading settings from {}", path.display());
        if !path.exists() {
            info!(
                "Settings file {} does not exist, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::read(path) {
            Ok(settings) => {
                info!("Settings loaded from {}", path.display());
                settings
            }
            Err(err) => {
                warn!("Failed to load settings, using defaults: {err:#}");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("could not parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("could not write {}", path.display()))?;

        info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn active_prompt(&self) -> &str {
        self.selected_prompt
            .as_deref()
            .and_then(|name| self.find_prompt(name))
            .or_else(|| self.prompts.first())
            .map_or(DEFAULT_PROMPT, |prompt| prompt.text.as_str())
    }

    pub fn find_prompt(&self, name: &str) -> Option<&PromptTemplate> {
        self.prompts.iter().find(|p| p.name == name)
    }

    pub fn add_prompt(&mut self, name: &str, text: &str) -> Result<()> {
        let prompt = PromptTemplate::new(name, text)?;
        if self.find_prompt(&prompt.name).is_some() {
            bail!("A prompt named '{}' already exists.", prompt.name);
        }
        self.prompts.push(prompt);
        Ok(())
    }

    pub fn update_prompt(&mut self, old_name: &str, name: &str, text: &str) -> Result<()> {
        let prompt = PromptTemplate::new(name, text)?;
        if prompt.name != old_name && self.find_prompt(&prompt.name).is_some() {
            bail!("A prompt named '{}' already exists.", prompt.name);
        }

        let Some(index) = self.prompts.iter().position(|p| p.name == old_name) else {
            bail!("Prompt '{old_name}' not found.");
        };

        if self.selected_prompt.as_deref() == Some(old_name) {
            self.selected_prompt = Some(prompt.name.clone());
        }
        self.prompts[index] = prompt;
        Ok(())
    }

    pub fn remove_prompt(&mut self, name: &str) -> Result<PromptTemplate> {
        let Some(index) = self.prompts.iter().position(|p| p.name == name) else {
            bail!("Prompt '{name}' not found.");
        };

        if self.selected_prompt.as_deref() == Some(name) {
            self.selected_prompt = None;
        }
        Ok(self.prompts.remove(index))
    }

    pub fn select_prompt(&mut self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name
            && self.find_prompt(name).is_none()
        {
            bail!("Prompt '{name}' not found.");
        }
        self.selected_prompt = name.map(str::to_string);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("screen_ocr_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = temp_path("missing.json");
        let _ = fs::remove_file(&path);

        let settings = AppSettings::load(&path);

        assert_eq!(settings, AppSettings::default());
        assert!(!settings.has_api_key());
        assert!(settings.enable_double_check);
        assert_eq!(settings.hotkey, DEFAULT_HOTKEY);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let path = temp_path("corrupt.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(AppSettings::load(&path), AppSettings::default());
    }

    #[test]
    fn legacy_api_key_file_is_read() {
        let path = temp_path("legacy.json");
        fs::write(&path, r#"{ "ApiKey": "legacy-key" }"#).unwrap();

        let settings = AppSettings::load(&path);

        assert_eq!(settings.api_key, "legacy-key");
        assert!(settings.has_api_key());
        assert_eq!(settings.prompts, AppSettings::default().prompts);
    }

    #[test]
    fn saved_settings_load_back() {
        let path = temp_path("nested/saved.json");
        let _ = fs::remove_dir_all(path.parent().unwrap());

        let mut settings = AppSettings {
            api_key: "key".to_string(),
            enable_double_check: false,
            ..Default::default()
        };
        settings.add_prompt("Translate", "Translate to English").unwrap();
        settings.select_prompt(Some("Translate")).unwrap();
        settings.save(&path).unwrap();

        assert_eq!(AppSettings::load(&path), settings);
    }

    #[test]
    #[serial]
    fn config_dir_honours_env() {
        unsafe { std::env::set_var(CONFIG_DIR_ENV, "/tmp/screen_ocr_cfg") };
        assert_eq!(
            settings_path(),
            PathBuf::from("/tmp/screen_ocr_cfg").join("settings.json")
        );

        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };
        assert_eq!(settings_path(), PathBuf::from("config").join("settings.json"));
    }

    #[test]
    fn active_prompt_prefers_selection() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.active_prompt(), DEFAULT_PROMPT);

        settings.add_prompt("Short", "Just the text").unwrap();
        settings.select_prompt(Some("Short")).unwrap();
        assert_eq!(settings.active_prompt(), "Just the text");

        settings.prompts.clear();
        assert_eq!(settings.active_prompt(), DEFAULT_PROMPT);
    }

    #[test]
    fn prompts_are_validated_and_trimmed() {
        let mut settings = AppSettings::default();

        assert!(settings.add_prompt("  ", "text").is_err());
        assert!(settings.add_prompt("name", "\n ").is_err());
        assert!(settings.add_prompt(DEFAULT_PROMPT_NAME, "again").is_err());

        settings.add_prompt("  Code  ", "  Keep indentation  ").unwrap();
        assert_eq!(
            settings.find_prompt("Code"),
            Some(&PromptTemplate {
                name: "Code".to_string(),
                text: "Keep indentation".to_string(),
            })
        );
    }

    #[test]
    fn renaming_selected_prompt_keeps_selection() {
        let mut settings = AppSettings::default();
        settings.add_prompt("A", "first").unwrap();
        settings.select_prompt(Some("A")).unwrap();

        settings.update_prompt("A", "B", "second").unwrap();

        assert_eq!(settings.selected_prompt.as_deref(), Some("B"));
        assert_eq!(settings.active_prompt(), "second");
        assert!(settings.update_prompt("B", DEFAULT_PROMPT_NAME, "x").is_err());
        assert!(settings.update_prompt("missing", "C", "x").is_err());
    }

    #[test]
    fn removing_selected_prompt_clears_selection() {
        let mut settings = AppSettings::default();
        settings.add_prompt("A", "first").unwrap();
        settings.select_prompt(Some("A")).unwrap();

        let removed = settings.remove_prompt("A").unwrap();

        assert_eq!(removed.name, "A");
        assert_eq!(settings.selected_prompt, None);
        assert!(settings.remove_prompt("A").is_err());
        assert!(settings.select_prompt(Some("A")).is_err());
    }
}
