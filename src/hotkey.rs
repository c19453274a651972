use anyhow::{Context, Result, anyhow};
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use log::{debug, info};
use std::str::FromStr;

pub fn parse_hotkey(value: &str) -> Result<HotKey> {
    HotKey::from_str(value.trim()).map_err(|err| anyhow!("invalid hotkey '{value}': {err}"))
}

/// The capture hotkey, registered system-wide until dropped.
pub struct CaptureHotkey {
    manager: GlobalHotKeyManager,
    hotkey: HotKey,
}

impl CaptureHotkey {
    pub fn register(value: &str) -> Result<Self> {
        let hotkey = parse_hotkey(value)?;
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;

        manager
            .register(hotkey)
            .with_context(|| format!("Failed to register hotkey {}", hotkey.into_string()))?;

        info!("Hotkey {} registered", hotkey.into_string());
        Ok(Self { manager, hotkey })
    }

    /// Swaps in a new hotkey. The old one stays active if the new one is
    /// invalid or cannot be registered.
    pub fn update(&mut self, value: &str) -> Result<()> {
        let hotkey = parse_hotkey(value)?;
        if hotkey.id() == self.hotkey.id() {
            return Ok(());
        }

        self.manager
            .register(hotkey)
            .with_context(|| format!("Failed to register hotkey {}", hotkey.into_string()))?;
        if let Err(err) = self.manager.unregister(self.hotkey) {
            log::warn!("Failed to unregister hotkey: {err}");
        }

        info!(
            "Hotkey changed from {} to {}",
            self.hotkey.into_string(),
            hotkey.into_string()
        );
        self.hotkey = hotkey;
        Ok(())
    }

    pub fn label(&self) -> String {
        self.hotkey.into_string()
    }

    pub fn is_trigger(&self, id: u32) -> bool {
        self.hotkey.id() == id
    }
}

/// Routes pressed hotkeys to `on_pressed` as soon as the OS reports them,
/// so an idle window does not have to poll.
pub fn forward_presses<F>(on_pressed: F)
where
    F: Fn(u32) + Send + Sync + 'static,
{
    GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
        if event.state == HotKeyState::Pressed {
            debug!("Hotkey {} triggered", event.id);
            on_pressed(event.id);
        }
    }));
}

impl Drop for CaptureHotkey {
    fn drop(&mut self) {
        let _ = self.manager.unregister(self.hotkey);
        info!("Hotkey {} unregistered", self.hotkey.into_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_HOTKEY;
    use global_hotkey::hotkey::{Code, Modifiers};

    #[test]
    fn default_hotkey_is_ctrl_shift_t() {
        let hotkey = parse_hotkey(DEFAULT_HOTKEY).unwrap();
        assert_eq!(
            hotkey,
            HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyT)
        );
    }

    #[test]
    fn invalid_hotkey_is_rejected() {
        assert!(parse_hotkey("ctrl+shift+").is_err());
        assert!(parse_hotkey("nonsense").is_err());
    }
}
