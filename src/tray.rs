use anyhow::{Result, bail};
use log::info;
use std::sync::OnceLock;

const TOOLTIP: &str = "Screen OCR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    Show,
    Capture,
    Settings,
    Exit,
}

#[cfg_attr(not(windows), allow(dead_code))]
impl TrayCommand {
    fn menu_id(self) -> u16 {
        match self {
            TrayCommand::Show => 1000,
            TrayCommand::Capture => 1001,
            TrayCommand::Settings => 1002,
            TrayCommand::Exit => 1003,
        }
    }

    fn from_menu_id(id: u16) -> Option<Self> {
        [
            TrayCommand::Show,
            TrayCommand::Capture,
            TrayCommand::Settings,
            TrayCommand::Exit,
        ]
        .into_iter()
        .find(|command| command.menu_id() == id)
    }
}

type CommandHandler = Box<dyn Fn(TrayCommand) + Send + Sync>;

static HANDLER: OnceLock<CommandHandler> = OnceLock::new();

#[cfg_attr(not(windows), allow(dead_code))]
fn dispatch(command: TrayCommand) {
    info!("Tray command {command:?}");
    if let Some(handler) = HANDLER.get() {
        handler(command);
    }
}

/// Copies `text` into a fixed-size, NUL-terminated UTF-16 buffer, cutting it
/// short when it does not fit.
#[cfg_attr(not(windows), allow(dead_code))]
fn fill_wide(buffer: &mut [u16], text: &str) {
    let Some(capacity) = buffer.len().checked_sub(1) else {
        return;
    };
    let mut len = 0;
    for (slot, unit) in buffer.iter_mut().zip(text.encode_utf16().take(capacity)) {
        *slot = unit;
        len += 1;
    }
    buffer[len] = 0;
}

/// Notification-area icon. Left click shows the main window, right click
/// opens the Capture / Settings / Exit menu. Removed when dropped.
pub struct TrayIcon {
    _icon: platform::Icon,
}

impl TrayIcon {
    /// Adds the icon. Only one icon can exist per process.
    pub fn install<F>(on_command: F) -> Result<Self>
    where
        F: Fn(TrayCommand) + Send + Sync + 'static,
    {
        if HANDLER.set(Box::new(on_command)).is_err() {
            bail!("tray icon already installed");
        }

        let icon = platform::Icon::add(TOOLTIP)?;
        info!("Tray icon added");
        Ok(Self { _icon: icon })
    }
}

#[cfg(windows)]
mod platform {
    use super::{TrayCommand, dispatch, fill_wide};
    use anyhow::{Context, Result, bail};
    use log::{debug, warn};
    use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::Shell::{
        NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW, Shell_NotifyIconW,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
        GetCursorPos, IDI_APPLICATION, LoadIconW, MF_SEPARATOR, MF_STRING, RegisterClassW,
        SetForegroundWindow, TPM_BOTTOMALIGN, TPM_LEFTALIGN, TrackPopupMenuEx, WINDOW_EX_STYLE,
        WM_APP, WM_COMMAND, WM_LBUTTONUP, WM_RBUTTONUP, WNDCLASSW, WS_OVERLAPPED,
    };
    use windows::core::{PCWSTR, w};

    const WM_TRAY: u32 = WM_APP + 1;
    const TRAY_ID: u32 = 1;

    /// Hidden window receiving the icon's callbacks. It lives on the UI
    /// thread, so the window event loop dispatches its messages.
    pub struct Icon {
        hwnd: HWND,
    }

    impl Icon {
        pub fn add(tooltip: &str) -> Result<Self> {
            unsafe {
                let instance = GetModuleHandleW(None).context("GetModuleHandleW failed")?;
                let class = WNDCLASSW {
                    lpfnWndProc: Some(wndproc),
                    hInstance: instance.into(),
                    lpszClassName: w!("ScreenOcrTray"),
                    ..Default::default()
                };
                if RegisterClassW(&class) == 0 {
                    bail!("RegisterClassW failed for tray window");
                }

                let hwnd = CreateWindowExW(
                    WINDOW_EX_STYLE::default(),
                    w!("ScreenOcrTray"),
                    w!("Screen OCR"),
                    WS_OVERLAPPED,
                    0,
                    0,
                    0,
                    0,
                    None,
                    None,
                    Some(instance.into()),
                    None,
                )
                .context("CreateWindowExW failed for tray window")?;

                let mut data = notify_data(hwnd);
                data.uFlags = NIF_MESSAGE | NIF_ICON | NIF_TIP;
                data.uCallbackMessage = WM_TRAY;
                data.hIcon = LoadIconW(None, IDI_APPLICATION).context("LoadIconW failed")?;
                fill_wide(&mut data.szTip, tooltip);

                if !Shell_NotifyIconW(NIM_ADD, &data).as_bool() {
                    let _ = DestroyWindow(hwnd);
                    bail!("Shell_NotifyIconW refused the tray icon");
                }

                Ok(Self { hwnd })
            }
        }
    }

    impl Drop for Icon {
        fn drop(&mut self) {
            unsafe {
                let data = notify_data(self.hwnd);
                if !Shell_NotifyIconW(NIM_DELETE, &data).as_bool() {
                    warn!("Failed to remove tray icon");
                }
                if let Err(err) = DestroyWindow(self.hwnd) {
                    warn!("Failed to destroy tray window: {err}");
                }
            }
            debug!("Tray icon removed");
        }
    }

    fn notify_data(hwnd: HWND) -> NOTIFYICONDATAW {
        NOTIFYICONDATAW {
            cbSize: size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: TRAY_ID,
            ..Default::default()
        }
    }

    unsafe extern "system" fn wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_TRAY => {
                match (lparam.0 & 0xFFFF) as u32 {
                    WM_LBUTTONUP => dispatch(TrayCommand::Show),
                    WM_RBUTTONUP => unsafe { show_menu(hwnd) },
                    _ => {}
                }
                LRESULT(0)
            }
            WM_COMMAND => {
                if let Some(command) = TrayCommand::from_menu_id((wparam.0 & 0xFFFF) as u16) {
                    dispatch(command);
                }
                LRESULT(0)
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    unsafe fn show_menu(hwnd: HWND) {
        let Ok(menu) = (unsafe { CreatePopupMenu() }) else {
            warn!("Could not create tray menu");
            return;
        };

        unsafe {
            let _ = AppendMenuW(
                menu,
                MF_STRING,
                TrayCommand::Capture.menu_id().into(),
                w!("Capture"),
            );
            let _ = AppendMenuW(
                menu,
                MF_STRING,
                TrayCommand::Settings.menu_id().into(),
                w!("Settings"),
            );
            let _ = AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null());
            let _ = AppendMenuW(menu, MF_STRING, TrayCommand::Exit.menu_id().into(), w!("Exit"));

            let mut point = POINT::default();
            let _ = GetCursorPos(&mut point);
            // The menu only closes on outside clicks when its owner is in front.
            let _ = SetForegroundWindow(hwnd);
            let _ = TrackPopupMenuEx(
                menu,
                (TPM_LEFTALIGN | TPM_BOTTOMALIGN).0,
                point.x,
                point.y,
                hwnd,
                None,
            );
            let _ = DestroyMenu(menu);
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use anyhow::{Result, bail};

    pub struct Icon;

    impl Icon {
        pub fn add(_tooltip: &str) -> Result<Self> {
            bail!("tray icon is only available on Windows")
        }
    }
}
