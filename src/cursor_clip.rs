use crate::capture::PixelRect;
use anyhow::Result;
use log::debug;

/// Keeps the OS cursor inside a screen rectangle until dropped.
#[derive(Debug)]
pub struct CursorClip {
    bounds: PixelRect,
}

impl CursorClip {
    pub fn confine(bounds: PixelRect) -> Result<Self> {
        platform::clip(Some(&bounds))?;
        Ok(Self { bounds })
    }

    pub fn bounds(&self) -> PixelRect {
        self.bounds
    }
}

impl Drop for CursorClip {
    fn drop(&mut self) {
        if let Err(err) = platform::clip(None) {
            log::warn!("Failed to release cursor clip: {err}");
        } else {
            debug!("Cursor clip released");
        }
    }
}

#[cfg(windows)]
mod platform {
    use crate::capture::PixelRect;
    use anyhow::{Context, Result};
    use windows::Win32::Foundation::RECT;
    use windows::Win32::UI::WindowsAndMessaging::ClipCursor;

    pub fn clip(bounds: Option<&PixelRect>) -> Result<()> {
        match bounds {
            Some(bounds) => {
                let rect = RECT {
                    left: bounds.x,
                    top: bounds.y,
                    right: bounds.x + bounds.width as i32,
                    bottom: bounds.y + bounds.height as i32,
                };
                unsafe { ClipCursor(Some(&rect as *const RECT)) }.context("ClipCursor failed")
            }
            None => unsafe { ClipCursor(None) }.context("ClipCursor release failed"),
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use crate::capture::PixelRect;
    use anyhow::Result;

    /// No portable cursor confinement; the overlay still covers the screen.
    pub fn clip(_bounds: Option<&PixelRect>) -> Result<()> {
        Ok(())
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[test]
    fn confine_keeps_bounds() {
        let bounds = PixelRect {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        };

        let clip = CursorClip::confine(bounds).unwrap();

        assert_eq!(clip.bounds(), bounds);
    }
}
