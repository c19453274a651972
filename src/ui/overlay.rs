use crate::capture::{CaptureRequest, DeviceTransform, PixelRect};
use crate::cursor_clip::CursorClip;
use crate::selection::{SelectionOutcome, SelectionState, dim_regions};
use egui::{
    Color32, Context, CursorIcon, Id, Key, LayerId, Pos2, Rect, RichText, Stroke, StrokeKind,
    ViewportBuilder, ViewportId, pos2,
};
use log::{debug, info, warn};

const HELP_TEXT: &str = "Click and drag to select an area to capture - Press Esc to cancel - Hold Shift to adjust selection";

const DIM_COLOR: Color32 = Color32::from_black_alpha(102);
/// Alpha 1 so the hole still receives mouse input.
const HOLE_COLOR: Color32 = Color32::from_black_alpha(1);
const BORDER_COLOR: Color32 = Color32::from_rgb(40, 118, 126);

#[derive(Debug)]
pub enum OverlayOutcome {
    Pending,
    Cancelled,
    Selected(CaptureRequest),
}

/// Full-screen drag-to-select window shown while the user picks a region.
#[derive(Debug, Default)]
pub struct SelectionOverlay {
    selection: SelectionState,
    clip: Option<CursorClip>,
    shift_was_held: bool,
}

impl SelectionOverlay {
    pub fn viewport_id() -> ViewportId {
        ViewportId::from_hash_of("selection_overlay")
    }

    pub fn viewport_builder() -> ViewportBuilder {
        ViewportBuilder::default()
            .with_title("Screenshot")
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_fullscreen(true)
            .with_taskbar(false)
    }

    pub fn show(&mut self, ctx: &Context) -> OverlayOutcome {
        ctx.set_cursor_icon(CursorIcon::Crosshair);

        let cancel = ctx.input(|i| i.key_pressed(Key::Escape) || i.viewport().close_requested());
        if cancel {
            info!("Screenshot cancelled by user");
            self.abort();
            return OverlayOutcome::Cancelled;
        }

        let outcome = self.handle_pointer(ctx);
        self.paint(ctx);
        outcome
    }

    fn abort(&mut self) {
        self.selection.cancel();
        self.clip = None;
    }

    fn handle_pointer(&mut self, ctx: &Context) -> OverlayOutcome {
        let (pressed, released, pos, shift) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
                i.modifiers.shift,
            )
        });

        if self.shift_was_held && !shift {
            self.selection.shift_released();
        }
        self.shift_was_held = shift;

        if pressed && let Some(pos) = pos {
            self.begin(ctx, pos);
        }

        if !self.selection.is_selecting() {
            return OverlayOutcome::Pending;
        }

        if !released {
            if let Some(pos) = pos {
                self.selection.pointer_moved(pos, shift);
            }
            return OverlayOutcome::Pending;
        }

        self.clip = None;
        let outcome = match pos {
            Some(pos) => self.selection.release(pos, shift),
            None => self.selection.finish(),
        };
        match outcome {
            SelectionOutcome::Selected(rect) => {
                let transform = DeviceTransform::uniform(ctx.pixels_per_point());
                let monitor = monitor_bounds(ctx, transform);
                let request = CaptureRequest::new(rect, (monitor.x, monitor.y), transform);
                debug!("Selected {rect:?} -> {request:?}");
                OverlayOutcome::Selected(request)
            }
            SelectionOutcome::TooSmall(rect) => {
                info!("Selection too small ({rect:?}), cancelled");
                OverlayOutcome::Cancelled
            }
            SelectionOutcome::NotSelecting => OverlayOutcome::Pending,
        }
    }

    fn begin(&mut self, ctx: &Context, pos: Pos2) {
        self.selection.press(pos);
        debug!("Started selection at {}, {}", pos.x, pos.y);

        let bounds = monitor_bounds(ctx, DeviceTransform::uniform(ctx.pixels_per_point()));
        self.clip = match CursorClip::confine(bounds) {
            Ok(clip) => {
                debug!("Cursor clipped to {:?}", clip.bounds());
                Some(clip)
            }
            Err(err) => {
                warn!("Could not clip cursor: {err:#}");
                None
            }
        };
    }

    fn paint(&self, ctx: &Context) {
        let screen = ctx.screen_rect();
        let selection = self.selection.rect();
        let painter = ctx.layer_painter(LayerId::background());

        for region in dim_regions(screen, selection) {
            painter.rect_filled(region, 0.0, DIM_COLOR);
        }

        if let Some(rect) = selection {
            painter.rect_filled(rect, 0.0, HOLE_COLOR);
            painter.rect_stroke(
                rect,
                0.0,
                Stroke::new(1.0, BORDER_COLOR),
                StrokeKind::Outside,
            );
        }

        if !self.selection.is_selecting() {
            show_help(ctx);
        }
    }
}

fn show_help(ctx: &Context) {
    egui::Area::new(Id::new("overlay_help"))
        .fixed_pos(pos2(10.0, 10.0))
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::NONE
                .fill(Color32::from_black_alpha(150))
                .inner_margin(5.0)
                .show(ui, |ui| {
                    ui.label(RichText::new(HELP_TEXT).color(Color32::WHITE));
                });
        });
}

/// The overlay's screen area in absolute device pixels.
fn monitor_bounds(ctx: &Context, transform: DeviceTransform) -> PixelRect {
    let inner = ctx.input(|i| i.viewport().inner_rect);
    let rect = inner.unwrap_or_else(|| Rect::from_min_size(Pos2::ZERO, ctx.screen_rect().size()));
    PixelRect::from_logical(rect, transform)
}
