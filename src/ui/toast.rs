use egui::{Align2, Color32, Context, CornerRadius, Id, Order, RichText, vec2};
use std::time::{Duration, Instant};

const TOAST_LIFETIME: Duration = Duration::from_secs(3);
const FADE_IN: Duration = Duration::from_millis(300);
const SCREEN_MARGIN: f32 = 20.0;
const TOAST_SPACING: f32 = 56.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    shown_at: Instant,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Error)
    }

    fn new(message: String, level: ToastLevel) -> Self {
        Self {
            message,
            level,
            shown_at: Instant::now(),
        }
    }

    fn opacity(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.shown_at);
        (elapsed.as_secs_f32() / FADE_IN.as_secs_f32()).min(1.0)
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_LIFETIME
    }

    fn fill(&self) -> Color32 {
        match self.level {
            ToastLevel::Info => Color32::from_rgba_unmultiplied(73, 217, 169, 200),
            ToastLevel::Error => Color32::from_rgba_unmultiplied(200, 60, 60, 220),
        }
    }
}

/// Short-lived notifications stacked in the bottom-right corner.
#[derive(Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, toast: Toast) {
        log::info!("Notification displayed: {}", toast.message);
        self.items.push(toast);
    }

    fn prune(&mut self, now: Instant) {
        self.items.retain(|toast| !toast.is_expired(now));
    }

    pub fn show(&mut self, ctx: &Context) {
        let now = Instant::now();
        self.prune(now);

        for (i, toast) in self.items.iter().rev().enumerate() {
            egui::Area::new(Id::new("toast").with(i))
                .order(Order::Foreground)
                .anchor(
                    Align2::RIGHT_BOTTOM,
                    vec2(-SCREEN_MARGIN, -SCREEN_MARGIN - i as f32 * TOAST_SPACING),
                )
                .interactable(false)
                .show(ctx, |ui| {
                    ui.set_opacity(toast.opacity(now));
                    egui::Frame::NONE
                        .fill(toast.fill())
                        .corner_radius(CornerRadius::same(8))
                        .inner_margin(10.0)
                        .show(ui, |ui| {
                            ui.set_max_width(300.0);
                            ui.label(RichText::new(&toast.message).color(Color32::WHITE).size(14.0));
                        });
                });
        }

        if let Some(next) = self
            .items
            .iter()
            .map(|toast| {
                if toast.opacity(now) < 1.0 {
                    Duration::from_millis(16)
                } else {
                    (toast.shown_at + TOAST_LIFETIME).saturating_duration_since(now)
                }
            })
            .min()
        {
            ctx.request_repaint_after(next);
        }
    }
}
