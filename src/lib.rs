#![warn(clippy::all, rust_2018_idioms)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::float_cmp
)]
mod ui;

pub use ui::app::ScreenOcrApp;

pub(crate) mod action;
pub mod capture;
pub(crate) mod cursor_clip;
pub mod hotkey;
pub mod ocr;
pub mod selection;
pub mod settings;
pub mod tray;
