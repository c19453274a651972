pub mod app;
pub mod event;
pub mod overlay;
pub mod results;
pub mod settings;
pub mod shutdown;
pub mod toast;
