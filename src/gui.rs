pub mod app;
pub mod fonts;
pub mod history;
pub mod settings;
pub mod task;

pub use app::TranslateApp;
