pub mod catalog;
pub mod client;
pub mod controller;
pub mod gui;
pub mod i18n;
pub mod preview;
pub mod settings;
pub mod utils;

pub use controller::Translator;
