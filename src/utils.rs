pub mod paths;

pub use paths::app_config_dir;
