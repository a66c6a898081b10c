pub mod toml_loader;

pub use toml_loader::{apply_strategy_overrides, load_strategy_file};
