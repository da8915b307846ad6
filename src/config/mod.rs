// Configuration
// Static at startup; nothing here is hot-reloaded mid-run

mod loader;
mod settings;

pub use loader::load_config;
pub use settings::{Config, MonitorConfig, ServerConfig};
