// Configuration loader
// Loads TOML from an explicit path or ~/.creditwatch/config.toml, falling
// back to built-in defaults when no file exists

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::settings::Config;

/// Load and validate configuration
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match default_config_path() {
            Some(path) if path.exists() => load_from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            _ => Config::default(),
        },
    };

    config.validate()?;
    Ok(config)
}

fn load_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = toml::from_str(&contents).context("Failed to parse config.toml")?;
    Ok(config)
}

fn default_config_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|home| home.join(".creditwatch/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_explicit_path_errors() {
        let err = load_config(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.toml"));
    }

    #[test]
    fn test_load_partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[monitor]
bucket_span_secs = 30

[server]
bind_address = "0.0.0.0:9000"
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.monitor.bucket_span_secs, 30);
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        // Unspecified fields keep their defaults, including the rule set
        assert_eq!(config.monitor.rollup_buckets, 15);
        assert!(!config.monitor.rules.is_empty());
    }

    #[test]
    fn test_load_config_with_rules() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[monitor.rules]]
id = "disagreement-high"
metric = "disagreement_rate"
op = "greater_than"
threshold = 0.25
min_samples = 50
debounce_cycles = 2
hysteresis_margin = 0.03
priority = 1
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.monitor.rules.len(), 1);
        assert_eq!(config.monitor.rules[0].threshold, 0.25);
        assert_eq!(config.monitor.rules[0].debounce_cycles, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[monitor]
retention_secs = 0
"#
        )
        .unwrap();

        assert!(load_config(Some(file.path())).is_err());
    }
}
