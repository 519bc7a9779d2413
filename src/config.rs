use std::path::Path;

use color_eyre::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
    pub demo: Option<DemoConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_capacity")]
    pub capacity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_producers")]
    pub producers: usize,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default = "default_rejected_message")]
    pub rejected_message: String,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Config {
    pub fn from_toml(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// The demo section, or its defaults when the file has none.
    pub fn demo(&self) -> DemoConfig {
        self.demo.clone().unwrap_or_default()
    }
}

impl GateConfig {
    /// Zero and negative capacities clamp to 1.
    pub fn capacity(&self) -> usize {
        usize::try_from(self.capacity.max(1)).unwrap_or(usize::MAX)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            producers: default_producers(),
            message: default_message(),
            rejected_message: default_rejected_message(),
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_capacity() -> i64 {
    10
}

fn default_producers() -> usize {
    10
}

fn default_message() -> String {
    "sent".to_string()
}

fn default_rejected_message() -> String {
    "not sent".to_string()
}

fn default_buffer_size() -> usize {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.gate.capacity(), 10);
        assert!(config.demo.is_none());

        let demo = config.demo();
        assert_eq!(demo.producers, 10);
        assert_eq!(demo.message, "sent");
        assert_eq!(demo.rejected_message, "not sent");
    }

    #[test]
    fn parses_sections() {
        let config = Config::from_toml(
            r#"
[gate]
capacity = 3

[demo]
producers = 7
message = "hello"
buffer_size = 1
"#,
        )
        .unwrap();

        assert_eq!(config.gate.capacity(), 3);
        let demo = config.demo();
        assert_eq!(demo.producers, 7);
        assert_eq!(demo.message, "hello");
        assert_eq!(demo.rejected_message, "not sent");
        assert_eq!(demo.buffer_size, 1);
    }

    #[test]
    fn non_positive_capacity_clamps_to_one() {
        let config = Config::from_toml("[gate]\ncapacity = -5").unwrap();
        assert_eq!(config.gate.capacity(), 1);
        assert_eq!(crate::gate::Gate::new(config.gate.capacity()).capacity(), 1);

        let config = Config::from_toml("[gate]\ncapacity = 0").unwrap();
        assert_eq!(config.gate.capacity(), 1);
    }
}
