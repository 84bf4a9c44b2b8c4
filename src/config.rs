use std::ffi::OsStr;
use std::fs::File;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    /// Path to the `SQLite` database file.
    pub db: String,
    pub busy_timeout_ms: u32,
}

impl Config {
    pub fn load(path: &OsStr) -> anyhow::Result<Self> {
        serde_yaml::from_reader(File::open(path)?)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_example_config() -> anyhow::Result<()> {
        let config_text = std::fs::read_to_string("config.example.yaml")?;
        let config: Config = serde_yaml::from_str(&config_text)?;

        similar_asserts::assert_serde_eq!(
            serde_yaml::to_value(&config)?,
            serde_yaml::from_str::<serde_yaml::Value>(&config_text)?,
            "Extra fields in config.example.yaml?",
        );
        assert_eq!(config.database_url(), "sqlite://pollbot.sqlite3");

        Ok(())
    }
}
