use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
    /// Seed demo accounts and stories at startup. Off unless explicitly
    /// enabled; the demo accounts carry a fixed development password.
    #[serde(default)]
    pub seed_demo: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct Ai {
    /// Key for the Gemini API. When absent, the writing-assistant
    /// endpoints answer with a not-configured error instead of failing
    /// at startup.
    pub gemini_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    #[serde(default)]
    pub ai: Ai,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Optional settings.toml, checked in the working directory and in
        // the server crate directory for development runs.
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        let dev_path = PathBuf::from("fable-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "fable.db")?;

        // Environment variables take priority over file and defaults
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            builder = builder.set_override("ai.gemini_api_key", key)?;
        }
        if let Ok(seed) = std::env::var("SEED_DEMO_DATA") {
            let enabled = matches!(seed.to_lowercase().as_str(), "1" | "true" | "yes");
            builder = builder.set_override("database.seed_demo", enabled)?;
        }

        let s = builder.build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_seed_is_off_by_default() {
        let settings = Config::builder()
            .set_default("server.host", "127.0.0.1")
            .unwrap()
            .set_default("server.port", 3000)
            .unwrap()
            .set_default("database.path", ":memory:")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<Settings>()
            .unwrap();

        assert!(!settings.database.seed_demo);
        assert!(settings.ai.gemini_api_key.is_none());
    }
}
