use log::{info, warn};
use serde::Deserialize;
use std::{fs::File, path::PathBuf};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the persisted widget settings live
    pub settings_path: PathBuf,
    /// IANA timezone override. When unset, the timezone is detected from
    /// the environment.
    pub timezone: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("./settings.json"),
            timezone: None,
        }
    }
}

impl Config {
    const PATH: &'static str = "./config.json";

    /// Load config, falling back to defaults if the file is missing or
    /// malformed. Config problems shouldn't keep the clock from running.
    pub fn load() -> Self {
        info!("Loading config from `{}`", Self::PATH);
        let helper = || {
            let file = File::open(Self::PATH)?;
            Ok::<Self, anyhow::Error>(serde_json::from_reader(file)?)
        };
        match helper() {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    "Error loading config from {}, using defaults: {}",
                    Self::PATH,
                    err
                );
                Self::default()
            }
        }
    }
}
