use log::{info, warn};
use serde::Deserialize;
use std::fs::File;

/// Local process configuration. Everything the banner *shows* comes from the
/// backend; this only says where the backend is.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_host: String,
}

impl Config {
    const PATH: &'static str = "./config.json";

    /// Load config from the local file. A missing or unparseable file just
    /// means defaults.
    pub fn load() -> Self {
        info!("Loading config from `{}`", Self::PATH);
        let helper = || -> anyhow::Result<Self> {
            let file = File::open(Self::PATH)?;
            Ok(serde_json::from_reader(file)?)
        };
        match helper() {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    "Error loading config from `{}`, using defaults: {err:#}",
                    Self::PATH
                );
                Self::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: "http://localhost:8000".into(),
        }
    }
}
