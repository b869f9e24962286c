mod types;

pub use types::*;

use crate::{Error, Result, request::Sampler};
use std::env;
use tracing::debug;

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    debug!("Loading configuration from: {}", config_path);

    let config_str = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(|e| Error::config(format!("Cannot read {}: {}", config_path, e)))?;
    let mut config = parse(&config_str)?;

    if let Ok(base_url) = env::var("SD_WEBUI_BASE_URL") {
        debug!("Overriding WebUI base URL from environment: {}", base_url);
        config.webui.base_url = base_url;
    }

    config.validate()?;
    Ok(config)
}

pub fn parse(content: &str) -> Result<Config> {
    serde_yaml::from_str(content).map_err(|e| Error::config(format!("Invalid configuration: {}", e)))
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let webui = &self.webui;

        if webui.base_url.trim().is_empty() {
            return Err(Error::config("webui.base_url must not be empty"));
        }
        reqwest::Url::parse(&webui.base_url).map_err(|e| {
            Error::config(format!("webui.base_url '{}' is not a valid URL: {}", webui.base_url, e))
        })?;

        if webui.default_model.trim().is_empty() {
            return Err(Error::config("webui.default_model must not be empty"));
        }
        if webui.timeout_seconds == 0 {
            return Err(Error::config("webui.timeout_seconds must be greater than 0"));
        }

        let defaults = &self.defaults;
        for (name, value) in [("width", defaults.width), ("height", defaults.height)] {
            if !(64..=2048).contains(&value) {
                return Err(Error::config(format!(
                    "defaults.{} must be between 64 and 2048, got {}",
                    name, value
                )));
            }
        }
        if !(1..=150).contains(&defaults.steps) {
            return Err(Error::config(format!(
                "defaults.steps must be between 1 and 150, got {}",
                defaults.steps
            )));
        }
        if !(1.0..=30.0).contains(&defaults.cfg_scale) {
            return Err(Error::config(format!(
                "defaults.cfg_scale must be between 1 and 30, got {}",
                defaults.cfg_scale
            )));
        }
        if !(0.0..=1.0).contains(&defaults.denoising_strength) {
            return Err(Error::config(format!(
                "defaults.denoising_strength must be between 0 and 1, got {}",
                defaults.denoising_strength
            )));
        }
        defaults
            .sampler
            .parse::<Sampler>()
            .map_err(|_| Error::config(format!("defaults.sampler '{}' is not a known sampler", defaults.sampler)))?;

        Ok(())
    }
}
