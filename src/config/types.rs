use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub webui: ServiceConfig,
    #[serde(default)]
    pub defaults: GenerationDefaults,
    #[serde(default)]
    pub transparent: TransparentConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

/// Connection settings for the Stable Diffusion WebUI instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub default_model: String,
    #[serde(default)]
    pub default_vae: Option<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_switch_checkpoint")]
    pub switch_checkpoint: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationDefaults {
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    #[serde(default = "default_sampler")]
    pub sampler: String,
    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,
    #[serde(default = "default_denoising_strength")]
    pub denoising_strength: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparentConfig {
    #[serde(default)]
    pub background_removal: BackgroundRemoval,
    #[serde(default)]
    pub layer_diffuse: bool,
    #[serde(default = "default_layer_diffuse_method")]
    pub layer_diffuse_method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundRemoval {
    #[default]
    NearWhite,
    CornerColor,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            width: default_dimension(),
            height: default_dimension(),
            steps: default_steps(),
            cfg_scale: default_cfg_scale(),
            sampler: default_sampler(),
            negative_prompt: default_negative_prompt(),
            denoising_strength: default_denoising_strength(),
        }
    }
}

impl Default for TransparentConfig {
    fn default() -> Self {
        Self {
            background_removal: BackgroundRemoval::default(),
            layer_diffuse: false,
            layer_diffuse_method: default_layer_diffuse_method(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_model: default_model.into(),
            default_vae: None,
            output_dir: default_output_dir(),
            max_retries: default_max_retries(),
            timeout_seconds: default_timeout_seconds(),
            retry_delay_ms: default_retry_delay_ms(),
            switch_checkpoint: default_switch_checkpoint(),
        }
    }
}

impl Config {
    pub fn new(webui: ServiceConfig) -> Self {
        Self {
            webui,
            defaults: GenerationDefaults::default(),
            transparent: TransparentConfig::default(),
            logs: LogsConfig::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_switch_checkpoint() -> bool {
    true
}

fn default_dimension() -> u32 {
    512
}

fn default_steps() -> u32 {
    20
}

fn default_cfg_scale() -> f64 {
    7.5
}

fn default_sampler() -> String {
    "Euler a".to_string()
}

fn default_denoising_strength() -> f64 {
    0.75
}

fn default_negative_prompt() -> String {
    "lowres, bad anatomy, bad hands, text, error, missing fingers, extra digit, fewer digits, \
     cropped, worst quality, low quality, normal quality, jpeg artifacts, signature, watermark, \
     username, blurry"
        .to_string()
}

fn default_layer_diffuse_method() -> String {
    "(SD1.5) Only Generate Transparent Image (Attention Injection)".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
