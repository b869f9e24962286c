use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use sd_webui_mcp::{
    Result,
    config::{Config, ServiceConfig},
};
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;
use tokio::fs;

pub const TEST_MODEL: &str = "anything-v5.safetensors";

/// Create a test configuration pointing at `base_url` with fast retries
pub fn create_test_config(base_url: &str, output_dir: &Path) -> Config {
    let mut webui = ServiceConfig::new(base_url, TEST_MODEL);
    webui.output_dir = output_dir.to_path_buf();
    webui.max_retries = 3;
    webui.timeout_seconds = 5;
    webui.retry_delay_ms = 0;
    webui.switch_checkpoint = false;
    Config::new(webui)
}

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test config YAML file
pub async fn create_test_config_file(dir: &TempDir, content: &str) -> Result<String> {
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, content).await?;
    Ok(config_path.to_string_lossy().to_string())
}

fn encode_png(image: DynamicImage) -> Vec<u8> {
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    out
}

/// Opaque RGB PNG: white background with a saturated square in the middle.
pub fn png_on_white(width: u32, height: u32) -> Vec<u8> {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for x in width / 4..width * 3 / 4 {
        for y in height / 4..height * 3 / 4 {
            img.put_pixel(x, y, Rgb([30, 90, 200]));
        }
    }
    encode_png(DynamicImage::ImageRgb8(img))
}

/// RGBA PNG whose border is already fully transparent.
pub fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    for x in width / 4..width * 3 / 4 {
        for y in height / 4..height * 3 / 4 {
            img.put_pixel(x, y, Rgba([200, 40, 40, 255]));
        }
    }
    encode_png(DynamicImage::ImageRgba8(img))
}

/// Body of a successful txt2img/img2img response.
pub fn generation_response(png: &[u8], seed: i64) -> Value {
    json!({
        "images": [STANDARD.encode(png)],
        "parameters": {"seed": -1},
        "info": json!({"seed": seed, "sampler_name": "Euler a"}).to_string()
    })
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
webui:
  base_url: "http://127.0.0.1:7860"
  default_model: "anything-v5.safetensors"
  output_dir: "./generated"
  max_retries: 2
  timeout_seconds: 120

defaults:
  width: 640
  sampler: "DPM++ 2M Karras"

transparent:
  background_removal: corner_color

logs:
  level: "debug"
"#;

/// Configuration missing the required model
pub const MISSING_MODEL_CONFIG_YAML: &str = r#"
webui:
  base_url: "http://127.0.0.1:7860"
"#;
