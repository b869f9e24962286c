use crate::{
    Error, Result,
    request::{GenerationKind, GenerationRequest, Sampler},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;

pub const TXT2IMG_ENDPOINT: &str = "/sdapi/v1/txt2img";
pub const IMG2IMG_ENDPOINT: &str = "/sdapi/v1/img2img";
pub const OPTIONS_ENDPOINT: &str = "/sdapi/v1/options";
pub const MODELS_ENDPOINT: &str = "/sdapi/v1/sd-models";
pub const VAE_ENDPOINT: &str = "/sdapi/v1/sd-vae";
pub const HYPERNETWORKS_ENDPOINT: &str = "/sdapi/v1/hypernetworks";
pub const SYSTEM_INFO_ENDPOINT: &str = "/sdapi/v1/system-info";
pub const CONTROLNET_MODELS_ENDPOINT: &str = "/controlnet/model_list";

/// Fields shared by the txt2img and img2img endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CommonPayload {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f64,
    pub sampler_index: Sampler,
    pub seed: i64,
    pub n_iter: u32,
    pub batch_size: u32,
    pub override_settings: Map<String, Value>,
    #[serde(flatten)]
    pub transparent: Option<TransparentTweaks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alwayson_scripts: Option<Value>,
}

/// Sampler settings that keep the background clean for alpha extraction.
#[derive(Debug, Clone, Serialize)]
pub struct TransparentTweaks {
    pub enable_hr: bool,
    pub restore_faces: bool,
    pub tiling: bool,
    pub eta: f64,
    pub s_churn: f64,
    pub s_tmax: f64,
    pub s_tmin: f64,
    pub s_noise: f64,
}

impl Default for TransparentTweaks {
    fn default() -> Self {
        Self {
            enable_hr: false,
            restore_faces: false,
            tiling: false,
            eta: 0.0,
            s_churn: 0.0,
            s_tmax: 0.0,
            s_tmin: 0.0,
            s_noise: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Img2ImgPayload {
    #[serde(flatten)]
    pub common: CommonPayload,
    pub init_images: Vec<String>,
    pub denoising_strength: f64,
    pub resize_mode: u8,
    pub mask_blur: u32,
    pub inpainting_fill: u8,
    pub inpaint_full_res: bool,
    pub inpaint_full_res_padding: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    pub inpainting_mask_invert: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GenerationPayload {
    TextToImage(CommonPayload),
    ImageToImage(Img2ImgPayload),
}

impl GenerationPayload {
    /// Builds the JSON body for `request`. `layer_diffuse` names the
    /// LayerDiffuse method to enable for transparent requests, if any.
    pub fn from_request(request: &GenerationRequest, layer_diffuse: Option<&str>) -> Self {
        let mut override_settings = Map::new();
        let mut transparent = None;
        let mut alwayson_scripts = None;

        if request.transparent {
            transparent = Some(TransparentTweaks::default());
            override_settings.insert("CLIP_stop_at_last_layers".into(), json!(1));
            if let Some(method) = layer_diffuse {
                alwayson_scripts = Some(json!({
                    "layerdiffuse": {
                        "args": [
                            true, method, 1.0, 1.0, null, null, null,
                            "Crop and Resize", false, "", "", ""
                        ]
                    }
                }));
            }
        }

        let common = CommonPayload {
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            width: request.width,
            height: request.height,
            steps: request.steps,
            cfg_scale: request.cfg_scale,
            sampler_index: request.sampler,
            seed: request.seed.unwrap_or(-1),
            n_iter: 1,
            batch_size: 1,
            override_settings,
            transparent,
            alwayson_scripts,
        };

        match &request.kind {
            GenerationKind::TextToImage => GenerationPayload::TextToImage(common),
            GenerationKind::ImageToImage(options) => GenerationPayload::ImageToImage(Img2ImgPayload {
                common,
                init_images: vec![STANDARD.encode(&options.source_image)],
                denoising_strength: options.denoising_strength,
                resize_mode: options.resize_mode.code(),
                mask_blur: options.mask_blur,
                inpainting_fill: options.inpainting_fill.code(),
                inpaint_full_res: options.inpaint_full_res,
                inpaint_full_res_padding: options.inpaint_full_res_padding,
                mask: options.mask_image.as_ref().map(|mask| STANDARD.encode(mask)),
                inpainting_mask_invert: u8::from(options.inpainting_mask_invert),
            }),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            GenerationPayload::TextToImage(_) => TXT2IMG_ENDPOINT,
            GenerationPayload::ImageToImage(_) => IMG2IMG_ENDPOINT,
        }
    }
}

/// Raw txt2img/img2img response body.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub info: Option<String>,
}

/// A decoded generation: image bytes plus the metadata the WebUI reported.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub image_bytes: Vec<u8>,
    pub seed_used: i64,
    pub elapsed: Duration,
    pub raw_metadata: Value,
}

impl GenerationResponse {
    pub fn into_result(self, requested_seed: Option<i64>, elapsed: Duration) -> Result<GenerationResult> {
        let first = self
            .images
            .first()
            .ok_or_else(|| Error::invalid_response("response contains no images"))?;
        let image_bytes = STANDARD
            .decode(first.trim())
            .map_err(|e| Error::invalid_response(format!("image is not valid base64: {}", e)))?;

        // `info` is itself a JSON document encoded as a string.
        let raw_metadata = match &self.info {
            Some(info) => serde_json::from_str(info).unwrap_or_else(|_| Value::String(info.clone())),
            None => Value::Null,
        };

        let seed_used = raw_metadata
            .get("seed")
            .and_then(Value::as_i64)
            .or_else(|| self.parameters.get("seed").and_then(Value::as_i64))
            .or(requested_seed)
            .unwrap_or(-1);

        Ok(GenerationResult {
            image_bytes,
            seed_used,
            elapsed,
            raw_metadata,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdModel {
    pub title: String,
    pub model_name: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub config: Option<String>,
}

impl SdModel {
    pub fn short_hash(&self) -> &str {
        match &self.hash {
            Some(hash) => hash.get(..8).unwrap_or(hash),
            None => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdVae {
    pub model_name: String,
    #[serde(default)]
    pub filename: String,
}

/// The WebUI's `/sdapi/v1/options` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebUiOptions(pub Map<String, Value>);

impl WebUiOptions {
    pub fn checkpoint(&self) -> &str {
        self.0
            .get("sd_model_checkpoint")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn vae(&self) -> &str {
        self.0.get("sd_vae").and_then(Value::as_str).unwrap_or("")
    }

    pub fn clip_skip(&self) -> i64 {
        self.0
            .get("CLIP_stop_at_last_layers")
            .and_then(Value::as_i64)
            .unwrap_or(1)
    }

    pub fn eta_noise_seed_delta(&self) -> i64 {
        self.0
            .get("eta_noise_seed_delta")
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }
}
