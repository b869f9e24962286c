use crate::request::{GenerationParams, ImageSource, ImageToImageParams};
use rmcp::schemars;
use serde::Deserialize;
use std::path::PathBuf;

/// Settings shared by every generation tool.
#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct GenerationArgs {
    #[schemars(description = "What to draw")]
    pub prompt: String,
    #[schemars(description = "Things to keep out of the image")]
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[schemars(description = "Where to save the image; relative paths go under the output directory")]
    #[serde(default)]
    pub output_path: Option<String>,
    #[schemars(description = "Checkpoint to use; defaults to the configured model")]
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub vae_name: Option<String>,
    #[schemars(description = "64-2048")]
    #[serde(default)]
    pub width: Option<u32>,
    #[schemars(description = "64-2048")]
    #[serde(default)]
    pub height: Option<u32>,
    #[schemars(description = "1-150")]
    #[serde(default)]
    pub steps: Option<u32>,
    #[schemars(description = "1-30")]
    #[serde(default)]
    pub cfg_scale: Option<f64>,
    #[schemars(description = "WebUI sampler name, e.g. 'Euler a' or 'DPM++ 2M Karras'")]
    #[serde(default)]
    pub sampler: Option<String>,
    #[schemars(description = "-1 or omitted for random")]
    #[serde(default)]
    pub seed: Option<i64>,
    #[schemars(description = "none, anime_character, realistic_portrait, fantasy_art or modern_style")]
    #[serde(default)]
    pub style: Option<String>,
}

impl GenerationArgs {
    pub fn into_params(self) -> GenerationParams {
        GenerationParams {
            prompt: self.prompt,
            negative_prompt: self.negative_prompt,
            output_path: self.output_path.map(PathBuf::from),
            model_name: self.model_name,
            vae_name: self.vae_name,
            width: self.width,
            height: self.height,
            steps: self.steps,
            cfg_scale: self.cfg_scale,
            sampler: self.sampler,
            seed: self.seed,
            style: self.style,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct GenerateImageArgs {
    #[serde(flatten)]
    pub generation: GenerationArgs,
    #[schemars(description = "Produce a PNG with a transparent background")]
    #[serde(default)]
    pub transparent_background: Option<bool>,
}

impl GenerateImageArgs {
    pub fn into_params(self) -> GenerationParams {
        self.generation.into_params()
    }
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct ImageToImageArgs {
    #[serde(flatten)]
    pub generation: GenerationArgs,
    #[schemars(description = "Path of the source image")]
    #[serde(default)]
    pub input_image_path: Option<String>,
    #[schemars(description = "Source image as base64 or a data URL, instead of a path")]
    #[serde(default)]
    pub input_image_base64: Option<String>,
    #[schemars(description = "Inpainting mask; white areas are repainted")]
    #[serde(default)]
    pub mask_image_path: Option<String>,
    #[serde(default)]
    pub mask_image_base64: Option<String>,
    #[schemars(description = "0-1; how far to move away from the source")]
    #[serde(default)]
    pub denoising_strength: Option<f64>,
    #[schemars(description = "Just resize, Crop and resize, Resize and fill or Just resize (latent upscale)")]
    #[serde(default)]
    pub resize_mode: Option<String>,
    #[schemars(description = "fill, original, latent_noise or latent_nothing")]
    #[serde(default)]
    pub inpainting_fill_mode: Option<String>,
    #[schemars(description = "1 repaints the black areas of the mask instead of the white ones")]
    #[serde(default)]
    pub inpainting_mask_invert: Option<u8>,
    #[schemars(description = "0-64")]
    #[serde(default)]
    pub mask_blur: Option<u32>,
    #[schemars(description = "Inpaint the masked area at full resolution; defaults to true")]
    #[serde(default)]
    pub inpaint_full_res: Option<bool>,
    #[schemars(description = "0-256 pixels of context around the masked area; defaults to 32")]
    #[serde(default)]
    pub inpaint_full_res_padding: Option<u32>,
}

impl ImageToImageArgs {
    pub fn into_params(self) -> (GenerationParams, ImageToImageParams) {
        let source_image = pick_source(self.input_image_path, self.input_image_base64);
        let mask_image = pick_source(self.mask_image_path, self.mask_image_base64);
        let options = ImageToImageParams {
            source_image,
            mask_image,
            denoising_strength: self.denoising_strength,
            resize_mode: self.resize_mode,
            inpainting_fill: self.inpainting_fill_mode,
            inpainting_mask_invert: self.inpainting_mask_invert.unwrap_or(0) != 0,
            mask_blur: self.mask_blur,
            inpaint_full_res: self.inpaint_full_res,
            inpaint_full_res_padding: self.inpaint_full_res_padding,
        };
        (self.generation.into_params(), options)
    }
}

/// A path wins over inline data when both are given.
fn pick_source(path: Option<String>, base64: Option<String>) -> Option<ImageSource> {
    match (path, base64) {
        (Some(path), _) if !path.trim().is_empty() => Some(ImageSource::Path(PathBuf::from(path))),
        (_, Some(data)) if !data.trim().is_empty() => Some(ImageSource::Base64(data)),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct PromptSuggestionsArgs {
    #[schemars(
        description = "all, characters, styles, negative, quality, samplers, scene_backgrounds, clothing_accessories, environment_tags or technical_parameters"
    )]
    #[serde(default)]
    pub category: Option<String>,
}
