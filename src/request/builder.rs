use super::types::*;
use crate::{
    Error, Result,
    config::{GenerationDefaults, ServiceConfig},
    prompt,
    style::Style,
};
use std::ops::RangeInclusive;
use tracing::debug;

pub const DIMENSION_RANGE: RangeInclusive<u32> = 64..=2048;
pub const STEPS_RANGE: RangeInclusive<u32> = 1..=150;
pub const CFG_SCALE_RANGE: RangeInclusive<f64> = 1.0..=30.0;
pub const DENOISING_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const MASK_BLUR_RANGE: RangeInclusive<u32> = 0..=64;
pub const INPAINT_PADDING_RANGE: RangeInclusive<u32> = 0..=256;
const DEFAULT_MASK_BLUR: u32 = 4;
const DEFAULT_INPAINT_PADDING: u32 = 32;

/// Turns caller parameters into a complete [`GenerationRequest`].
///
/// Validation happens before anything else, so an invalid request never
/// reaches the WebUI.
pub struct RequestBuilder<'a> {
    service: &'a ServiceConfig,
    defaults: &'a GenerationDefaults,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(service: &'a ServiceConfig, defaults: &'a GenerationDefaults) -> Self {
        Self { service, defaults }
    }

    pub fn text_to_image(&self, params: &GenerationParams, transparent: bool) -> Result<GenerationRequest> {
        self.assemble(params, transparent, GenerationKind::TextToImage)
    }

    /// `source_image` and `mask_image` are the already-loaded bytes of the
    /// sources named in `options`.
    pub fn image_to_image(
        &self,
        params: &GenerationParams,
        options: &ImageToImageParams,
        source_image: Option<Vec<u8>>,
        mask_image: Option<Vec<u8>>,
    ) -> Result<GenerationRequest> {
        let denoising_strength = options
            .denoising_strength
            .unwrap_or(self.defaults.denoising_strength);
        check_float("denoising_strength", denoising_strength, &DENOISING_RANGE)?;

        let resize_mode = match &options.resize_mode {
            Some(mode) => mode.parse::<ResizeMode>()?,
            None => ResizeMode::default(),
        };
        let inpainting_fill = match &options.inpainting_fill {
            Some(fill) => fill.parse::<InpaintingFill>()?,
            None => InpaintingFill::default(),
        };
        let mask_blur = options.mask_blur.unwrap_or(DEFAULT_MASK_BLUR);
        check_int("mask_blur", mask_blur, &MASK_BLUR_RANGE)?;
        let inpaint_full_res_padding = options
            .inpaint_full_res_padding
            .unwrap_or(DEFAULT_INPAINT_PADDING);
        check_int(
            "inpaint_full_res_padding",
            inpaint_full_res_padding,
            &INPAINT_PADDING_RANGE,
        )?;

        let source_image = source_image
            .ok_or_else(|| Error::invalid_image("image-to-image requires a source image"))?;
        let (width, height) = decode_dimensions("source image", &source_image)?;
        debug!("Source image is {}x{}", width, height);

        let mask_image = match mask_image {
            Some(mask) => {
                let dims = decode_dimensions("mask image", &mask)?;
                if dims != (width, height) {
                    debug!(
                        "Mask is {}x{} but source is {}x{}; the WebUI will rescale it",
                        dims.0, dims.1, width, height
                    );
                }
                Some(mask)
            }
            None => None,
        };

        let kind = GenerationKind::ImageToImage(ImageToImageOptions {
            source_image,
            mask_image,
            denoising_strength,
            resize_mode,
            inpainting_fill,
            inpainting_mask_invert: options.inpainting_mask_invert,
            mask_blur,
            inpaint_full_res: options.inpaint_full_res.unwrap_or(true),
            inpaint_full_res_padding,
        });

        self.assemble(params, false, kind)
    }

    fn assemble(
        &self,
        params: &GenerationParams,
        transparent: bool,
        kind: GenerationKind,
    ) -> Result<GenerationRequest> {
        if params.prompt.trim().is_empty() {
            return Err(Error::invalid_parameter("prompt", "must not be empty"));
        }

        let style = params.style.as_deref().map(Style::lookup).unwrap_or_default();
        let template = style.template();

        let width = params.width.unwrap_or(self.defaults.width);
        check_int("width", width, &DIMENSION_RANGE)?;
        let height = params.height.unwrap_or(self.defaults.height);
        check_int("height", height, &DIMENSION_RANGE)?;

        let steps = params
            .steps
            .or(template.steps)
            .unwrap_or(self.defaults.steps);
        check_int("steps", steps, &STEPS_RANGE)?;

        let cfg_scale = params
            .cfg_scale
            .or(template.cfg_scale)
            .unwrap_or(self.defaults.cfg_scale);
        check_float("cfg_scale", cfg_scale, &CFG_SCALE_RANGE)?;

        let sampler = match (&params.sampler, template.sampler) {
            (Some(name), _) => name.parse::<Sampler>()?,
            (None, Some(recommended)) => recommended,
            (None, None) => self.defaults.sampler.parse::<Sampler>()?,
        };

        // -1 is the WebUI's own spelling of "random".
        let seed = match params.seed {
            None | Some(-1) => None,
            Some(seed) if seed >= 0 => Some(seed),
            Some(seed) => {
                return Err(Error::invalid_parameter(
                    "seed",
                    format!("must be -1 (random) or a non-negative integer (got {})", seed),
                ));
            }
        };

        let negative = params
            .negative_prompt
            .as_deref()
            .unwrap_or(&self.defaults.negative_prompt);
        let composed = prompt::compose(&params.prompt, negative, style, transparent);

        let model = non_blank(params.model_name.as_deref())
            .unwrap_or(&self.service.default_model)
            .to_string();
        let vae = non_blank(params.vae_name.as_deref())
            .or(non_blank(self.service.default_vae.as_deref()))
            .map(str::to_string);

        Ok(GenerationRequest {
            kind,
            prompt: composed.positive,
            negative_prompt: composed.negative,
            width,
            height,
            steps,
            cfg_scale,
            sampler,
            seed,
            style,
            transparent,
            model,
            vae,
            output_path: params.output_path.clone(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_int(field: &str, value: u32, range: &RangeInclusive<u32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_parameter(
            field,
            format!(
                "must be between {} and {} (got {})",
                range.start(),
                range.end(),
                value
            ),
        ))
    }
}

fn check_float(field: &str, value: f64, range: &RangeInclusive<f64>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_parameter(
            field,
            format!(
                "must be between {} and {} (got {})",
                range.start(),
                range.end(),
                value
            ),
        ))
    }
}

fn decode_dimensions(label: &str, bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.is_empty() {
        return Err(Error::invalid_image(format!("{} is empty", label)));
    }
    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::invalid_image(format!("{} could not be decoded: {}", label, e)))?;
    Ok((image.width(), image.height()))
}
