use crate::{Error, Result, style::Style};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sampler {
    EulerA,
    Euler,
    Lms,
    Heun,
    Dpm2,
    Dpm2A,
    DpmPp2SA,
    DpmPp2M,
    DpmPpSde,
    DpmPp2MKarras,
    DpmPpSdeKarras,
    DpmFast,
    DpmAdaptive,
    Ddim,
    Plms,
    UniPc,
    Lcm,
}

impl Sampler {
    pub const ALL: [Sampler; 17] = [
        Sampler::EulerA,
        Sampler::Euler,
        Sampler::Lms,
        Sampler::Heun,
        Sampler::Dpm2,
        Sampler::Dpm2A,
        Sampler::DpmPp2SA,
        Sampler::DpmPp2M,
        Sampler::DpmPpSde,
        Sampler::DpmPp2MKarras,
        Sampler::DpmPpSdeKarras,
        Sampler::DpmFast,
        Sampler::DpmAdaptive,
        Sampler::Ddim,
        Sampler::Plms,
        Sampler::UniPc,
        Sampler::Lcm,
    ];

    /// Name as the WebUI expects it in `sampler_index`.
    pub fn as_str(self) -> &'static str {
        match self {
            Sampler::EulerA => "Euler a",
            Sampler::Euler => "Euler",
            Sampler::Lms => "LMS",
            Sampler::Heun => "Heun",
            Sampler::Dpm2 => "DPM2",
            Sampler::Dpm2A => "DPM2 a",
            Sampler::DpmPp2SA => "DPM++ 2S a",
            Sampler::DpmPp2M => "DPM++ 2M",
            Sampler::DpmPpSde => "DPM++ SDE",
            Sampler::DpmPp2MKarras => "DPM++ 2M Karras",
            Sampler::DpmPpSdeKarras => "DPM++ SDE Karras",
            Sampler::DpmFast => "DPM fast",
            Sampler::DpmAdaptive => "DPM adaptive",
            Sampler::Ddim => "DDIM",
            Sampler::Plms => "PLMS",
            Sampler::UniPc => "UniPC",
            Sampler::Lcm => "LCM",
        }
    }
}

impl FromStr for Sampler {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Sampler::ALL
            .into_iter()
            .find(|sampler| sampler.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                Error::invalid_parameter("sampler", format!("unknown sampler '{}'", wanted))
            })
    }
}

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sampler {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How the WebUI fits the source image into the requested dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    JustResize,
    #[default]
    CropAndResize,
    ResizeAndFill,
    LatentUpscale,
}

impl ResizeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResizeMode::JustResize => "Just resize",
            ResizeMode::CropAndResize => "Crop and resize",
            ResizeMode::ResizeAndFill => "Resize and fill",
            ResizeMode::LatentUpscale => "Just resize (latent upscale)",
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ResizeMode::JustResize => 0,
            ResizeMode::CropAndResize => 1,
            ResizeMode::ResizeAndFill => 2,
            ResizeMode::LatentUpscale => 3,
        }
    }
}

impl FromStr for ResizeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        [
            ResizeMode::JustResize,
            ResizeMode::CropAndResize,
            ResizeMode::ResizeAndFill,
            ResizeMode::LatentUpscale,
        ]
        .into_iter()
        .find(|mode| mode.as_str().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| Error::invalid_parameter("resize_mode", format!("unknown resize mode '{}'", wanted)))
    }
}

/// What the WebUI puts under the mask before inpainting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InpaintingFill {
    Fill,
    #[default]
    Original,
    LatentNoise,
    LatentNothing,
}

impl InpaintingFill {
    pub fn as_str(self) -> &'static str {
        match self {
            InpaintingFill::Fill => "fill",
            InpaintingFill::Original => "original",
            InpaintingFill::LatentNoise => "latent_noise",
            InpaintingFill::LatentNothing => "latent_nothing",
        }
    }

    pub fn code(self) -> u8 {
        match self {
            InpaintingFill::Fill => 0,
            InpaintingFill::Original => 1,
            InpaintingFill::LatentNoise => 2,
            InpaintingFill::LatentNothing => 3,
        }
    }
}

impl FromStr for InpaintingFill {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        [
            InpaintingFill::Fill,
            InpaintingFill::Original,
            InpaintingFill::LatentNoise,
            InpaintingFill::LatentNothing,
        ]
        .into_iter()
        .find(|fill| fill.as_str().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            Error::invalid_parameter("inpainting_fill", format!("unknown fill mode '{}'", wanted))
        })
    }
}

/// Caller-supplied generation parameters. Every field but the prompt is
/// optional and falls back to a style recommendation or configured default.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub output_path: Option<PathBuf>,
    pub model_name: Option<String>,
    pub vae_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub steps: Option<u32>,
    pub cfg_scale: Option<f64>,
    pub sampler: Option<String>,
    pub seed: Option<i64>,
    pub style: Option<String>,
}

impl GenerationParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// Where an input image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Base64(String),
    Bytes(Vec<u8>),
}

impl ImageSource {
    pub async fn load(&self) -> Result<Vec<u8>> {
        match self {
            ImageSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                Error::invalid_image(format!("cannot read {}: {}", path.display(), e))
            }),
            ImageSource::Base64(data) => {
                // Accept data URLs as well as bare base64.
                let payload = match data.split_once(";base64,") {
                    Some((_, rest)) => rest,
                    None => data.as_str(),
                };
                STANDARD
                    .decode(payload.trim())
                    .map_err(|e| Error::invalid_image(format!("invalid base64 image data: {}", e)))
            }
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Image-to-image specific parameters.
#[derive(Debug, Clone, Default)]
pub struct ImageToImageParams {
    pub source_image: Option<ImageSource>,
    pub mask_image: Option<ImageSource>,
    pub denoising_strength: Option<f64>,
    pub resize_mode: Option<String>,
    pub inpainting_fill: Option<String>,
    pub inpainting_mask_invert: bool,
    pub mask_blur: Option<u32>,
    pub inpaint_full_res: Option<bool>,
    pub inpaint_full_res_padding: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageToImageOptions {
    pub source_image: Vec<u8>,
    pub mask_image: Option<Vec<u8>>,
    pub denoising_strength: f64,
    pub resize_mode: ResizeMode,
    pub inpainting_fill: InpaintingFill,
    pub inpainting_mask_invert: bool,
    pub mask_blur: u32,
    pub inpaint_full_res: bool,
    pub inpaint_full_res_padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationKind {
    TextToImage,
    ImageToImage(ImageToImageOptions),
}

/// A validated request, ready to be sent to the WebUI.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f64,
    pub sampler: Sampler,
    pub seed: Option<i64>,
    pub style: Style,
    pub transparent: bool,
    pub model: String,
    pub vae: Option<String>,
    pub output_path: Option<PathBuf>,
}

impl GenerationRequest {
    pub fn source_image(&self) -> Option<&[u8]> {
        match &self.kind {
            GenerationKind::ImageToImage(options) => Some(&options.source_image),
            GenerationKind::TextToImage => None,
        }
    }

    pub fn denoising_strength(&self) -> Option<f64> {
        match &self.kind {
            GenerationKind::ImageToImage(options) => Some(options.denoising_strength),
            GenerationKind::TextToImage => None,
        }
    }

    pub fn is_image_to_image(&self) -> bool {
        matches!(self.kind, GenerationKind::ImageToImage(_))
    }
}
