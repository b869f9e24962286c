mod info;

pub use info::{
    ModelDetails, ModelEntry, ModelFamily, ModelListing, ModelRecommendation, SystemSummary,
};

use crate::{
    Result,
    config::Config,
    output::{OutputWriter, TransparencyReport},
    request::{GenerationParams, GenerationRequest, ImageToImageParams, RequestBuilder, Sampler},
    style::Style,
    webui::WebUiApi,
};
use serde_json::{Map, Value, json};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Entry point for every generation and model query.
///
/// Cheap to clone; each call runs independently and shares only the
/// immutable configuration.
#[derive(Clone)]
pub struct ImageGenerator {
    config: Arc<Config>,
    webui: Arc<dyn WebUiApi>,
    writer: OutputWriter,
}

/// What a successful generation produced.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub output_path: PathBuf,
    pub seed_used: i64,
    pub elapsed: Duration,
    pub bytes_written: u64,
    pub model: String,
    pub sampler: Sampler,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f64,
    pub style: Style,
    pub prompt: String,
    pub negative_prompt: String,
    pub denoising_strength: Option<f64>,
    pub transparency: Option<TransparencyReport>,
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Image saved to {}", self.output_path.display())?;
        writeln!(f, "Size: {}x{} ({} bytes)", self.width, self.height, self.bytes_written)?;
        writeln!(f, "Model: {}", self.model)?;
        writeln!(
            f,
            "Sampler: {}, steps: {}, CFG scale: {}",
            self.sampler, self.steps, self.cfg_scale
        )?;
        writeln!(f, "Seed: {}", self.seed_used)?;
        if self.style != Style::None {
            writeln!(f, "Style: {}", self.style)?;
        }
        if let Some(strength) = self.denoising_strength {
            writeln!(f, "Denoising strength: {}", strength)?;
        }
        if let Some(report) = &self.transparency {
            let verdict = if report.is_effective() {
                "transparent background"
            } else {
                "background may not be transparent"
            };
            writeln!(
                f,
                "Transparency: {} ({:.1}% transparent pixels, {})",
                verdict, report.transparent_percent, report.strategy
            )?;
        }
        writeln!(f, "Elapsed: {:.1}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "Prompt: {}", self.prompt)?;
        write!(f, "Negative prompt: {}", self.negative_prompt)
    }
}

impl ImageGenerator {
    pub fn new(config: Arc<Config>, webui: Arc<dyn WebUiApi>) -> Self {
        let writer = OutputWriter::from_config(&config);
        Self {
            config,
            webui,
            writer,
        }
    }

    pub fn with_writer(mut self, writer: OutputWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.config.webui, &self.config.defaults)
    }

    pub async fn generate_text_to_image(&self, params: GenerationParams) -> Result<GenerationSummary> {
        let request = self.builder().text_to_image(&params, false)?;
        self.run(request, "txt2img").await
    }

    /// Text-to-image with a transparent background. The output is always PNG.
    pub async fn generate_transparent_image(&self, params: GenerationParams) -> Result<GenerationSummary> {
        let request = self.builder().text_to_image(&params, true)?;
        self.run(request, "transparent").await
    }

    pub async fn generate_image_to_image(
        &self,
        params: GenerationParams,
        options: ImageToImageParams,
    ) -> Result<GenerationSummary> {
        let source = match &options.source_image {
            Some(source) => Some(source.load().await?),
            None => None,
        };
        let mask = match &options.mask_image {
            Some(mask) => Some(mask.load().await?),
            None => None,
        };

        let request = self.builder().image_to_image(&params, &options, source, mask)?;
        self.run(request, "img2img").await
    }

    async fn run(&self, request: GenerationRequest, prefix: &str) -> Result<GenerationSummary> {
        let path = self
            .writer
            .resolve_path(request.output_path.as_deref(), prefix, request.transparent)?;
        debug!("Output will be written to {}", path.display());

        if self.config.webui.switch_checkpoint {
            self.ensure_checkpoint(&request.model, request.vae.as_deref()).await;
        }

        let result = self.webui.dispatch(&request).await?;

        let written = if request.transparent {
            self.writer.write_transparent(&path, result.image_bytes).await?
        } else {
            self.writer.write(&path, result.image_bytes).await?
        };

        Ok(GenerationSummary {
            output_path: written.path,
            seed_used: result.seed_used,
            elapsed: result.elapsed,
            bytes_written: written.bytes_written,
            denoising_strength: request.denoising_strength(),
            model: request.model,
            sampler: request.sampler,
            width: request.width,
            height: request.height,
            steps: request.steps,
            cfg_scale: request.cfg_scale,
            style: request.style,
            prompt: request.prompt,
            negative_prompt: request.negative_prompt,
            transparency: written.transparency,
        })
    }

    /// Loads the requested checkpoint (and VAE) if the WebUI has something
    /// else selected. Never fails the generation.
    async fn ensure_checkpoint(&self, model: &str, vae: Option<&str>) {
        let options = match self.webui.options().await {
            Ok(options) => options,
            Err(e) => {
                warn!("Could not read WebUI options, skipping checkpoint switch: {}", e);
                return;
            }
        };

        let mut changes = Map::new();
        if !options.checkpoint().contains(model) {
            info!(
                "Switching checkpoint from '{}' to '{}'",
                options.checkpoint(),
                model
            );
            changes.insert("sd_model_checkpoint".into(), json!(model));
        }
        if let Some(vae) = vae
            && options.vae() != vae
        {
            info!("Switching VAE from '{}' to '{}'", options.vae(), vae);
            changes.insert("sd_vae".into(), json!(vae));
        }

        if changes.is_empty() {
            debug!("Checkpoint '{}' already loaded", model);
            return;
        }
        if let Err(e) = self.webui.set_options(Value::Object(changes)).await {
            warn!("Checkpoint switch failed, generating with the current model: {}", e);
        }
    }
}
