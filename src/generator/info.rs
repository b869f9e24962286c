use super::ImageGenerator;
use crate::{Result, prompt::SuggestionCategory, webui::SdModel};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    pub title: String,
    pub model_name: String,
    pub filename: String,
    pub short_hash: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelListing {
    pub current_model: String,
    pub hypernetwork_count: usize,
    pub models: Vec<ModelEntry>,
}

impl fmt::Display for ModelListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Available models ({}):", self.models.len())?;
        writeln!(f, "Current model: {}", self.current_model)?;
        writeln!(f, "Hypernetworks: {}", self.hypernetwork_count)?;
        for (i, model) in self.models.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{}. {}", i + 1, model.title)?;
            if model.is_current {
                write!(f, " [current]")?;
            }
            writeln!(f)?;
            writeln!(f, "   file: {}", model.filename)?;
            write!(f, "   hash: {}", model.short_hash)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSummary {
    pub python_version: String,
    pub torch_version: String,
    pub cuda_available: bool,
    pub gpu_count: u64,
}

impl SystemSummary {
    /// Reads the handful of fields worth reporting. Key names vary between
    /// WebUI versions, so a couple of spellings are tried for each.
    fn from_system_info(info: &Value) -> Self {
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| info.get(*key).and_then(Value::as_str))
                .unwrap_or("unknown")
                .to_string()
        };
        Self {
            python_version: text(&["python_version", "Python"]),
            torch_version: text(&["torch_version", "Torch"]),
            cuda_available: info
                .get("cuda_available")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            gpu_count: info.get("gpu_count").and_then(Value::as_u64).unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelDetails {
    pub current_model: String,
    pub vae: String,
    pub clip_skip: i64,
    pub eta_noise_seed_delta: i64,
    pub system: SystemSummary,
    pub vaes: Vec<String>,
    pub controlnet_available: bool,
    pub controlnet_models: Vec<String>,
}

impl fmt::Display for ModelDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current model: {}", self.current_model)?;
        writeln!(f, "VAE: {}", if self.vae.is_empty() { "None" } else { &self.vae })?;
        writeln!(f, "CLIP skip: {}", self.clip_skip)?;
        writeln!(f, "ETA noise seed delta: {}", self.eta_noise_seed_delta)?;

        if self.controlnet_available {
            writeln!(f, "ControlNet: available ({} models)", self.controlnet_models.len())?;
            for (i, model) in self.controlnet_models.iter().take(3).enumerate() {
                writeln!(f, "   {}. {}", i + 1, model)?;
            }
            if self.controlnet_models.len() > 3 {
                writeln!(f, "   ... and {} more", self.controlnet_models.len() - 3)?;
            }
        } else {
            writeln!(f, "ControlNet: not installed")?;
        }

        if !self.vaes.is_empty() {
            writeln!(f, "Available VAEs ({}):", self.vaes.len())?;
            for (i, vae) in self.vaes.iter().take(5).enumerate() {
                writeln!(f, "   {}. {}", i + 1, vae)?;
            }
            if self.vaes.len() > 5 {
                writeln!(f, "   ... and {} more", self.vaes.len() - 5)?;
            }
        }

        writeln!(f, "System:")?;
        writeln!(f, "   Python: {}", self.system.python_version)?;
        writeln!(f, "   PyTorch: {}", self.system.torch_version)?;
        writeln!(f, "   CUDA available: {}", self.system.cuda_available)?;
        write!(f, "   GPUs: {}", self.system.gpu_count)
    }
}

/// Broad checkpoint families, guessed from the checkpoint name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Anime,
    Realistic,
    Artistic,
    General,
}

struct FamilyProfile {
    family: ModelFamily,
    keywords: &'static [&'static str],
    samplers: &'static [&'static str],
    cfg_scale: &'static str,
    steps: &'static str,
    description: &'static str,
}

static PROFILES: [FamilyProfile; 3] = [
    FamilyProfile {
        family: ModelFamily::Anime,
        keywords: &["anything", "anime", "nai"],
        samplers: &["DPM++ 2M Karras", "Euler a", "DDIM"],
        cfg_scale: "7-12",
        steps: "20-30",
        description: "Anime checkpoint, suited to illustrated characters and scenes",
    },
    FamilyProfile {
        family: ModelFamily::Realistic,
        keywords: &["realistic", "photo", "real"],
        samplers: &["DPM++ SDE Karras", "DPM++ 2M Karras", "Heun"],
        cfg_scale: "5-8",
        steps: "30-50",
        description: "Photorealistic checkpoint, suited to lifelike people and places",
    },
    FamilyProfile {
        family: ModelFamily::Artistic,
        keywords: &["art", "painting", "illustration"],
        samplers: &["DDIM", "PLMS", "UniPC"],
        cfg_scale: "6-10",
        steps: "25-40",
        description: "Artistic checkpoint, suited to painterly work",
    },
];

const BEST_PRACTICES: [&str; 6] = [
    "DPM++ samplers favour quality; Euler samplers favour speed",
    "CFG scale 7-9 is a balanced range; higher oversaturates, lower blurs",
    "20-30 steps is usually enough",
    "A targeted negative prompt improves results noticeably",
    "Pick a VAE that matches the checkpoint for better colour",
    "Start at 512x512 or 512x768 before trying larger sizes",
];

const PERFORMANCE_TIPS: [&str; 3] = [
    "Launch the WebUI with --xformers or --opt-sdp-attention",
    "Keep CUDA and GPU drivers up to date",
    "Size batches to the available GPU memory",
];

impl ModelFamily {
    /// Classifies a checkpoint name by keyword; unknown names are `General`.
    pub fn classify(checkpoint: &str) -> Self {
        let lower = checkpoint.to_lowercase();
        PROFILES
            .iter()
            .find(|profile| profile.keywords.iter().any(|kw| lower.contains(kw)))
            .map(|profile| profile.family)
            .unwrap_or(ModelFamily::General)
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelFamily::Anime => "anime",
            ModelFamily::Realistic => "realistic",
            ModelFamily::Artistic => "artistic",
            ModelFamily::General => "general",
        }
    }

    fn profile(self) -> Option<&'static FamilyProfile> {
        PROFILES.iter().find(|profile| profile.family == self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelRecommendation {
    pub current_model: String,
    pub family: ModelFamily,
    pub description: Option<&'static str>,
    pub samplers: Vec<&'static str>,
    pub cfg_scale: Option<&'static str>,
    pub steps: Option<&'static str>,
    pub best_practices: Vec<&'static str>,
    pub performance_tips: Vec<&'static str>,
}

impl ModelRecommendation {
    pub fn for_checkpoint(checkpoint: &str) -> Self {
        let family = ModelFamily::classify(checkpoint);
        let profile = family.profile();
        Self {
            current_model: checkpoint.to_string(),
            family,
            description: profile.map(|p| p.description),
            samplers: profile.map(|p| p.samplers.to_vec()).unwrap_or_default(),
            cfg_scale: profile.map(|p| p.cfg_scale),
            steps: profile.map(|p| p.steps),
            best_practices: BEST_PRACTICES.to_vec(),
            performance_tips: PERFORMANCE_TIPS.to_vec(),
        }
    }
}

impl fmt::Display for ModelRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model family: {}", self.family.name().to_uppercase())?;
        writeln!(f, "Current model: {}", self.current_model)?;
        if let Some(description) = self.description {
            writeln!(f)?;
            writeln!(f, "{}", description)?;
            writeln!(f, "Recommended settings:")?;
            let samplers: Vec<_> = self.samplers.iter().take(2).copied().collect();
            writeln!(f, "   Samplers: {}", samplers.join(", "))?;
            writeln!(f, "   CFG scale: {}", self.cfg_scale.unwrap_or("7-9"))?;
            writeln!(f, "   Steps: {}", self.steps.unwrap_or("20-30"))?;
        }
        writeln!(f)?;
        writeln!(f, "Best practices:")?;
        for tip in &self.best_practices {
            writeln!(f, "- {}", tip)?;
        }
        writeln!(f)?;
        write!(f, "Performance:")?;
        for tip in &self.performance_tips {
            write!(f, "\n- {}", tip)?;
        }
        Ok(())
    }
}

impl ImageGenerator {
    pub async fn list_models(&self) -> Result<ModelListing> {
        let models = self.webui.models().await?;
        let current_model = self.webui.options().await?.checkpoint().to_string();
        let hypernetwork_count = match self.webui.hypernetworks().await {
            Ok(list) => list.len(),
            Err(e) => {
                debug!("Hypernetwork listing unavailable: {}", e);
                0
            }
        };

        let models = models
            .iter()
            .map(|model: &SdModel| ModelEntry {
                title: model.title.clone(),
                model_name: model.model_name.clone(),
                filename: model.filename.clone(),
                short_hash: model.short_hash().to_string(),
                is_current: !model.model_name.is_empty() && current_model.contains(&model.model_name),
            })
            .collect();

        Ok(ModelListing {
            current_model,
            hypernetwork_count,
            models,
        })
    }

    /// Current WebUI setup. Only the options read is required; the other
    /// queries degrade to empty values when the WebUI lacks them.
    pub async fn model_details(&self) -> Result<ModelDetails> {
        let options = self.webui.options().await?;

        let system = match self.webui.system_info().await {
            Ok(info) => SystemSummary::from_system_info(&info),
            Err(e) => {
                debug!("System info unavailable: {}", e);
                SystemSummary::default()
            }
        };
        let vaes = match self.webui.vaes().await {
            Ok(vaes) => vaes.into_iter().map(|vae| vae.model_name).collect(),
            Err(e) => {
                debug!("VAE listing unavailable: {}", e);
                Vec::new()
            }
        };
        let (controlnet_available, controlnet_models) = match self.webui.controlnet_models().await {
            Ok(models) => (true, models),
            Err(e) => {
                debug!("ControlNet not available: {}", e);
                (false, Vec::new())
            }
        };

        Ok(ModelDetails {
            current_model: options.checkpoint().to_string(),
            vae: options.vae().to_string(),
            clip_skip: options.clip_skip(),
            eta_noise_seed_delta: options.eta_noise_seed_delta(),
            system,
            vaes,
            controlnet_available,
            controlnet_models,
        })
    }

    /// Recommendations for the loaded checkpoint. An unreachable WebUI just
    /// yields the general advice.
    pub async fn model_recommendations(&self) -> ModelRecommendation {
        let checkpoint = match self.webui.options().await {
            Ok(options) => options.checkpoint().to_string(),
            Err(e) => {
                warn!("Could not read current checkpoint: {}", e);
                String::new()
            }
        };
        ModelRecommendation::for_checkpoint(&checkpoint)
    }

    pub fn prompt_suggestions(&self, category: SuggestionCategory) -> Value {
        crate::prompt::prompt_suggestions(category)
    }
}
