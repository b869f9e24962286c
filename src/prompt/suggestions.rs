use crate::request::Sampler;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    #[default]
    All,
    Characters,
    Styles,
    Negative,
    Quality,
    Samplers,
    SceneBackgrounds,
    ClothingAccessories,
    EnvironmentTags,
    TechnicalParameters,
}

impl SuggestionCategory {
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.trim().to_ascii_lowercase())).ok()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Characters => "characters",
            Self::Styles => "styles",
            Self::Negative => "negative",
            Self::Quality => "quality",
            Self::Samplers => "samplers",
            Self::SceneBackgrounds => "scene_backgrounds",
            Self::ClothingAccessories => "clothing_accessories",
            Self::EnvironmentTags => "environment_tags",
            Self::TechnicalParameters => "technical_parameters",
        }
    }

    fn includes(self, other: SuggestionCategory) -> bool {
        self == Self::All || self == other
    }
}

/// Prompt-help catalog for one category, as a JSON object.
pub fn prompt_suggestions(category: SuggestionCategory) -> Value {
    let mut out = Map::new();
    let samplers: Vec<&str> = Sampler::ALL.iter().take(10).map(|s| s.as_str()).collect();
    out.insert("available_samplers".into(), json!(samplers));
    out.insert(
        "current_time".into(),
        json!(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
    );

    let sections: [(SuggestionCategory, &str, fn() -> Value); 8] = [
        (SuggestionCategory::Characters, "character_prompts", character_prompts),
        (SuggestionCategory::Styles, "style_modifiers", style_modifiers),
        (SuggestionCategory::Negative, "negative_prompts", negative_prompts),
        (SuggestionCategory::Quality, "quality_enhancers", quality_enhancers),
        (SuggestionCategory::SceneBackgrounds, "scene_backgrounds", scene_backgrounds),
        (SuggestionCategory::ClothingAccessories, "clothing_accessories", clothing_accessories),
        (SuggestionCategory::EnvironmentTags, "environment_tags", environment_tags),
        (SuggestionCategory::TechnicalParameters, "technical_parameters", technical_parameters),
    ];
    for (section, key, build) in sections {
        if category.includes(section) {
            out.insert(key.into(), build());
        }
    }

    if category == SuggestionCategory::Samplers {
        out.insert(
            "sampler_recommendations".into(),
            json!({
                "fast": ["Euler a", "Euler", "LMS"],
                "quality": ["DPM++ 2M", "DPM++ SDE", "DPM++ 2M Karras"],
                "creative": ["DDIM", "PLMS", "UniPC"],
            }),
        );
    }

    Value::Object(out)
}

fn character_prompts() -> Value {
    json!({
        "anime_girl": "1girl, solo, long hair, beautiful detailed eyes, blush, smile",
        "anime_boy": "1boy, solo, short hair, detailed eyes, confident expression",
        "fantasy_character": "elf, pointed ears, flowing robes, mystical aura",
        "modern_character": "casual outfit, street fashion, natural pose",
        "chibi": "chibi, super deformed, big head, cute",
    })
}

fn style_modifiers() -> Value {
    json!({
        "anime_style": "anime style, cel shading, vibrant colors",
        "realistic_style": "photorealistic, realistic lighting, detailed skin texture",
        "artistic_style": "digital painting, concept art, painterly brush strokes",
        "watercolor": "watercolor, soft edges, paper texture",
        "pixel_art": "pixel art, 16-bit, limited palette",
    })
}

fn negative_prompts() -> Value {
    json!({
        "general": "lowres, bad anatomy, bad hands, text, error, missing fingers, extra digit, \
                    fewer digits, cropped, worst quality, low quality, normal quality, jpeg artifacts, \
                    signature, watermark, username, blurry",
        "anime": "realistic, photo, 3d render, bad proportions, extra limbs",
        "realistic": "anime, cartoon, drawing, painting, plastic skin, deformed iris",
        "transparent": "background, white background, black background, colored background",
    })
}

fn quality_enhancers() -> Value {
    json!({
        "high_quality": "masterpiece, best quality, highly detailed",
        "booster": "best quality, amazing quality, very aesthetic, absurdres",
        "lighting": "cinematic lighting, volumetric light, rim light",
    })
}

fn scene_backgrounds() -> Value {
    json!({
        "nature": ["forest", "flower field", "beach at sunset", "mountain lake"],
        "urban": ["city street at night", "rooftop", "cafe interior", "train station"],
        "fantasy": ["floating islands", "ancient ruins", "crystal cave", "castle hall"],
        "simple": ["simple background", "white background", "gradient background"],
    })
}

fn clothing_accessories() -> Value {
    json!({
        "casual": ["hoodie", "t-shirt", "jeans", "sneakers"],
        "formal": ["suit", "evening dress", "necktie", "high heels"],
        "fantasy": ["armor", "cloak", "wizard hat", "circlet"],
        "accessories": ["glasses", "earrings", "scarf", "hair ribbon"],
    })
}

fn environment_tags() -> Value {
    json!({
        "time_of_day": ["morning", "golden hour", "night", "twilight"],
        "weather": ["rain", "snow", "fog", "clear sky"],
        "mood": ["peaceful", "dramatic", "melancholic", "cheerful"],
    })
}

fn technical_parameters() -> Value {
    json!({
        "resolutions": ["512x512", "512x768", "768x512", "1024x1024"],
        "steps": {"draft": "15-20", "standard": "20-30", "detailed": "30-50"},
        "cfg_scale": {"loose": "4-6", "balanced": "7-9", "strict": "10-14"},
        "denoising_strength": {"subtle": "0.3-0.5", "balanced": "0.5-0.75", "heavy": "0.75-1.0"},
    })
}
