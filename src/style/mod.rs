//! Built-in style templates.
//!
//! Each [`Style`] maps to a static [`StyleTemplate`] holding the prompt
//! fragments it contributes and the sampler settings it works best with.

use crate::request::Sampler;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    None,
    AnimeCharacter,
    RealisticPortrait,
    FantasyArt,
    ModernStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleTemplate {
    pub name: Style,
    pub positive_fragment: &'static str,
    pub negative_fragment: &'static str,
    pub sampler: Option<Sampler>,
    pub steps: Option<u32>,
    pub cfg_scale: Option<f64>,
}

static TEMPLATES: [StyleTemplate; 5] = [
    StyleTemplate {
        name: Style::None,
        positive_fragment: "",
        negative_fragment: "",
        sampler: None,
        steps: None,
        cfg_scale: None,
    },
    StyleTemplate {
        name: Style::AnimeCharacter,
        positive_fragment: "anime style, cel shading, vibrant colors, 1girl, beautiful detailed eyes, \
                            detailed hair, expressive face",
        negative_fragment: "realistic, photo, 3d render, bad proportions, extra limbs",
        sampler: Some(Sampler::DpmPp2MKarras),
        steps: Some(28),
        cfg_scale: Some(9.0),
    },
    StyleTemplate {
        name: Style::RealisticPortrait,
        positive_fragment: "photorealistic, realistic skin texture, professional portrait photography, \
                            soft studio lighting, 85mm lens, sharp focus",
        negative_fragment: "anime, cartoon, drawing, painting, illustration, plastic skin, deformed iris",
        sampler: Some(Sampler::DpmPpSdeKarras),
        steps: Some(35),
        cfg_scale: Some(6.5),
    },
    StyleTemplate {
        name: Style::FantasyArt,
        positive_fragment: "fantasy character, epic fantasy art, digital painting, intricate details, \
                            dramatic lighting, magical atmosphere",
        negative_fragment: "modern clothing, photo, flat colors",
        sampler: Some(Sampler::DpmPp2M),
        steps: Some(30),
        cfg_scale: Some(8.0),
    },
    StyleTemplate {
        name: Style::ModernStyle,
        positive_fragment: "modern character, casual contemporary fashion, urban setting, clean lines",
        negative_fragment: "",
        sampler: Some(Sampler::EulerA),
        steps: Some(25),
        cfg_scale: Some(7.0),
    },
];

impl Style {
    pub const ALL: [Style; 5] = [
        Style::None,
        Style::AnimeCharacter,
        Style::RealisticPortrait,
        Style::FantasyArt,
        Style::ModernStyle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Style::None => "none",
            Style::AnimeCharacter => "anime_character",
            Style::RealisticPortrait => "realistic_portrait",
            Style::FantasyArt => "fantasy_art",
            Style::ModernStyle => "modern_style",
        }
    }

    pub fn template(self) -> &'static StyleTemplate {
        match self {
            Style::None => &TEMPLATES[0],
            Style::AnimeCharacter => &TEMPLATES[1],
            Style::RealisticPortrait => &TEMPLATES[2],
            Style::FantasyArt => &TEMPLATES[3],
            Style::ModernStyle => &TEMPLATES[4],
        }
    }

    /// Looks up a style by name. Unknown names fall back to [`Style::None`].
    pub fn lookup(name: &str) -> Style {
        let normalized = name.trim().to_ascii_lowercase();
        match Style::ALL.iter().find(|style| style.name() == normalized) {
            Some(style) => *style,
            None => {
                if !normalized.is_empty() {
                    warn!("Unknown style '{}', falling back to 'none'", name);
                }
                Style::None
            }
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
