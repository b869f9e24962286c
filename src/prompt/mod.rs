mod suggestions;

pub use suggestions::{SuggestionCategory, prompt_suggestions};

use crate::style::Style;

pub const TRANSPARENT_BOOSTERS: &str =
    "transparent background, alpha channel, no background, isolated object";
pub const QUALITY_BOOSTERS: &str = "best quality, amazing quality, very aesthetic, absurdres";
pub const BACKGROUND_EXCLUSIONS: [&str; 4] = [
    "background",
    "white background",
    "black background",
    "colored background",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub positive: String,
    pub negative: String,
}

/// Builds the final positive and negative prompts sent to the WebUI.
///
/// Positive: user prompt, style fragment, transparency boosters (when
/// `transparent`), quality boosters. Negative: style fragment, background
/// exclusions (when `transparent`), then the caller's negative prompt.
/// Empty pieces are skipped so the result never contains `", ,"`.
pub fn compose(prompt: &str, negative_prompt: &str, style: Style, transparent: bool) -> ComposedPrompt {
    let template = style.template();

    let mut positive = vec![prompt.trim(), template.positive_fragment];
    if transparent {
        positive.push(TRANSPARENT_BOOSTERS);
    }
    positive.push(QUALITY_BOOSTERS);

    let exclusions = BACKGROUND_EXCLUSIONS.join(", ");
    let mut negative = vec![template.negative_fragment];
    if transparent {
        negative.push(exclusions.as_str());
    }
    negative.push(negative_prompt.trim());

    ComposedPrompt {
        positive: join_fragments(&positive),
        negative: join_fragments(&negative),
    }
}

fn join_fragments(fragments: &[&str]) -> String {
    fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
