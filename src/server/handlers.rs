use super::types::{GenerateImageArgs, ImageToImageArgs, PromptSuggestionsArgs};
use crate::{Error, generator::ImageGenerator, prompt::SuggestionCategory};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{
        CallToolResult, Content, ErrorData as McpError, Implementation, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use tracing::{error, info, warn};

/// MCP tool surface over an [`ImageGenerator`].
#[derive(Clone)]
pub struct SdWebUiServer {
    generator: ImageGenerator,
    tool_router: ToolRouter<Self>,
}

/// Validation errors are the caller's to fix, so they surface as protocol
/// errors. Everything else is reported as a failed tool call.
fn into_tool_result(tool: &str, result: crate::Result<String>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(text) => {
            info!("{} completed", tool);
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
        Err(e) if e.is_validation() => {
            warn!("{} rejected: {}", tool, e);
            Err(McpError::invalid_params(e.to_string(), None))
        }
        Err(e) => {
            error!("{} failed: {}", tool, e);
            Ok(CallToolResult::error(vec![Content::text(format!("{} failed: {}", tool, e))]))
        }
    }
}

#[tool_router]
impl SdWebUiServer {
    pub fn new(generator: ImageGenerator) -> Self {
        Self {
            generator,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Generate an image from a text prompt with Stable Diffusion WebUI. Set transparent_background for a PNG with the background removed."
    )]
    async fn generate_image(
        &self,
        Parameters(args): Parameters<GenerateImageArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("generate_image: {}", args.generation.prompt);
        let transparent = args.transparent_background.unwrap_or(false);
        let params = args.into_params();
        let result = if transparent {
            self.generator.generate_transparent_image(params).await
        } else {
            self.generator.generate_text_to_image(params).await
        };
        into_tool_result("generate_image", result.map(|summary| summary.to_string()))
    }

    #[tool(description = "Generate a PNG image with a transparent background, suitable for stickers, icons and game sprites.")]
    async fn generate_transparent_image(
        &self,
        Parameters(args): Parameters<GenerateImageArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("generate_transparent_image: {}", args.generation.prompt);
        let result = self
            .generator
            .generate_transparent_image(args.into_params())
            .await;
        into_tool_result(
            "generate_transparent_image",
            result.map(|summary| summary.to_string()),
        )
    }

    #[tool(
        description = "Transform an existing image guided by a prompt (img2img). Supply a mask image to repaint only part of it."
    )]
    async fn generate_image_img2img(
        &self,
        Parameters(args): Parameters<ImageToImageArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("generate_image_img2img: {}", args.generation.prompt);
        let (params, options) = args.into_params();
        let result = self.generator.generate_image_to_image(params, options).await;
        into_tool_result(
            "generate_image_img2img",
            result.map(|summary| summary.to_string()),
        )
    }

    #[tool(description = "List the checkpoints installed in the WebUI and show which one is loaded.")]
    async fn get_models(&self) -> Result<CallToolResult, McpError> {
        let result = self.generator.list_models().await;
        into_tool_result("get_models", result.map(|listing| listing.to_string()))
    }

    #[tool(description = "Show the loaded checkpoint, VAE, CLIP skip, ControlNet status and system information.")]
    async fn get_model_details(&self) -> Result<CallToolResult, McpError> {
        let result = self.generator.model_details().await;
        into_tool_result("get_model_details", result.map(|details| details.to_string()))
    }

    #[tool(description = "Recommend sampler, steps and CFG scale for the loaded checkpoint.")]
    async fn get_model_recommendations(&self) -> Result<CallToolResult, McpError> {
        let recommendation = self.generator.model_recommendations().await;
        into_tool_result("get_model_recommendations", Ok(recommendation.to_string()))
    }

    #[tool(description = "Prompt-writing help: character, style, quality and negative prompt suggestions.")]
    async fn get_prompt_suggestions(
        &self,
        Parameters(args): Parameters<PromptSuggestionsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let category = match args.category.as_deref() {
            None => SuggestionCategory::All,
            Some(name) => SuggestionCategory::parse(name).ok_or_else(|| {
                McpError::invalid_params(
                    Error::invalid_parameter("category", format!("unknown category '{}'", name)).to_string(),
                    None,
                )
            })?,
        };
        let suggestions = self.generator.prompt_suggestions(category);
        let text = serde_json::to_string_pretty(&suggestions).map_err(Error::from);
        into_tool_result("get_prompt_suggestions", text)
    }
}

#[tool_handler]
impl ServerHandler for SdWebUiServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "Generates images through a local Stable Diffusion WebUI. Images are written to disk and the tool result reports the saved path and generation settings."
                    .into(),
            ),
            ..Default::default()
        }
    }
}
