mod handlers;
mod types;

pub use handlers::SdWebUiServer;
pub use types::{GenerateImageArgs, GenerationArgs, ImageToImageArgs, PromptSuggestionsArgs};

use crate::{
    Error, Result,
    config::Config,
    generator::ImageGenerator,
    webui::{WebUiApi, WebUiClient},
};
use rmcp::ServiceExt;
use std::sync::Arc;
use tracing::{info, warn};

/// Serves the MCP tools over stdio until the host disconnects.
pub async fn run(config: Config) -> Result<()> {
    let mut client = WebUiClient::new(&config.webui);
    if config.transparent.layer_diffuse {
        info!(
            "LayerDiffuse enabled for transparent images: {}",
            config.transparent.layer_diffuse_method
        );
        client = client.with_layer_diffuse(config.transparent.layer_diffuse_method.clone());
    }

    // Startup continues either way; the WebUI may come up later.
    match client.ping().await {
        Ok(()) => info!("WebUI reachable at {}", client.base_url()),
        Err(e) => warn!("WebUI at {} is not reachable yet: {}", client.base_url(), e),
    }

    let webui: Arc<dyn WebUiApi> = Arc::new(client);
    let generator = ImageGenerator::new(Arc::new(config), webui);
    let server = SdWebUiServer::new(generator);

    info!("Serving MCP over stdio");
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| Error::mcp(format!("Failed to start MCP service: {}", e)))?;

    let reason = service
        .waiting()
        .await
        .map_err(|e| Error::mcp(format!("MCP service stopped unexpectedly: {}", e)))?;
    info!("MCP service stopped: {:?}", reason);

    Ok(())
}
