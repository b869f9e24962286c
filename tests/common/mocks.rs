use async_trait::async_trait;
use sd_webui_mcp::{
    Error, Result,
    request::GenerationRequest,
    webui::{GenerationResult, SdModel, SdVae, WebUiApi, WebUiOptions},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock WebUI for testing the generator without HTTP
#[derive(Debug, Clone)]
pub struct MockWebUi {
    pub image: Vec<u8>,
    pub seed: i64,
    pub requests: Arc<Mutex<Vec<GenerationRequest>>>,
    pub options: Arc<Mutex<WebUiOptions>>,
    pub option_updates: Arc<Mutex<Vec<Value>>>,
    pub models: Vec<SdModel>,
    pub error: Option<String>,
    pub options_error: bool,
}

impl MockWebUi {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            seed: 42,
            requests: Arc::new(Mutex::new(Vec::new())),
            options: Arc::new(Mutex::new(WebUiOptions::default())),
            option_updates: Arc::new(Mutex::new(Vec::new())),
            models: Vec::new(),
            error: None,
            options_error: false,
        }
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_checkpoint(self, checkpoint: &str) -> Self {
        self.options
            .lock()
            .unwrap()
            .0
            .insert("sd_model_checkpoint".into(), json!(checkpoint));
        self
    }

    pub fn with_models(mut self, models: Vec<SdModel>) -> Self {
        self.models = models;
        self
    }

    pub fn with_options_error(mut self) -> Self {
        self.options_error = true;
        self
    }

    pub fn get_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn get_option_updates(&self) -> Vec<Value> {
        self.option_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebUiApi for MockWebUi {
    async fn dispatch(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(ref error) = self.error {
            return Err(Error::ServiceUnavailable {
                attempts: 1,
                last_error: error.clone(),
            });
        }

        Ok(GenerationResult {
            image_bytes: self.image.clone(),
            seed_used: request.seed.unwrap_or(self.seed),
            elapsed: Duration::from_millis(10),
            raw_metadata: json!({"seed": self.seed}),
        })
    }

    async fn options(&self) -> Result<WebUiOptions> {
        if self.options_error {
            return Err(Error::ServiceUnavailable {
                attempts: 1,
                last_error: "options unavailable".to_string(),
            });
        }
        Ok(self.options.lock().unwrap().clone())
    }

    async fn set_options(&self, options: Value) -> Result<()> {
        self.option_updates.lock().unwrap().push(options.clone());
        if let Value::Object(map) = options {
            self.options.lock().unwrap().0.extend(map);
        }
        Ok(())
    }

    async fn models(&self) -> Result<Vec<SdModel>> {
        Ok(self.models.clone())
    }

    async fn vaes(&self) -> Result<Vec<SdVae>> {
        Ok(vec![SdVae {
            model_name: "vae-ft-mse-840000".to_string(),
            filename: "vae-ft-mse-840000.safetensors".to_string(),
        }])
    }

    async fn hypernetworks(&self) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn system_info(&self) -> Result<Value> {
        Err(Error::ServiceUnavailable {
            attempts: 1,
            last_error: "HTTP 404".to_string(),
        })
    }

    async fn controlnet_models(&self) -> Result<Vec<String>> {
        Err(Error::BadRequest {
            status: 404,
            body: "Not Found".to_string(),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Create a mock checkpoint entry
pub fn create_mock_model(name: &str, hash: &str) -> SdModel {
    SdModel {
        title: format!("{}.safetensors [{}]", name, hash),
        model_name: name.to_string(),
        hash: Some(hash.to_string()),
        sha256: None,
        filename: format!("/models/Stable-diffusion/{}.safetensors", name),
        config: None,
    }
}
