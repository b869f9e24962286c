use pretty_assertions::assert_eq;
use sd_webui_mcp::{
    Error,
    generator::{ImageGenerator, ModelFamily},
    request::{GenerationKind, GenerationParams, ImageSource, ImageToImageParams},
    style::Style,
    webui::WebUiApi,
};
use std::path::PathBuf;
use std::sync::Arc;

mod common;
use common::{
    MockWebUi, TEST_MODEL, create_mock_model, create_temp_dir, create_test_config, png_on_white,
    png_with_alpha,
};

fn generator_with(mock: &MockWebUi, dir: &tempfile::TempDir, switch_checkpoint: bool) -> ImageGenerator {
    let mut config = create_test_config("http://127.0.0.1:7860", dir.path());
    config.webui.switch_checkpoint = switch_checkpoint;
    let webui: Arc<dyn WebUiApi> = Arc::new(mock.clone());
    ImageGenerator::new(Arc::new(config), webui)
}

#[tokio::test]
async fn test_text_to_image_writes_and_reports() {
    let mock = MockWebUi::new(png_on_white(32, 32)).with_seed(1234);
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let summary = generator
        .generate_text_to_image(GenerationParams::new("a red fox"))
        .await
        .unwrap();

    assert_eq!(summary.seed_used, 1234);
    assert_eq!(summary.style, Style::None);
    assert!(summary.transparency.is_none());
    assert_eq!(std::fs::read(&summary.output_path).unwrap(), png_on_white(32, 32));

    let requests = mock.get_requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].transparent);
    assert_eq!(requests[0].kind, GenerationKind::TextToImage);
}

#[tokio::test]
async fn test_explicit_seed_is_reported_back() {
    let mock = MockWebUi::new(png_on_white(16, 16));
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let params = GenerationParams {
        seed: Some(99),
        ..GenerationParams::new("a red fox")
    };
    let summary = generator.generate_text_to_image(params).await.unwrap();
    assert_eq!(summary.seed_used, 99);
}

#[tokio::test]
async fn test_validation_failure_skips_dispatch() {
    let mock = MockWebUi::new(png_on_white(16, 16));
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, true);

    let params = GenerationParams {
        width: Some(10_000),
        ..GenerationParams::new("a red fox")
    };
    let err = generator.generate_text_to_image(params).await.unwrap_err();

    assert_eq!(err.field(), Some("width"));
    assert!(mock.get_requests().is_empty());
    assert!(mock.get_option_updates().is_empty());
}

#[tokio::test]
async fn test_transparent_output_forced_to_png() {
    let mock = MockWebUi::new(png_on_white(32, 32));
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let params = GenerationParams {
        output_path: Some(PathBuf::from("sticker.jpg")),
        ..GenerationParams::new("a sticker of a frog")
    };
    let summary = generator.generate_transparent_image(params).await.unwrap();

    assert_eq!(summary.output_path, dir.path().join("sticker.png"));
    assert!(!dir.path().join("sticker.jpg").exists());
    assert!(mock.get_requests()[0].transparent);
}

#[tokio::test]
async fn test_native_alpha_bytes_are_untouched() {
    let mock = MockWebUi::new(png_with_alpha(32, 32));
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let summary = generator
        .generate_transparent_image(GenerationParams::new("a gem"))
        .await
        .unwrap();

    let report = summary.transparency.unwrap();
    assert!(report.native_alpha);
    assert_eq!(std::fs::read(&summary.output_path).unwrap(), png_with_alpha(32, 32));
}

#[tokio::test]
async fn test_service_failure_propagates_without_file() {
    let mock = MockWebUi::new(png_on_white(16, 16)).with_error("HTTP 500: boom");
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let params = GenerationParams {
        output_path: Some(PathBuf::from("out.png")),
        ..GenerationParams::new("a red fox")
    };
    let err = generator.generate_text_to_image(params).await.unwrap_err();

    assert!(matches!(err, Error::ServiceUnavailable { .. }));
    assert!(!dir.path().join("out.png").exists());
}

#[tokio::test]
async fn test_checkpoint_switch_only_when_needed() {
    let mock = MockWebUi::new(png_on_white(16, 16)).with_checkpoint("v1-5-pruned.safetensors [6ce0161689]");
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, true);

    generator
        .generate_text_to_image(GenerationParams::new("first"))
        .await
        .unwrap();
    generator
        .generate_text_to_image(GenerationParams::new("second"))
        .await
        .unwrap();

    let updates = mock.get_option_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["sd_model_checkpoint"], TEST_MODEL);
}

#[tokio::test]
async fn test_requested_vae_is_switched() {
    let mock = MockWebUi::new(png_on_white(16, 16)).with_checkpoint(TEST_MODEL);
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, true);

    let params = GenerationParams {
        vae_name: Some("kl-f8-anime2.ckpt".into()),
        ..GenerationParams::new("a girl")
    };
    generator.generate_text_to_image(params).await.unwrap();

    let updates = mock.get_option_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["sd_vae"], "kl-f8-anime2.ckpt");
    assert!(updates[0].get("sd_model_checkpoint").is_none());
}

#[tokio::test]
async fn test_unreadable_options_do_not_block_generation() {
    let mock = MockWebUi::new(png_on_white(16, 16)).with_options_error();
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, true);

    let summary = generator
        .generate_text_to_image(GenerationParams::new("a red fox"))
        .await
        .unwrap();
    assert!(summary.output_path.exists());
    assert!(mock.get_option_updates().is_empty());
}

#[tokio::test]
async fn test_img2img_loads_base64_source_and_mask() {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_on_white(16, 16));

    let mock = MockWebUi::new(png_on_white(16, 16));
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let options = ImageToImageParams {
        source_image: Some(ImageSource::Base64(format!("data:image/png;base64,{}", encoded))),
        mask_image: Some(ImageSource::Bytes(png_on_white(16, 16))),
        ..Default::default()
    };
    generator
        .generate_image_to_image(GenerationParams::new("repaint the square"), options)
        .await
        .unwrap();

    let request = &mock.get_requests()[0];
    assert_eq!(request.source_image(), Some(png_on_white(16, 16).as_slice()));
    match &request.kind {
        GenerationKind::ImageToImage(opts) => assert!(opts.mask_image.is_some()),
        GenerationKind::TextToImage => panic!("expected image-to-image"),
    }
}

#[tokio::test]
async fn test_img2img_missing_file_is_invalid_image() {
    let mock = MockWebUi::new(png_on_white(16, 16));
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let options = ImageToImageParams {
        source_image: Some(ImageSource::Path(dir.path().join("missing.png"))),
        ..Default::default()
    };
    let err = generator
        .generate_image_to_image(GenerationParams::new("anything"), options)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidImage(_)));
    assert!(mock.get_requests().is_empty());
}

#[tokio::test]
async fn test_list_models_marks_current() {
    let mock = MockWebUi::new(Vec::new())
        .with_checkpoint("anything-v5.safetensors [7f96a1a9ca]")
        .with_models(vec![
            create_mock_model("anything-v5", "7f96a1a9ca"),
            create_mock_model("realisticVision", "e6415c4892"),
        ]);
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let listing = generator.list_models().await.unwrap();
    assert_eq!(listing.models.len(), 2);
    assert!(listing.models[0].is_current);
    assert!(!listing.models[1].is_current);
    assert_eq!(listing.models[1].short_hash, "e6415c48");
    assert!(listing.to_string().contains("[current]"));
}

#[tokio::test]
async fn test_model_details_degrade_optional_queries() {
    let mock = MockWebUi::new(Vec::new()).with_checkpoint("anything-v5.safetensors");
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let details = generator.model_details().await.unwrap();
    assert_eq!(details.current_model, "anything-v5.safetensors");
    assert!(!details.controlnet_available);
    assert_eq!(details.system.python_version, "unknown");
    assert_eq!(details.vaes, vec!["vae-ft-mse-840000".to_string()]);
    assert!(details.to_string().contains("ControlNet: not installed"));
}

#[tokio::test]
async fn test_recommendations_follow_loaded_checkpoint() {
    let mock = MockWebUi::new(Vec::new()).with_checkpoint("anything-v5.safetensors");
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, false);

    let rec = generator.model_recommendations().await;
    assert_eq!(rec.family, ModelFamily::Anime);
    assert_eq!(rec.cfg_scale, Some("7-12"));

    let offline = MockWebUi::new(Vec::new()).with_options_error();
    let generator = generator_with(&offline, &dir, false);
    assert_eq!(generator.model_recommendations().await.family, ModelFamily::General);
}

#[tokio::test]
async fn test_output_path_without_file_name_is_rejected_before_any_call() {
    let mock = MockWebUi::new(png_on_white(16, 16)).with_checkpoint("other.safetensors [abc]");
    let dir = create_temp_dir();
    let generator = generator_with(&mock, &dir, true);

    let params = GenerationParams {
        output_path: Some(PathBuf::from("/")),
        ..GenerationParams::new("a red fox")
    };
    let err = generator.generate_text_to_image(params).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.field(), Some("output_path"));
    assert!(mock.get_requests().is_empty());
    assert!(mock.get_option_updates().is_empty());
}
