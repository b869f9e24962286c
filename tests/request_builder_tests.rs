use pretty_assertions::assert_eq;
use rstest::rstest;
use sd_webui_mcp::{
    Error,
    config::{GenerationDefaults, ServiceConfig},
    request::{
        CFG_SCALE_RANGE, DIMENSION_RANGE, GenerationKind, GenerationParams, ImageToImageParams,
        InpaintingFill, RequestBuilder, ResizeMode, STEPS_RANGE, Sampler,
    },
    style::Style,
};

mod common;
use common::{TEST_MODEL, png_on_white};

fn service() -> ServiceConfig {
    ServiceConfig::new("http://127.0.0.1:7860", TEST_MODEL)
}

fn params(prompt: &str) -> GenerationParams {
    GenerationParams::new(prompt)
}

#[rstest]
#[case::width_low("width", GenerationParams { width: Some(63), ..params("x") })]
#[case::width_high("width", GenerationParams { width: Some(2049), ..params("x") })]
#[case::height_low("height", GenerationParams { height: Some(0), ..params("x") })]
#[case::height_high("height", GenerationParams { height: Some(4096), ..params("x") })]
#[case::steps_low("steps", GenerationParams { steps: Some(0), ..params("x") })]
#[case::steps_high("steps", GenerationParams { steps: Some(151), ..params("x") })]
#[case::cfg_low("cfg_scale", GenerationParams { cfg_scale: Some(0.5), ..params("x") })]
#[case::cfg_high("cfg_scale", GenerationParams { cfg_scale: Some(30.5), ..params("x") })]
#[case::seed_negative("seed", GenerationParams { seed: Some(-2), ..params("x") })]
#[case::sampler_unknown("sampler", GenerationParams { sampler: Some("Euler z".into()), ..params("x") })]
#[case::prompt_blank("prompt", params("   "))]
fn test_out_of_range_fails_naming_field(#[case] field: &str, #[case] params: GenerationParams) {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let err = builder.text_to_image(&params, false).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { .. }), "got {:?}", err);
    assert_eq!(err.field(), Some(field));
}

#[test]
fn test_valid_combinations_stay_in_range() {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let dimensions = [64, 512, 777, 2048];
    let steps = [1, 20, 150];
    let cfg_scales = [1.0, 7.5, 30.0];

    for &width in &dimensions {
        for &height in &dimensions {
            for &step in &steps {
                for &cfg in &cfg_scales {
                    for style in Style::ALL {
                        let params = GenerationParams {
                            width: Some(width),
                            height: Some(height),
                            steps: Some(step),
                            cfg_scale: Some(cfg),
                            style: Some(style.name().to_string()),
                            ..params("a lighthouse")
                        };
                        let request = builder.text_to_image(&params, true).unwrap();
                        assert!(DIMENSION_RANGE.contains(&request.width));
                        assert!(DIMENSION_RANGE.contains(&request.height));
                        assert!(STEPS_RANGE.contains(&request.steps));
                        assert!(CFG_SCALE_RANGE.contains(&request.cfg_scale));
                        assert_eq!((request.width, request.height), (width, height));
                    }
                }
            }
        }
    }
}

#[test]
fn test_defaults_fill_omitted_fields() {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let request = builder.text_to_image(&params("a tree"), false).unwrap();
    assert_eq!(request.kind, GenerationKind::TextToImage);
    assert_eq!(request.width, defaults.width);
    assert_eq!(request.height, defaults.height);
    assert_eq!(request.steps, defaults.steps);
    assert_eq!(request.cfg_scale, defaults.cfg_scale);
    assert_eq!(request.sampler, Sampler::EulerA);
    assert_eq!(request.seed, None);
    assert_eq!(request.model, TEST_MODEL);
    assert_eq!(request.style, Style::None);
}

#[test]
fn test_style_recommendations_only_fill_gaps() {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let styled = GenerationParams {
        style: Some("anime_character".into()),
        ..params("a girl")
    };
    let request = builder.text_to_image(&styled, false).unwrap();
    assert_eq!(request.sampler, Sampler::DpmPp2MKarras);
    assert_eq!(request.steps, 28);
    assert_eq!(request.cfg_scale, 9.0);

    let explicit = GenerationParams {
        steps: Some(12),
        sampler: Some("DDIM".into()),
        ..styled
    };
    let request = builder.text_to_image(&explicit, false).unwrap();
    assert_eq!(request.sampler, Sampler::Ddim);
    assert_eq!(request.steps, 12);
    assert_eq!(request.cfg_scale, 9.0);
}

#[test]
fn test_unknown_style_falls_back_to_none() {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let request = builder
        .text_to_image(&GenerationParams { style: Some("vaporwave".into()), ..params("a car") }, false)
        .unwrap();
    assert_eq!(request.style, Style::None);
}

#[rstest]
#[case(None, None)]
#[case(Some(-1), None)]
#[case(Some(0), Some(0))]
#[case(Some(123456789), Some(123456789))]
fn test_seed_handling(#[case] input: Option<i64>, #[case] expected: Option<i64>) {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let request = builder
        .text_to_image(&GenerationParams { seed: input, ..params("a boat") }, false)
        .unwrap();
    assert_eq!(request.seed, expected);
}

#[rstest]
#[case(Some(""))]
#[case(Some("   "))]
#[case(None)]
fn test_blank_model_falls_back_to_default(#[case] model: Option<&str>) {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let request = builder
        .text_to_image(
            &GenerationParams {
                model_name: model.map(str::to_string),
                ..params("a bird")
            },
            false,
        )
        .unwrap();
    assert_eq!(request.model, TEST_MODEL);
}

#[test]
fn test_configured_vae_used_when_not_requested() {
    let mut service = service();
    service.default_vae = Some("vae-ft-mse-840000".into());
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let request = builder.text_to_image(&params("a bird"), false).unwrap();
    assert_eq!(request.vae.as_deref(), Some("vae-ft-mse-840000"));
}

#[test]
fn test_img2img_requires_source_image() {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let err = builder
        .image_to_image(&params("a bird"), &ImageToImageParams::default(), None, None)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidImage(_)));
}

#[test]
fn test_img2img_rejects_undecodable_source() {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let err = builder
        .image_to_image(
            &params("a bird"),
            &ImageToImageParams::default(),
            Some(b"definitely not an image".to_vec()),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidImage(_)));
}

#[rstest]
#[case(-0.1)]
#[case(1.01)]
fn test_img2img_denoising_out_of_range(#[case] strength: f64) {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let options = ImageToImageParams {
        denoising_strength: Some(strength),
        ..Default::default()
    };
    let err = builder
        .image_to_image(&params("a bird"), &options, Some(png_on_white(64, 64)), None)
        .unwrap_err();
    assert_eq!(err.field(), Some("denoising_strength"));
}

#[test]
fn test_img2img_options_are_carried() {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let options = ImageToImageParams {
        denoising_strength: Some(0.4),
        resize_mode: Some("Resize and fill".into()),
        inpainting_fill: Some("latent_nothing".into()),
        inpainting_mask_invert: true,
        mask_blur: Some(8),
        ..Default::default()
    };
    let request = builder
        .image_to_image(
            &params("a bird"),
            &options,
            Some(png_on_white(64, 64)),
            Some(png_on_white(64, 64)),
        )
        .unwrap();

    assert!(request.is_image_to_image());
    assert_eq!(request.denoising_strength(), Some(0.4));
    match request.kind {
        GenerationKind::ImageToImage(opts) => {
            assert_eq!(opts.resize_mode, ResizeMode::ResizeAndFill);
            assert_eq!(opts.inpainting_fill, InpaintingFill::LatentNothing);
            assert!(opts.inpainting_mask_invert);
            assert_eq!(opts.mask_blur, 8);
            assert!(opts.inpaint_full_res);
            assert_eq!(opts.inpaint_full_res_padding, 32);
            assert!(opts.mask_image.is_some());
        }
        GenerationKind::TextToImage => panic!("expected image-to-image"),
    }
}

#[test]
fn test_inpaint_padding_out_of_range() {
    let service = service();
    let defaults = GenerationDefaults::default();
    let builder = RequestBuilder::new(&service, &defaults);

    let options = ImageToImageParams {
        inpaint_full_res: Some(false),
        inpaint_full_res_padding: Some(300),
        ..Default::default()
    };
    let err = builder
        .image_to_image(&params("a bird"), &options, Some(png_on_white(64, 64)), None)
        .unwrap_err();
    assert_eq!(err.field(), Some("inpaint_full_res_padding"));
}
