mod builder;
mod types;

pub use builder::{
    CFG_SCALE_RANGE, DENOISING_RANGE, DIMENSION_RANGE, INPAINT_PADDING_RANGE, MASK_BLUR_RANGE,
    RequestBuilder, STEPS_RANGE,
};
pub use types::*;
