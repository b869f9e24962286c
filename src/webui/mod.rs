mod client;
mod types;

pub use client::{PING_TIMEOUT, WebUiApi, WebUiClient};
pub use types::*;
