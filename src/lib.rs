pub mod config;
pub mod error;
pub mod generator;
pub mod output;
pub mod prompt;
pub mod request;
pub mod server;
pub mod style;
pub mod webui;

pub use error::{Error, Result};
