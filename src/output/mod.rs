mod background;

pub use background::{
    BackgroundRemover, CornerColorBackground, EFFECTIVE_TRANSPARENCY_PERCENT, KeepBackground,
    NearWhiteBackground, TransparencyReport, apply_transparency, remover_for,
};

use crate::{Error, Result, config::Config};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Persists generated images under a base directory.
///
/// Files are written to a hidden `.part` sibling first and renamed into
/// place, so a failed or abandoned write never leaves a truncated image at
/// the requested path.
#[derive(Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    remover: Arc<dyn BackgroundRemover>,
}

/// Where an image ended up and how large it is.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenImage {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub transparency: Option<TransparencyReport>,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>, remover: Arc<dyn BackgroundRemover>) -> Self {
        Self {
            output_dir: output_dir.into(),
            remover,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.webui.output_dir.clone(),
            remover_for(config.transparent.background_removal),
        )
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn strategy(&self) -> &'static str {
        self.remover.name()
    }

    /// Works out the final path for an image.
    ///
    /// Relative paths land under the output directory. Without a requested
    /// path a unique `{prefix}-{timestamp}-{id}.png` name is generated.
    /// Transparent images always get a `.png` extension. A requested path
    /// that does not end in a file name (`/`, `out/..`) is rejected.
    pub fn resolve_path(&self, requested: Option<&Path>, prefix: &str, transparent: bool) -> Result<PathBuf> {
        if let Some(p) = requested
            && p.file_name().is_none()
        {
            return Err(Error::invalid_parameter(
                "output_path",
                format!("'{}' has no file name", p.display()),
            ));
        }

        let mut path = match requested {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => self.output_dir.join(p),
            None => {
                let id = Uuid::new_v4().simple().to_string();
                self.output_dir.join(format!(
                    "{}-{}-{}.png",
                    prefix,
                    Local::now().format("%Y%m%d-%H%M%S"),
                    &id[..8]
                ))
            }
        };

        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));

        if path.extension().is_none() || (transparent && !is_png) {
            if transparent && path.extension().is_some() {
                info!(
                    "Transparent output must be PNG; writing {} instead",
                    path.with_extension("png").display()
                );
            }
            path.set_extension("png");
        }
        Ok(path)
    }

    /// Writes `bytes` to `path` atomically.
    pub async fn write(&self, path: &Path, bytes: Vec<u8>) -> Result<WrittenImage> {
        let target = path.to_path_buf();
        let written = tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
            .await
            .map_err(|e| Error::internal(format!("write task failed: {}", e)))??;

        info!("Saved image to {} ({} bytes)", path.display(), written);
        Ok(WrittenImage {
            path: path.to_path_buf(),
            bytes_written: written,
            transparency: None,
        })
    }

    /// Post-processes `bytes` for transparency, then writes them.
    ///
    /// When the image cannot be processed the original bytes are saved as-is
    /// and no report is attached.
    pub async fn write_transparent(&self, path: &Path, bytes: Vec<u8>) -> Result<WrittenImage> {
        let remover = Arc::clone(&self.remover);
        let original = bytes.clone();

        let processed = tokio::task::spawn_blocking(move || apply_transparency(&bytes, remover.as_ref()))
            .await
            .map_err(|e| Error::internal(format!("transparency task failed: {}", e)))?;

        let (bytes, report) = match processed {
            Ok((bytes, report)) => {
                if report.is_effective() {
                    debug!(
                        "Background removal ({}) cleared {:.1}% of pixels",
                        report.strategy, report.transparent_percent
                    );
                } else {
                    warn!(
                        "Background removal ({}) only cleared {:.1}% of pixels",
                        report.strategy, report.transparent_percent
                    );
                }
                (bytes, Some(report))
            }
            Err(e) => {
                warn!("Transparency post-processing failed, keeping original image: {}", e);
                (original, None)
            }
        };

        let mut written = self.write(path, bytes).await?;
        written.transparency = report;
        Ok(written)
    }
}

/// Removes the temporary file unless the rename went through.
struct PartFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<u64> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| Error::write_failed(&parent, e))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::invalid_parameter("output_path", format!("'{}' has no file name", path.display())))?;

    let mut part = PartFile {
        path: parent.join(format!(".{}.{}.part", file_name, Uuid::new_v4().simple())),
        committed: false,
    };

    fs::write(&part.path, bytes).map_err(|e| Error::write_failed(path, e))?;
    fs::rename(&part.path, path).map_err(|e| Error::write_failed(path, e))?;
    part.committed = true;

    Ok(bytes.len() as u64)
}
