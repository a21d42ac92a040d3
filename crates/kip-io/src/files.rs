//! Filesystem reads and writes, plus ready-made executor collaborators.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use kip_pipeline::{ImageStack, PipelineError};

use crate::codec::{decode, encode};
use crate::error::IoError;

/// Read and decode the image at `path`.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be read, otherwise as
/// [`decode`].
pub fn load_path(path: &Path, keep_history: bool) -> Result<ImageStack, IoError> {
    let bytes = fs::read(path).map_err(|e| IoError::io(path, e))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "loading image");
    decode(&bytes, keep_history)
}

/// Output format implied by `path`'s extension.
///
/// # Errors
///
/// Returns [`IoError::ImageEncode`] for a missing or unknown extension.
pub fn format_for(path: &Path) -> Result<ImageFormat, IoError> {
    ImageFormat::from_path(path).map_err(|e| IoError::encode(&e))
}

/// File extension written for `format`.
#[must_use]
pub fn extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("img")
}

/// Write the stack's current frame to `path`, in the format its extension
/// names.
///
/// # Errors
///
/// Returns [`IoError::ImageEncode`] for an unknown extension or a failed
/// encode, [`IoError::Io`] if the file cannot be written.
pub fn save_top(stack: &ImageStack, path: &Path) -> Result<(), IoError> {
    let format = format_for(path)?;
    let bytes = encode(&stack.top(), format)?;
    fs::write(path, &bytes).map_err(|e| IoError::io(path, e))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "saved image");
    Ok(())
}

/// Write every retained frame to `dir` as `<name>_<idx>.<ext>`, oldest
/// first starting at index 0. Creates `dir` if needed.
///
/// Returns the written paths in stack order.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the directory or a file cannot be written,
/// [`IoError::ImageEncode`] if a frame fails to encode.
pub fn save_all_steps(
    stack: &ImageStack,
    dir: &Path,
    name: &str,
    format: ImageFormat,
) -> Result<Vec<PathBuf>, IoError> {
    fs::create_dir_all(dir).map_err(|e| IoError::io(dir, e))?;
    let ext = extension(format);
    let mut written = Vec::with_capacity(stack.len());
    for (idx, frame) in stack.frames().iter().enumerate() {
        let path = dir.join(format!("{name}_{idx}.{ext}"));
        let bytes = encode(frame, format)?;
        fs::write(&path, &bytes).map_err(|e| IoError::io(&path, e))?;
        written.push(path);
    }
    tracing::info!(dir = %dir.display(), frames = written.len(), "saved all steps");
    Ok(written)
}

/// A loader reading `path` each time it is called.
pub fn loader(path: PathBuf, keep_history: bool) -> impl Fn() -> Result<ImageStack, PipelineError> {
    move || load_path(&path, keep_history).map_err(IoError::into_load)
}

/// A saver writing the final frame to `path`.
pub fn saver(path: PathBuf) -> impl Fn(&ImageStack) -> Result<(), PipelineError> {
    move |stack| save_top(stack, &path).map_err(IoError::into_save)
}

/// A saver writing every retained frame to `dir` as PNG.
pub fn history_saver(
    dir: PathBuf,
    name: String,
) -> impl Fn(&ImageStack) -> Result<(), PipelineError> {
    move |stack| {
        save_all_steps(stack, &dir, &name, ImageFormat::Png)
            .map(drop)
            .map_err(IoError::into_save)
    }
}
