//! Error type for codec and filesystem operations.

use std::path::PathBuf;

use kip_pipeline::PipelineError;

/// Errors from decoding, encoding, reading or writing images.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The input byte slice was empty.
    #[error("input is empty")]
    EmptyInput,

    /// The bytes could not be decoded as a supported image format.
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    /// A frame could not be encoded in the requested format.
    #[error("image encode failed: {0}")]
    ImageEncode(String),

    /// A filesystem operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(err: &image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }

    pub(crate) fn encode(err: &impl std::fmt::Display) -> Self {
        Self::ImageEncode(err.to_string())
    }

    /// Report this error as a loader failure.
    #[must_use]
    pub fn into_load(self) -> PipelineError {
        PipelineError::Load(self.to_string())
    }

    /// Report this error as a saver failure.
    #[must_use]
    pub fn into_save(self) -> PipelineError {
        PipelineError::Save(self.to_string())
    }
}
