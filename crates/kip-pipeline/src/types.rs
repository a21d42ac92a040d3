//! Shared types for the kip pixel pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can hand decoded rasters
/// to [`Frame`](crate::Frame) without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export `RgbImage` for alpha-less rasters.
pub use image::RgbImage;

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Number of pixels covered by these dimensions.
    #[must_use]
    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Byte-range handling when two frames are added together.
///
/// Applied per byte of the packed buffer, so alpha bytes take part
/// exactly like color bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Raw sum truncated to a byte (wraps past 255).
    None,
    /// Sum saturated at 255.
    #[default]
    Clamp,
    /// Integer mean of the two bytes.
    Average,
    /// Every sum scaled by `255 / max`, where `max` is the largest
    /// pairwise sum anywhere in the buffer.
    Normalize,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Clamp => "clamp",
            Self::Average => "average",
            Self::Normalize => "normalize",
        };
        f.write_str(name)
    }
}

/// Identifier of a [`CombineStep`](crate::step::CombineStep).
///
/// Assigned monotonically while a pipeline is compiled. Both arms of a
/// branch carry the same id, which is how the executor checks that they
/// merge at one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombinatorId(pub u64);

impl fmt::Display for CombinatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors that can occur while building frames or executing a pipeline.
///
/// Uses custom `Serialize`/`Deserialize` so that a failed run can be
/// reported as JSON by front ends. Each variant maps onto a proxy
/// variant carrying plain data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Two frames with different buffer sizes were combined.
    #[error("frame buffers differ in size: {left} bytes vs {right} bytes")]
    SizeMismatch {
        /// Buffer length of the left operand.
        left: usize,
        /// Buffer length of the right operand.
        right: usize,
    },

    /// The two arms of a branch did not end in the same combinator.
    #[error("branches must end in the same combinator (left: {}, right: {})", describe(*.left), describe(*.right))]
    CombinatorMismatch {
        /// Combinator reached by the left arm, if any.
        left: Option<CombinatorId>,
        /// Combinator reached by the right arm, if any.
        right: Option<CombinatorId>,
    },

    /// Raw pixel data does not match the declared frame layout.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The loader collaborator failed to produce an initial image stack.
    #[error("failed to load image: {0}")]
    Load(String),

    /// The saver collaborator failed to persist the final image stack.
    #[error("failed to save image: {0}")]
    Save(String),
}

fn describe(id: Option<CombinatorId>) -> String {
    id.map_or_else(|| "none".to_owned(), |id| id.to_string())
}

/// Serde-compatible proxy for `PipelineError`.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    SizeMismatch {
        left: usize,
        right: usize,
    },
    CombinatorMismatch {
        left: Option<CombinatorId>,
        right: Option<CombinatorId>,
    },
    InvalidFrame(String),
    Load(String),
    Save(String),
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::SizeMismatch { left, right } => PipelineErrorProxy::SizeMismatch {
                left: *left,
                right: *right,
            },
            Self::CombinatorMismatch { left, right } => PipelineErrorProxy::CombinatorMismatch {
                left: *left,
                right: *right,
            },
            Self::InvalidFrame(s) => PipelineErrorProxy::InvalidFrame(s.clone()),
            Self::Load(s) => PipelineErrorProxy::Load(s.clone()),
            Self::Save(s) => PipelineErrorProxy::Save(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            PipelineErrorProxy::SizeMismatch { left, right } => Self::SizeMismatch { left, right },
            PipelineErrorProxy::CombinatorMismatch { left, right } => {
                Self::CombinatorMismatch { left, right }
            }
            PipelineErrorProxy::InvalidFrame(s) => Self::InvalidFrame(s),
            PipelineErrorProxy::Load(s) => Self::Load(s),
            PipelineErrorProxy::Save(s) => Self::Save(s),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_pixel_count() {
        let d = Dimensions {
            width: 7,
            height: 3,
        };
        assert_eq!(d.pixel_count(), 21);
        assert_eq!(d.to_string(), "7x3");
    }

    #[test]
    fn overflow_policy_default_is_clamp() {
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::Clamp);
    }

    #[test]
    fn overflow_policy_serializes_kebab_case() {
        let json = serde_json::to_string(&OverflowPolicy::Normalize).unwrap();
        assert_eq!(json, "\"normalize\"");
        let parsed: OverflowPolicy = serde_json::from_str("\"average\"").unwrap();
        assert_eq!(parsed, OverflowPolicy::Average);
    }

    #[test]
    fn error_size_mismatch_display() {
        let err = PipelineError::SizeMismatch {
            left: 12,
            right: 27,
        };
        assert_eq!(
            err.to_string(),
            "frame buffers differ in size: 12 bytes vs 27 bytes",
        );
    }

    #[test]
    fn error_combinator_mismatch_display() {
        let err = PipelineError::CombinatorMismatch {
            left: Some(CombinatorId(0)),
            right: None,
        };
        assert_eq!(
            err.to_string(),
            "branches must end in the same combinator (left: #0, right: none)",
        );
    }

    #[test]
    fn pipeline_error_serde_round_trip() {
        let errors = [
            PipelineError::SizeMismatch { left: 1, right: 2 },
            PipelineError::CombinatorMismatch {
                left: Some(CombinatorId(3)),
                right: Some(CombinatorId(4)),
            },
            PipelineError::InvalidFrame("short buffer".to_owned()),
            PipelineError::Load("missing file".to_owned()),
            PipelineError::Save("read-only".to_owned()),
        ];
        for err in errors {
            let json = serde_json::to_string(&err).unwrap();
            let back: PipelineError = serde_json::from_str(&json).unwrap();
            assert_eq!(err, back);
        }
    }
}
