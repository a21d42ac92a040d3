//! Byte-wise arithmetic between two frames of the same layout.
//!
//! Both operations work on the packed buffers directly, byte by byte,
//! so alpha bytes are combined exactly like color bytes. The result
//! takes its dimensions and alpha flag from the left operand.

use crate::frame::Frame;
use crate::types::{OverflowPolicy, PipelineError};

impl Frame {
    /// Add `other` to this frame under the given overflow policy.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SizeMismatch`] if the two buffers differ
    /// in length.
    pub fn add(&self, other: &Self, policy: OverflowPolicy) -> Result<Self, PipelineError> {
        let (lhs, rhs) = operands(self, other)?;
        let sums = lhs.iter().zip(rhs).map(|(&a, &b)| u16::from(a) + u16::from(b));

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let data: Vec<u8> = match policy {
            OverflowPolicy::None => sums.map(|s| s as u8).collect(),
            OverflowPolicy::Clamp => sums.map(|s| s.min(255) as u8).collect(),
            OverflowPolicy::Average => sums.map(|s| (s / 2) as u8).collect(),
            OverflowPolicy::Normalize => {
                let max = lhs
                    .iter()
                    .zip(rhs)
                    .map(|(&a, &b)| u16::from(a) + u16::from(b))
                    .max()
                    .unwrap_or(0);
                if max == 0 {
                    vec![0; lhs.len()]
                } else {
                    let factor = 255.0 / f64::from(max);
                    sums.map(|s| (f64::from(s) * factor) as u8).collect()
                }
            }
        };
        self.with_data(data)
    }

    /// Per-byte absolute difference `|a - b|`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SizeMismatch`] if the two buffers differ
    /// in length.
    pub fn subtract(&self, other: &Self) -> Result<Self, PipelineError> {
        let (lhs, rhs) = operands(self, other)?;
        let data = lhs.iter().zip(rhs).map(|(&a, &b)| a.abs_diff(b)).collect();
        self.with_data(data)
    }

    fn with_data(&self, data: Vec<u8>) -> Result<Self, PipelineError> {
        let dims = self.dimensions();
        Self::from_raw(dims.width, dims.height, self.has_alpha(), data)
    }
}

fn operands<'a>(left: &'a Frame, right: &'a Frame) -> Result<(&'a [u8], &'a [u8]), PipelineError> {
    let (lhs, rhs) = (left.as_bytes(), right.as_bytes());
    if lhs.len() == rhs.len() {
        Ok((lhs, rhs))
    } else {
        Err(PipelineError::SizeMismatch {
            left: lhs.len(),
            right: rhs.len(),
        })
    }
}
