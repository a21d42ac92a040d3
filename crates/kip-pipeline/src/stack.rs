//! Image stack: the current frame plus, optionally, every frame before it.
//!
//! Each processing step reads the top frame and pushes a new one. With
//! `keep_history` off the stack only ever holds the latest frame; with it
//! on, every intermediate frame is retained in push order so front ends
//! can show or save the whole chain.
//!
//! # Sharing
//!
//! Frames are stored as `Rc<Frame>` and never written to after they are
//! pushed. [`ImageStack::branch`] therefore shares frames between stacks
//! without copying any pixel data. Every operation that produces pixels
//! allocates a fresh frame ([`Frame::next`] or a clone of the top) first.
//!
//! # Memory
//!
//! With history retained, a stack pins one full frame per executed step.
//! For a 1000×1000 RGBA image that is 4 MB per step, for the lifetime of
//! the stack.

use std::rc::Rc;

use crate::access::{MutablePixelAccess, PixelAccess};
use crate::color::PixelColor;
use crate::frame::Frame;
use crate::types::{OverflowPolicy, PipelineError};

/// Ordered collection of frames with a single "current" frame on top.
#[derive(Debug, Clone)]
pub struct ImageStack {
    keep_history: bool,
    frames: Vec<Rc<Frame>>,
}

impl ImageStack {
    /// A stack holding `initial` as its only frame.
    #[must_use]
    pub fn new(initial: Frame, keep_history: bool) -> Self {
        Self {
            keep_history,
            frames: vec![Rc::new(initial)],
        }
    }

    /// A stack holding one zero-filled frame.
    #[must_use]
    pub fn blank(width: u32, height: u32, has_alpha: bool, keep_history: bool) -> Self {
        Self::new(Frame::blank(width, height, has_alpha), keep_history)
    }

    /// Whether pushes append (`true`) or replace the current frame.
    #[must_use]
    pub const fn keep_history(&self) -> bool {
        self.keep_history
    }

    /// Every retained frame, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[Rc<Frame>] {
        &self.frames
    }

    /// Number of retained frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame is retained. Only reachable through a stack that
    /// was emptied by a caller-supplied combinator.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The current frame.
    ///
    /// Never fails: an empty stack reports a 0×0 blank frame.
    #[must_use]
    pub fn top(&self) -> Rc<Frame> {
        self.frames.last().map_or_else(
            || {
                tracing::warn!("top() on an empty image stack, substituting a 0x0 frame");
                Rc::new(Frame::blank(0, 0, false))
            },
            Rc::clone,
        )
    }

    /// Make `frame` the current frame.
    pub fn push(&mut self, frame: Frame) {
        if !self.keep_history {
            self.frames.clear();
        }
        self.frames.push(Rc::new(frame));
    }

    /// An independent stack starting from this one.
    ///
    /// With `transfer_history` the new stack shares every retained frame;
    /// without it the new stack holds only the current frame. Either way
    /// the `keep_history` flag is inherited and no pixel data is copied.
    #[must_use]
    pub fn branch(&self, transfer_history: bool) -> Self {
        let frames = if transfer_history {
            self.frames.clone()
        } else {
            vec![self.top()]
        };
        Self {
            keep_history: self.keep_history,
            frames,
        }
    }

    /// Copy the current frame, let `action` change the copy in place,
    /// push the copy.
    ///
    /// The only perform operation that can make several passes or write
    /// pixels in arbitrary order.
    pub fn perform_mutate(&mut self, action: &dyn Fn(&mut dyn MutablePixelAccess)) {
        let mut frame = Frame::clone(&self.top());
        action(&mut frame);
        self.push(frame);
    }

    /// Map every pixel's color.
    pub fn perform_color(&mut self, action: &dyn Fn(PixelColor) -> PixelColor) {
        let source = self.top();
        let mut dest = source.next();
        for offset in source.offsets() {
            dest.write_at(offset, action(source.read_at(offset)));
        }
        self.push(dest);
    }

    /// Map every pixel's color given its coordinates. Row-major order.
    pub fn perform_coordinate(&mut self, action: &dyn Fn(u32, u32, PixelColor) -> PixelColor) {
        let source = self.top();
        let mut dest = source.next();
        for y in 0..source.height() {
            for x in 0..source.width() {
                dest.write(x, y, action(x, y, source.read(x, y)));
            }
        }
        self.push(dest);
    }

    /// Map every pixel's color with read access to the source frame.
    pub fn perform_neighborhood(
        &mut self,
        action: &dyn Fn(&dyn PixelAccess, PixelColor) -> PixelColor,
    ) {
        let source = self.top();
        let mut dest = source.next();
        for offset in source.offsets() {
            dest.write_at(offset, action(&*source, source.read_at(offset)));
        }
        self.push(dest);
    }

    /// Map every pixel's color given its coordinates and read access to
    /// the source frame. Row-major order.
    pub fn perform_coordinate_neighborhood(
        &mut self,
        action: &dyn Fn(&dyn PixelAccess, u32, u32, PixelColor) -> PixelColor,
    ) {
        let source = self.top();
        let mut dest = source.next();
        for y in 0..source.height() {
            for x in 0..source.width() {
                dest.write(x, y, action(&*source, x, y, source.read(x, y)));
            }
        }
        self.push(dest);
    }

    /// A new stack: this stack's frames plus the sum of both current
    /// frames.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SizeMismatch`] if the current frames
    /// differ in buffer size.
    pub fn add(&self, other: &Self, policy: OverflowPolicy) -> Result<Self, PipelineError> {
        let sum = self.top().add(&other.top(), policy)?;
        let mut combined = self.branch(true);
        combined.push(sum);
        Ok(combined)
    }

    /// A new stack: this stack's frames plus the absolute difference of
    /// both current frames.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SizeMismatch`] if the current frames
    /// differ in buffer size.
    pub fn subtract(&self, other: &Self) -> Result<Self, PipelineError> {
        let diff = self.top().subtract(&other.top())?;
        let mut combined = self.branch(true);
        combined.push(diff);
        Ok(combined)
    }
}
