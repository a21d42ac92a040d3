//! The five shapes of pipeline action.
//!
//! Each variant carries exactly one boxed function. The variants differ
//! only in the context handed to that function per call; dispatch onto
//! the matching [`ImageStack`] perform operation happens in
//! [`PipelineAction::apply`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::{MutablePixelAccess, PixelAccess};
use crate::color::PixelColor;
use crate::stack::ImageStack;

/// In-place procedure over a copy of the whole frame.
pub type MutateFn = dyn Fn(&mut dyn MutablePixelAccess);
/// Per-pixel color map.
pub type ColorFn = dyn Fn(PixelColor) -> PixelColor;
/// Per-pixel color map that also sees `(x, y)`.
pub type CoordinateFn = dyn Fn(u32, u32, PixelColor) -> PixelColor;
/// Per-pixel color map with read access to the source frame.
pub type NeighborhoodFn = dyn Fn(&dyn PixelAccess, PixelColor) -> PixelColor;
/// Per-pixel color map with `(x, y)` and read access to the source frame.
pub type CoordinateNeighborhoodFn = dyn Fn(&dyn PixelAccess, u32, u32, PixelColor) -> PixelColor;

/// One processing step's work.
pub enum PipelineAction {
    /// Whole-frame procedure applied to a copy of the current frame.
    Mutate(Box<MutateFn>),
    /// `color -> color`.
    Color(Box<ColorFn>),
    /// `(x, y, color) -> color`.
    Coordinate(Box<CoordinateFn>),
    /// `(source, color) -> color`.
    Neighborhood(Box<NeighborhoodFn>),
    /// `(source, x, y, color) -> color`.
    CoordinateNeighborhood(Box<CoordinateNeighborhoodFn>),
}

impl PipelineAction {
    /// Wrap a whole-frame procedure.
    pub fn mutate(f: impl Fn(&mut dyn MutablePixelAccess) + 'static) -> Self {
        Self::Mutate(Box::new(f))
    }

    /// Wrap a per-pixel color map.
    pub fn color(f: impl Fn(PixelColor) -> PixelColor + 'static) -> Self {
        Self::Color(Box::new(f))
    }

    /// Wrap a coordinate-aware color map.
    pub fn coordinate(f: impl Fn(u32, u32, PixelColor) -> PixelColor + 'static) -> Self {
        Self::Coordinate(Box::new(f))
    }

    /// Wrap a neighborhood-aware color map.
    pub fn neighborhood(f: impl Fn(&dyn PixelAccess, PixelColor) -> PixelColor + 'static) -> Self {
        Self::Neighborhood(Box::new(f))
    }

    /// Wrap a coordinate- and neighborhood-aware color map.
    pub fn coordinate_neighborhood(
        f: impl Fn(&dyn PixelAccess, u32, u32, PixelColor) -> PixelColor + 'static,
    ) -> Self {
        Self::CoordinateNeighborhood(Box::new(f))
    }

    /// Which shape this action has.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Mutate(_) => ActionKind::Mutate,
            Self::Color(_) => ActionKind::Color,
            Self::Coordinate(_) => ActionKind::Coordinate,
            Self::Neighborhood(_) => ActionKind::Neighborhood,
            Self::CoordinateNeighborhood(_) => ActionKind::CoordinateNeighborhood,
        }
    }

    /// Run the action against the stack's current frame and push the
    /// result.
    pub fn apply(&self, stack: &mut ImageStack) {
        match self {
            Self::Mutate(f) => stack.perform_mutate(f.as_ref()),
            Self::Color(f) => stack.perform_color(f.as_ref()),
            Self::Coordinate(f) => stack.perform_coordinate(f.as_ref()),
            Self::Neighborhood(f) => stack.perform_neighborhood(f.as_ref()),
            Self::CoordinateNeighborhood(f) => stack.perform_coordinate_neighborhood(f.as_ref()),
        }
    }
}

impl fmt::Debug for PipelineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PipelineAction").field(&self.kind()).finish()
    }
}

/// Renders the plan tag, e.g. `[color+location]`.
impl fmt::Display for PipelineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}

/// Fieldless mirror of [`PipelineAction`], used for plan tags and
/// diagnostics counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// See [`PipelineAction::Mutate`].
    Mutate,
    /// See [`PipelineAction::Color`].
    Color,
    /// See [`PipelineAction::Coordinate`].
    Coordinate,
    /// See [`PipelineAction::Neighborhood`].
    Neighborhood,
    /// See [`PipelineAction::CoordinateNeighborhood`].
    CoordinateNeighborhood,
}

impl ActionKind {
    /// Tag used in the textual plan.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Mutate => "[mutate]",
            Self::Color => "[color]",
            Self::Coordinate => "[color+location]",
            Self::Neighborhood => "[color+surround]",
            Self::CoordinateNeighborhood => "[color+location+surround]",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
