//! Declaring pipelines.
//!
//! A [`PipelineBuilder`] records actions in order. Branches open a
//! [`BranchBuilder`] scope whose two arms are independent builders of
//! their own; closing the scope appends a single branch token. Nothing
//! is compiled until [`PipelineBuilder::build`].
//!
//! ```
//! use kip_pipeline::{OverflowPolicy, PipelineBuilder, actions};
//!
//! let mut builder = PipelineBuilder::new();
//! builder.map_color(actions::grayscale(0.3, 0.59, 0.11)).branch(|b| {
//!     b.right(|arm| {
//!         arm.map_color(actions::invert());
//!     })
//!     .add(OverflowPolicy::Clamp);
//! });
//! let pipeline = builder.build();
//! assert_eq!(pipeline.plan().len(), 7);
//! ```

use crate::access::{MutablePixelAccess, PixelAccess};
use crate::action::PipelineAction;
use crate::color::PixelColor;
use crate::compile::{GraphCompiler, Token};
use crate::stack::ImageStack;
use crate::step::{CombineFn, Pipeline};
use crate::types::{OverflowPolicy, PipelineError};

/// Records a pipeline's actions and branches.
#[derive(Default)]
pub struct PipelineBuilder {
    tokens: Vec<Token>,
}

impl PipelineBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a prepared action.
    pub fn action(&mut self, action: PipelineAction) -> &mut Self {
        self.tokens.push(Token::Action(action));
        self
    }

    /// Append a whole-frame procedure run on a copy of the current frame.
    pub fn paint(&mut self, f: impl Fn(&mut dyn MutablePixelAccess) + 'static) -> &mut Self {
        self.action(PipelineAction::mutate(f))
    }

    /// Append a per-pixel color map.
    pub fn map_color(&mut self, f: impl Fn(PixelColor) -> PixelColor + 'static) -> &mut Self {
        self.action(PipelineAction::color(f))
    }

    /// Append a per-pixel color map that also receives `(x, y)`.
    pub fn map_color_at(
        &mut self,
        f: impl Fn(u32, u32, PixelColor) -> PixelColor + 'static,
    ) -> &mut Self {
        self.action(PipelineAction::coordinate(f))
    }

    /// Append a per-pixel color map with read access to the source frame.
    pub fn map_with_neighbors(
        &mut self,
        f: impl Fn(&dyn PixelAccess, PixelColor) -> PixelColor + 'static,
    ) -> &mut Self {
        self.action(PipelineAction::neighborhood(f))
    }

    /// Append a per-pixel color map with `(x, y)` and read access to the
    /// source frame.
    pub fn map_with_neighbors_at(
        &mut self,
        f: impl Fn(&dyn PixelAccess, u32, u32, PixelColor) -> PixelColor + 'static,
    ) -> &mut Self {
        self.action(PipelineAction::coordinate_neighborhood(f))
    }

    /// Append a branch declared inside `scope`.
    ///
    /// Arms left undeclared are empty. Without an explicit combinator
    /// the left arm's stack is kept and the right arm's discarded.
    pub fn branch(&mut self, scope: impl FnOnce(&mut BranchBuilder)) -> &mut Self {
        let mut branch = BranchBuilder::default();
        scope(&mut branch);
        self.tokens.push(branch.into_token());
        self
    }

    /// Number of top-level tokens recorded so far. A branch counts once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Compile everything recorded so far, leaving the builder empty.
    pub fn build(&mut self) -> Pipeline {
        GraphCompiler::default().compile(std::mem::take(&mut self.tokens))
    }
}

/// Scope for one branch: two arms and the function that merges them.
#[derive(Default)]
pub struct BranchBuilder {
    left: PipelineBuilder,
    right: PipelineBuilder,
    combine: Option<Box<CombineFn>>,
}

impl BranchBuilder {
    /// Declare actions on the left arm, which runs on the current stack.
    pub fn left(&mut self, scope: impl FnOnce(&mut PipelineBuilder)) -> &mut Self {
        scope(&mut self.left);
        self
    }

    /// Declare actions on the right arm, which runs on a single-frame
    /// branch of the current stack.
    pub fn right(&mut self, scope: impl FnOnce(&mut PipelineBuilder)) -> &mut Self {
        scope(&mut self.right);
        self
    }

    /// Merge the arms with `f`. Replaces any earlier combinator.
    pub fn combine(
        &mut self,
        f: impl Fn(ImageStack, ImageStack) -> Result<ImageStack, PipelineError> + 'static,
    ) -> &mut Self {
        self.combine = Some(Box::new(f));
        self
    }

    /// Merge by adding both current frames under `policy`.
    pub fn add(&mut self, policy: OverflowPolicy) -> &mut Self {
        self.combine(move |left, right| left.add(&right, policy))
    }

    /// Merge by the absolute difference of both current frames.
    pub fn subtract(&mut self) -> &mut Self {
        self.combine(|left, right| left.subtract(&right))
    }

    fn into_token(self) -> Token {
        Token::Branch {
            left: self.left.tokens,
            right: self.right.tokens,
            combine: self.combine.unwrap_or_else(|| Box::new(|left, _| Ok(left))),
        }
    }
}

/// Declare and compile a pipeline in one expression.
#[must_use]
pub fn build_pipeline(scope: impl FnOnce(&mut PipelineBuilder)) -> Pipeline {
    let mut builder = PipelineBuilder::new();
    scope(&mut builder);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_every_action_shape() {
        let pipeline = build_pipeline(|b| {
            b.paint(|_| {})
                .map_color(|c| c)
                .map_color_at(|_, _, c| c)
                .map_with_neighbors(|_, c| c)
                .map_with_neighbors_at(|_, _, _, c| c);
        });
        assert_eq!(
            pipeline.plan(),
            vec![
                "1: PROCESS [mutate]",
                "2: PROCESS [color]",
                "3: PROCESS [color+location]",
                "4: PROCESS [color+surround]",
                "5: PROCESS [color+location+surround]",
                "6: END",
            ],
        );
    }

    #[test]
    fn branch_counts_as_one_token() {
        let mut builder = PipelineBuilder::new();
        builder.map_color(|c| c).branch(|b| {
            b.left(|arm| {
                arm.map_color(|c| c).map_color(|c| c);
            })
            .right(|arm| {
                arm.map_color(|c| c);
            });
        });
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn build_drains_the_builder() {
        let mut builder = PipelineBuilder::new();
        builder.map_color(|c| c);
        let first = builder.build();
        assert!(builder.is_empty());
        assert_eq!(first.plan().len(), 2);
        assert_eq!(builder.build().plan(), vec!["1: END"]);
    }

    #[test]
    fn arms_accumulate_across_calls() {
        let pipeline = build_pipeline(|b| {
            b.branch(|br| {
                br.left(|arm| {
                    arm.map_color(|c| c);
                })
                .left(|arm| {
                    arm.paint(|_| {});
                });
            });
        });
        assert_eq!(
            pipeline.plan(),
            vec![
                "1: BRANCH",
                "[1-left]0: PROCESS [color]",
                "[1-left]1: PROCESS [mutate]",
                "[1-left]2: BRANCH-END #0",
                "[1-right]0: BRANCH-END #0",
                "2: COMBINE #0",
                "3: END",
            ],
        );
    }

    #[test]
    fn nested_branch_plan() {
        let pipeline = build_pipeline(|b| {
            b.branch(|outer| {
                outer.left(|arm| {
                    arm.branch(|inner| {
                        inner.right(|r| {
                            r.map_color(|c| c);
                        });
                    })
                    .map_color(|c| c);
                });
            })
            .map_color(|c| c);
        });
        assert_eq!(
            pipeline.plan(),
            vec![
                "1: BRANCH",
                "[1-left]0: BRANCH",
                "[1-left][0-left]0: BRANCH-END #1",
                "[1-left][0-right]0: PROCESS [color]",
                "[1-left][0-right]1: BRANCH-END #1",
                "[1-left]1: COMBINE #1",
                "[1-left]2: PROCESS [color]",
                "[1-left]3: BRANCH-END #0",
                "[1-right]0: BRANCH-END #0",
                "2: COMBINE #0",
                "3: PROCESS [color]",
                "4: END",
            ],
        );
    }
}
