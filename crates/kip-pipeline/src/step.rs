//! The compiled step graph and its textual plan.
//!
//! A [`Pipeline`] owns a tree of [`PipelineStep`] nodes. Branch arms do
//! not own their merge point: each arm ends in a
//! [`PipelineStep::BranchEnd`] holding an `Rc` to the one [`CombineStep`]
//! both arms share, and that combine step owns the rest of the graph.

use std::fmt;
use std::rc::Rc;

use crate::action::PipelineAction;
use crate::stack::ImageStack;
use crate::types::{CombinatorId, PipelineError};

/// Merge function joining the stacks produced by a branch's two arms.
pub type CombineFn = dyn Fn(ImageStack, ImageStack) -> Result<ImageStack, PipelineError>;

/// One node of the step graph.
#[derive(Debug)]
pub enum PipelineStep {
    /// Apply `action`, then continue with `next`.
    Processing {
        /// The work done at this step.
        action: PipelineAction,
        /// The step after this one.
        next: Box<PipelineStep>,
    },
    /// Walk both arms, then merge at their shared combinator.
    Branching {
        /// Arm walked on the current stack.
        left: Box<PipelineStep>,
        /// Arm walked on a fresh single-frame branch of the current stack.
        right: Box<PipelineStep>,
    },
    /// End of one branch arm.
    BranchEnd(Rc<CombineStep>),
    /// End of the pipeline.
    End,
}

/// The merge point shared by both arms of one branch.
pub struct CombineStep {
    id: CombinatorId,
    combine: Box<CombineFn>,
    next: PipelineStep,
}

impl CombineStep {
    /// A combinator that merges with `combine` and continues with `next`.
    #[must_use]
    pub fn new(id: CombinatorId, combine: Box<CombineFn>, next: PipelineStep) -> Self {
        Self { id, combine, next }
    }

    /// Identifier both arms are compared by.
    #[must_use]
    pub const fn id(&self) -> CombinatorId {
        self.id
    }

    /// The step after the merge.
    #[must_use]
    pub const fn next(&self) -> &PipelineStep {
        &self.next
    }

    /// Merge the two arm results.
    ///
    /// # Errors
    ///
    /// Propagates whatever the merge function returns, typically
    /// [`PipelineError::SizeMismatch`].
    pub fn combine(&self, left: ImageStack, right: ImageStack) -> Result<ImageStack, PipelineError> {
        (self.combine)(left, right)
    }
}

impl fmt::Debug for CombineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombineStep")
            .field("id", &self.id)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

impl PipelineStep {
    /// The combinator this step's chain runs into, if any.
    ///
    /// Nested branches are skipped over by following their own
    /// combinator's `next`.
    #[must_use]
    pub fn combinator(&self) -> Option<&CombineStep> {
        let mut step = self;
        loop {
            step = match step {
                Self::Processing { next, .. } => next.as_ref(),
                Self::Branching { left, .. } => left.combinator()?.next(),
                Self::BranchEnd(combine) => return Some(combine.as_ref()),
                Self::End => return None,
            };
        }
    }
}

/// An immutable, compiled pipeline.
///
/// Built by [`PipelineBuilder::build`](crate::PipelineBuilder::build).
/// Its [`Display`](fmt::Display) output is the textual plan.
#[derive(Debug)]
pub struct Pipeline {
    first: PipelineStep,
}

impl Pipeline {
    /// Wrap an entry node.
    #[must_use]
    pub const fn new(first: PipelineStep) -> Self {
        Self { first }
    }

    /// The entry node.
    #[must_use]
    pub const fn first(&self) -> &PipelineStep {
        &self.first
    }

    /// One line per step, top level numbered from 1.
    ///
    /// ```text
    /// 1: PROCESS [color]
    /// 2: BRANCH
    /// [2-left]0: PROCESS [color]
    /// [2-left]1: BRANCH-END #0
    /// [2-right]0: BRANCH-END #0
    /// 3: COMBINE #0
    /// 4: END
    /// ```
    #[must_use]
    pub fn plan(&self) -> Vec<String> {
        let mut lines = Vec::new();
        plan_lines(&self.first, "", 1, &mut lines);
        lines
    }
}

fn plan_lines(step: &PipelineStep, prefix: &str, start: usize, lines: &mut Vec<String>) {
    let mut step = step;
    let mut idx = start;
    loop {
        match step {
            PipelineStep::Processing { action, next } => {
                lines.push(format!("{prefix}{idx}: PROCESS {action}"));
                step = next.as_ref();
                idx += 1;
            }
            PipelineStep::Branching { left, right } => {
                lines.push(format!("{prefix}{idx}: BRANCH"));
                plan_lines(left, &format!("{prefix}[{idx}-left]"), 0, lines);
                plan_lines(right, &format!("{prefix}[{idx}-right]"), 0, lines);
                let Some(combine) = left.combinator() else {
                    return;
                };
                lines.push(format!("{prefix}{}: COMBINE {}", idx + 1, combine.id()));
                step = combine.next();
                idx += 2;
            }
            PipelineStep::BranchEnd(combine) => {
                lines.push(format!("{prefix}{idx}: BRANCH-END {}", combine.id()));
                return;
            }
            PipelineStep::End => {
                lines.push(format!("{prefix}{idx}: END"));
                return;
            }
        }
    }
}

impl Drop for Pipeline {
    // Unlink the graph through an explicit work list so neither a long
    // chain nor one hanging off a branch recurses once per step. A shared
    // combinator is unlinked by whichever arm releases it last.
    fn drop(&mut self) {
        let mut pending = vec![std::mem::replace(&mut self.first, PipelineStep::End)];
        while let Some(step) = pending.pop() {
            match step {
                PipelineStep::Processing { next, .. } => pending.push(*next),
                PipelineStep::Branching { left, right } => {
                    pending.push(*left);
                    pending.push(*right);
                }
                PipelineStep::BranchEnd(combine) => {
                    if let Ok(combine) = Rc::try_unwrap(combine) {
                        pending.push(combine.next);
                    }
                }
                PipelineStep::End => {}
            }
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plan().join("\n"))
    }
}
