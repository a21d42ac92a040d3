//! Running a compiled pipeline.
//!
//! The executor owns three collaborators supplied through
//! [`ExecutorConfig`]: a loader producing the initial [`ImageStack`], a
//! saver receiving the final one, and a logger receiving progress lines
//! and the textual plan. The walk itself is a loop; only branch arms
//! recurse, so a long linear pipeline runs in constant stack depth.

use web_time::Instant;

use crate::action::PipelineAction;
use crate::diagnostics::{ActionCounts, ExecutionDiagnostics};
use crate::stack::ImageStack;
use crate::step::{CombineStep, Pipeline, PipelineStep};
use crate::types::{CombinatorId, PipelineError};

/// Produces the initial image stack.
pub type Loader = dyn Fn() -> Result<ImageStack, PipelineError>;
/// Persists the final image stack.
pub type Saver = dyn Fn(&ImageStack) -> Result<(), PipelineError>;
/// Receives progress text.
pub type Logger = dyn Fn(&str);

/// Side of the blank frame the default loader produces.
pub const DEFAULT_CANVAS_SIZE: u32 = 1000;

/// Collaborators for a [`PipelineExecutor`].
///
/// | Field  | Default                                                  |
/// |--------|----------------------------------------------------------|
/// | loader | blank 1000×1000 frame with alpha, history retained        |
/// | saver  | does nothing                                             |
/// | logger | does nothing                                             |
pub struct ExecutorConfig {
    loader: Box<Loader>,
    saver: Box<Saver>,
    logger: Box<Logger>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            loader: Box::new(|| {
                Ok(ImageStack::blank(
                    DEFAULT_CANVAS_SIZE,
                    DEFAULT_CANVAS_SIZE,
                    true,
                    true,
                ))
            }),
            saver: Box::new(|_| Ok(())),
            logger: Box::new(|_| {}),
        }
    }
}

impl ExecutorConfig {
    /// Replace the loader.
    #[must_use]
    pub fn with_loader(
        mut self,
        loader: impl Fn() -> Result<ImageStack, PipelineError> + 'static,
    ) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Replace the saver.
    #[must_use]
    pub fn with_saver(
        mut self,
        saver: impl Fn(&ImageStack) -> Result<(), PipelineError> + 'static,
    ) -> Self {
        self.saver = Box::new(saver);
        self
    }

    /// Replace the logger.
    #[must_use]
    pub fn with_logger(mut self, logger: impl Fn(&str) + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }
}

impl std::fmt::Debug for ExecutorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorConfig").finish_non_exhaustive()
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct Execution {
    /// The stack handed to the saver.
    pub stack: ImageStack,
    /// Timing and counts for the run.
    pub diagnostics: ExecutionDiagnostics,
}

/// Walks compiled pipelines against loaded image stacks.
#[derive(Debug, Default)]
pub struct PipelineExecutor {
    config: ExecutorConfig,
}

/// Where one walk of a chain stopped.
enum Walk<'p> {
    /// Reached [`PipelineStep::End`].
    Ended(ImageStack),
    /// Reached a [`PipelineStep::BranchEnd`].
    Merging(ImageStack, &'p CombineStep),
}

impl Walk<'_> {
    fn combinator(&self) -> Option<CombinatorId> {
        match self {
            Self::Ended(_) => None,
            Self::Merging(_, combine) => Some(combine.id()),
        }
    }
}

#[derive(Default)]
struct WalkCounts {
    actions: ActionCounts,
    branches: usize,
    merges: usize,
}

impl PipelineExecutor {
    /// An executor using `config`'s collaborators.
    #[must_use]
    pub const fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Load, run `pipeline`, save.
    ///
    /// The saver sees the final stack exactly once, and the same stack is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns the loader's or saver's error unchanged,
    /// [`PipelineError::CombinatorMismatch`] if a branch's arms end at
    /// different combinators, or whatever a combinator returns (for the
    /// bundled ones, [`PipelineError::SizeMismatch`]).
    #[tracing::instrument(skip_all)]
    pub fn execute(&self, pipeline: &Pipeline) -> Result<Execution, PipelineError> {
        let start = Instant::now();
        self.log("starting pipeline execution");
        self.log("=== execution plan ===");
        self.log(&pipeline.to_string());

        self.log("PREPARE: load image");
        let load_start = Instant::now();
        let stack = (self.config.loader)()?;
        let load_duration = load_start.elapsed();
        tracing::debug!(
            frames = stack.len(),
            dimensions = %stack.top().dimensions(),
            "loaded initial stack"
        );

        let walk_start = Instant::now();
        let mut counts = WalkCounts::default();
        let stack = match self.walk(stack, pipeline.first(), &mut counts)? {
            Walk::Ended(stack) => stack,
            Walk::Merging(stack, combine) => {
                tracing::warn!(
                    combinator = %combine.id(),
                    "pipeline ended at a branch end outside any branch"
                );
                stack
            }
        };
        let walk_duration = walk_start.elapsed();

        self.log("FINALIZE: save image");
        let save_start = Instant::now();
        (self.config.saver)(&stack)?;
        let save_duration = save_start.elapsed();

        let diagnostics = ExecutionDiagnostics {
            load_duration,
            walk_duration,
            save_duration,
            total_duration: start.elapsed(),
            actions: counts.actions,
            branches: counts.branches,
            merges: counts.merges,
            final_frames: stack.len(),
            final_dimensions: stack.top().dimensions(),
        };
        tracing::info!(
            actions = diagnostics.actions.total(),
            merges = diagnostics.merges,
            duration_ms = diagnostics.total_duration.as_secs_f64() * 1000.0,
            "pipeline finished"
        );
        Ok(Execution { stack, diagnostics })
    }

    fn log(&self, line: &str) {
        (self.config.logger)(line);
    }

    /// Walk from `step` until an `End` or `BranchEnd`.
    fn walk<'p>(
        &self,
        mut stack: ImageStack,
        step: &'p PipelineStep,
        counts: &mut WalkCounts,
    ) -> Result<Walk<'p>, PipelineError> {
        let mut step = step;
        loop {
            match step {
                PipelineStep::Processing { action, next } => {
                    apply(action, &mut stack, counts);
                    step = next.as_ref();
                }
                PipelineStep::Branching { left, right } => {
                    counts.branches += 1;
                    let right_stack = stack.branch(false);
                    let left = self.walk(stack, left, counts)?;
                    let right = self.walk(right_stack, right, counts)?;
                    match (left, right) {
                        (Walk::Merging(l, combine), Walk::Merging(r, other))
                            if combine.id() == other.id() =>
                        {
                            tracing::debug!(combinator = %combine.id(), "merging branch arms");
                            stack = combine.combine(l, r)?;
                            counts.merges += 1;
                            step = combine.next();
                        }
                        (Walk::Ended(l), Walk::Ended(_)) => {
                            tracing::debug!("both branch arms ended without a combinator");
                            return Ok(Walk::Ended(l));
                        }
                        (left, right) => {
                            return Err(PipelineError::CombinatorMismatch {
                                left: left.combinator(),
                                right: right.combinator(),
                            });
                        }
                    }
                }
                PipelineStep::BranchEnd(combine) => {
                    return Ok(Walk::Merging(stack, combine.as_ref()));
                }
                PipelineStep::End => return Ok(Walk::Ended(stack)),
            }
        }
    }
}

fn apply(action: &PipelineAction, stack: &mut ImageStack, counts: &mut WalkCounts) {
    tracing::trace!(kind = %action.kind(), "applying action");
    action.apply(stack);
    counts.actions.record(action.kind());
}
