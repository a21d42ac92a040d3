//! kip-pipeline: in-process image transformation pipeline (sans-IO).
//!
//! A pipeline is declared with a [`PipelineBuilder`], compiled into a
//! step graph ([`Pipeline`]) and run by a [`PipelineExecutor`] against an
//! [`ImageStack`]. Every step reads the stack's current [`Frame`] and
//! pushes a new one; with history retained the stack keeps every
//! intermediate frame. Branches run two arms on separate stacks and
//! merge them through a combinator.
//!
//! This crate has **no I/O dependencies**. Loading and saving happen
//! through collaborator closures on [`ExecutorConfig`]; the codec and
//! filesystem implementations live in `kip-io`.
//!
//! ```
//! use kip_pipeline::{
//!     ExecutorConfig, Frame, ImageStack, MutablePixelAccess, OverflowPolicy, PipelineExecutor,
//!     PixelAccess, PixelColor, actions, build_pipeline,
//! };
//!
//! let mut frame = Frame::blank(2, 2, true);
//! for y in 0..2 {
//!     for x in 0..2 {
//!         frame.write(x, y, PixelColor::new(10, 20, 30, 255));
//!     }
//! }
//! let pipeline = build_pipeline(|b| {
//!     b.branch(|br| {
//!         br.right(|arm| {
//!             arm.map_color(actions::invert());
//!         })
//!         .add(OverflowPolicy::Clamp);
//!     });
//! });
//!
//! let config = ExecutorConfig::default()
//!     .with_loader(move || Ok(ImageStack::new(frame.clone(), false)));
//! let run = PipelineExecutor::new(config).execute(&pipeline)?;
//! assert_eq!(run.stack.top().read(0, 0), PixelColor::new(255, 255, 255, 255));
//! # Ok::<(), kip_pipeline::PipelineError>(())
//! ```

pub mod access;
pub mod action;
pub mod actions;
mod arithmetic;
pub mod blur;
pub mod builder;
pub mod color;
mod compile;
pub mod diagnostics;
pub mod executor;
pub mod filters;
pub mod frame;
pub mod mask;
pub mod stack;
pub mod step;
pub mod types;

pub use access::{MutablePixelAccess, PixelAccess};
pub use action::{ActionKind, PipelineAction};
pub use builder::{BranchBuilder, PipelineBuilder, build_pipeline};
pub use color::{ParseColorError, PixelColor};
pub use diagnostics::{ActionCounts, ExecutionDiagnostics};
pub use executor::{Execution, ExecutorConfig, PipelineExecutor};
pub use frame::Frame;
pub use stack::ImageStack;
pub use step::{CombineStep, Pipeline, PipelineStep};
pub use types::{CombinatorId, Dimensions, OverflowPolicy, PipelineError};
