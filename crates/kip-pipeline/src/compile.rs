//! Token list to step graph.
//!
//! The builder records a flat token list (branches nest their own
//! lists). Compilation is a right fold against [`PipelineStep::End`]:
//! each action wraps whatever follows it, and each branch wraps the
//! already-folded remainder in a single [`CombineStep`] that both arms
//! are then folded against. Both arms therefore end at the same
//! combinator by construction.

use std::rc::Rc;

use crate::action::PipelineAction;
use crate::step::{CombineFn, CombineStep, Pipeline, PipelineStep};
use crate::types::CombinatorId;

/// An uncompiled pipeline element.
pub(crate) enum Token {
    /// A single action.
    Action(PipelineAction),
    /// Two token lists and the function that merges their results.
    Branch {
        left: Vec<Self>,
        right: Vec<Self>,
        combine: Box<CombineFn>,
    },
}

/// Folds tokens into a step graph, handing out combinator ids.
///
/// One compiler per pipeline: ids are unique within the compiled graph
/// and start at `#0`.
#[derive(Debug, Default)]
pub(crate) struct GraphCompiler {
    next_id: u64,
}

impl GraphCompiler {
    pub(crate) fn compile(mut self, tokens: Vec<Token>) -> Pipeline {
        let first = self.fold(tokens, PipelineStep::End);
        tracing::debug!(combinators = self.next_id, "compiled pipeline");
        Pipeline::new(first)
    }

    fn fold(&mut self, tokens: Vec<Token>, end: PipelineStep) -> PipelineStep {
        tokens
            .into_iter()
            .rev()
            .fold(end, |next, token| self.wrap(token, next))
    }

    fn wrap(&mut self, token: Token, next: PipelineStep) -> PipelineStep {
        match token {
            Token::Action(action) => PipelineStep::Processing {
                action,
                next: Box::new(next),
            },
            Token::Branch {
                left,
                right,
                combine,
            } => {
                let merge = Rc::new(CombineStep::new(self.allocate_id(), combine, next));
                let left = self.fold(left, PipelineStep::BranchEnd(Rc::clone(&merge)));
                let right = self.fold(right, PipelineStep::BranchEnd(merge));
                PipelineStep::Branching {
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        }
    }

    const fn allocate_id(&mut self) -> CombinatorId {
        let id = CombinatorId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn action() -> Token {
        Token::Action(PipelineAction::color(|c| c))
    }

    fn branch(left: Vec<Token>, right: Vec<Token>) -> Token {
        Token::Branch {
            left,
            right,
            combine: Box::new(|left, _| Ok(left)),
        }
    }

    fn arms(step: &PipelineStep) -> (&PipelineStep, &PipelineStep) {
        let mut step = step;
        loop {
            step = match step {
                PipelineStep::Processing { next, .. } => next.as_ref(),
                PipelineStep::Branching { left, right } => return (left.as_ref(), right.as_ref()),
                _ => return (step, step),
            };
        }
    }

    #[test]
    fn empty_token_list_compiles_to_end() {
        let pipeline = GraphCompiler::default().compile(Vec::new());
        assert!(matches!(pipeline.first(), PipelineStep::End));
    }

    #[test]
    fn linear_tokens_keep_their_order() {
        let tokens = vec![
            Token::Action(PipelineAction::color(|c| c)),
            Token::Action(PipelineAction::mutate(|_| {})),
            Token::Action(PipelineAction::coordinate(|_, _, c| c)),
        ];
        let pipeline = GraphCompiler::default().compile(tokens);
        assert_eq!(
            pipeline.plan(),
            vec![
                "1: PROCESS [color]",
                "2: PROCESS [mutate]",
                "3: PROCESS [color+location]",
                "4: END",
            ],
        );
    }

    #[test]
    fn both_arms_reach_the_same_combine_step() {
        for (left, right) in [
            (vec![], vec![]),
            (vec![action(), action()], vec![]),
            (vec![], vec![action()]),
            (vec![action()], vec![action(), action(), action()]),
        ] {
            let tokens = vec![action(), branch(left, right), action()];
            let pipeline = GraphCompiler::default().compile(tokens);
            let (left, right) = arms(pipeline.first());

            let l = left.combinator().unwrap();
            let r = right.combinator().unwrap();
            assert!(std::ptr::eq(l, r));
            assert_eq!(l.id(), r.id());
        }
    }

    #[test]
    fn combine_step_owns_the_remainder() {
        let tokens = vec![branch(vec![action()], vec![]), action(), action()];
        let pipeline = GraphCompiler::default().compile(tokens);
        let (left, _) = arms(pipeline.first());
        let after_merge = left.combinator().unwrap().next();
        assert_eq!(after_merge.combinator().map(CombineStep::id), None);
        assert!(matches!(
            after_merge,
            PipelineStep::Processing { next, .. }
                if matches!(next.as_ref(), PipelineStep::Processing { .. })
        ));
    }

    #[test]
    fn nested_branches_get_distinct_ids() {
        let inner = branch(vec![action()], vec![action()]);
        let tokens = vec![branch(vec![inner], vec![]), branch(vec![], vec![])];
        let pipeline = GraphCompiler::default().compile(tokens);
        let plan = pipeline.plan();

        let ids: Vec<&str> = plan
            .iter()
            .filter(|line| line.contains("COMBINE"))
            .filter_map(|line| line.rsplit(' ').next())
            .collect();
        assert_eq!(ids.len(), 3);
        assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);
    }
}
