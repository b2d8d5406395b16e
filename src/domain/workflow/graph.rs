//! Flow graph definition and validation

use std::collections::HashMap;
use std::sync::Arc;

use super::error::WorkflowError;
use super::router::Router;
use super::step::Step;
use crate::domain::conversation::ConversationState;

/// Terminal node name
pub const END: &str = "__end__";

/// Outgoing edge of a step
#[derive(Debug, Clone)]
pub enum Transition {
    Direct(&'static str),
    Routed {
        router: Arc<dyn Router>,
        targets: HashMap<&'static str, &'static str>,
    },
}

/// Fixed set of named steps and the transitions between them
pub struct FlowGraph {
    entry: &'static str,
    steps: HashMap<&'static str, Arc<dyn Step>>,
    transitions: HashMap<&'static str, Transition>,
}

impl std::fmt::Debug for FlowGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.steps.keys().collect();
        names.sort();

        f.debug_struct("FlowGraph")
            .field("entry", &self.entry)
            .field("steps", &names)
            .finish()
    }
}

impl FlowGraph {
    pub fn builder(entry: &'static str) -> FlowGraphBuilder {
        FlowGraphBuilder::new(entry)
    }

    pub fn entry(&self) -> &'static str {
        self.entry
    }

    pub fn step(&self, name: &str) -> Option<&Arc<dyn Step>> {
        self.steps.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Sorted step names
    pub fn step_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.steps.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Name of the step (or `END`) that follows `from` for this state
    pub fn next(
        &self,
        from: &str,
        state: &ConversationState,
    ) -> Result<&'static str, WorkflowError> {
        let transition = self
            .transitions
            .get(from)
            .ok_or_else(|| WorkflowError::step_not_found(from))?;

        match transition {
            Transition::Direct(target) => Ok(*target),
            Transition::Routed { router, targets } => {
                let branch = router.decide(state);
                targets
                    .get(branch)
                    .copied()
                    .ok_or_else(|| WorkflowError::unmapped_branch(router.name(), branch))
            }
        }
    }
}

/// Collects steps and edges, validating them on `build`
pub struct FlowGraphBuilder {
    entry: &'static str,
    steps: HashMap<&'static str, Arc<dyn Step>>,
    transitions: HashMap<&'static str, Transition>,
    errors: Vec<String>,
}

impl FlowGraphBuilder {
    pub fn new(entry: &'static str) -> Self {
        Self {
            entry,
            steps: HashMap::new(),
            transitions: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl Step + 'static) -> Self {
        let name = step.name();
        if self.steps.insert(name, Arc::new(step)).is_some() {
            self.errors.push(format!("step '{}' registered twice", name));
        }
        self
    }

    pub fn edge(mut self, from: &'static str, to: &'static str) -> Self {
        self.add_transition(from, Transition::Direct(to));
        self
    }

    pub fn routed(
        mut self,
        from: &'static str,
        router: impl Router + 'static,
        targets: &[(&'static str, &'static str)],
    ) -> Self {
        let transition = Transition::Routed {
            router: Arc::new(router),
            targets: targets.iter().copied().collect(),
        };
        self.add_transition(from, transition);
        self
    }

    fn add_transition(&mut self, from: &'static str, transition: Transition) {
        if self.transitions.insert(from, transition).is_some() {
            self.errors
                .push(format!("step '{}' has more than one outgoing transition", from));
        }
    }

    pub fn build(self) -> Result<FlowGraph, WorkflowError> {
        let mut errors = self.errors;
        let known = |name: &str| name == END || self.steps.contains_key(name);

        if !self.steps.contains_key(self.entry) {
            errors.push(format!("entry step '{}' is not registered", self.entry));
        }

        for name in self.steps.keys() {
            if !self.transitions.contains_key(name) {
                errors.push(format!("step '{}' has no outgoing transition", name));
            }
        }

        for (from, transition) in &self.transitions {
            if !self.steps.contains_key(from) {
                errors.push(format!("transition from unknown step '{}'", from));
            }

            match transition {
                Transition::Direct(to) if !known(*to) => {
                    errors.push(format!("'{}' points to unknown step '{}'", from, to));
                }
                Transition::Direct(_) => {}
                Transition::Routed { router, targets } => {
                    for branch in router.branches() {
                        match targets.get(branch) {
                            None => errors.push(format!(
                                "router '{}' branch '{}' has no target",
                                router.name(),
                                branch
                            )),
                            Some(to) if !known(*to) => errors.push(format!(
                                "router '{}' branch '{}' points to unknown step '{}'",
                                router.name(),
                                branch,
                                to
                            )),
                            Some(_) => {}
                        }
                    }

                    for branch in targets.keys() {
                        if !router.branches().contains(branch) {
                            errors.push(format!(
                                "router '{}' never returns mapped branch '{}'",
                                router.name(),
                                branch
                            ));
                        }
                    }
                }
            }
        }

        if !errors.is_empty() {
            errors.sort();
            return Err(WorkflowError::configuration(errors.join("; ")));
        }

        Ok(FlowGraph {
            entry: self.entry,
            steps: self.steps,
            transitions: self.transitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::KnowsProvider;
    use crate::domain::workflow::step::mock::PassStep;

    #[derive(Debug)]
    struct KnowsRouter;

    impl Router for KnowsRouter {
        fn name(&self) -> &'static str {
            "knows"
        }

        fn branches(&self) -> &'static [&'static str] {
            &["knows", "unknown"]
        }

        fn decide(&self, state: &ConversationState) -> &'static str {
            if state.knows_provider == KnowsProvider::Yes {
                "knows"
            } else {
                "unknown"
            }
        }
    }

    fn graph() -> FlowGraph {
        FlowGraph::builder("a")
            .step(PassStep::new("a"))
            .step(PassStep::new("b"))
            .step(PassStep::new("c"))
            .routed("a", KnowsRouter, &[("knows", "b"), ("unknown", "c")])
            .edge("b", END)
            .edge("c", "b")
            .build()
            .unwrap()
    }

    #[test]
    fn test_direct_transition() {
        let graph = graph();
        let state = ConversationState::new("t1");

        assert_eq!(graph.next("b", &state).unwrap(), END);
        assert_eq!(graph.next("c", &state).unwrap(), "b");
    }

    #[test]
    fn test_routed_transition() {
        let graph = graph();
        let mut state = ConversationState::new("t1");

        assert_eq!(graph.next("a", &state).unwrap(), "c");

        state.knows_provider = KnowsProvider::Yes;
        assert_eq!(graph.next("a", &state).unwrap(), "b");
    }

    #[test]
    fn test_unmapped_branch_rejected() {
        let result = FlowGraph::builder("a")
            .step(PassStep::new("a"))
            .step(PassStep::new("b"))
            .routed("a", KnowsRouter, &[("knows", "b")])
            .edge("b", END)
            .build();

        let err = result.unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(_)));
        assert!(err.to_string().contains("branch 'unknown' has no target"));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let result = FlowGraph::builder("a")
            .step(PassStep::new("a"))
            .edge("a", "missing")
            .build();

        assert!(result.unwrap_err().to_string().contains("unknown step 'missing'"));
    }

    #[test]
    fn test_step_without_transition_rejected() {
        let result = FlowGraph::builder("a")
            .step(PassStep::new("a"))
            .step(PassStep::new("b"))
            .edge("a", END)
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("step 'b' has no outgoing transition"));
    }

    #[test]
    fn test_missing_entry_rejected() {
        let result = FlowGraph::builder("start")
            .step(PassStep::new("a"))
            .edge("a", END)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_step_names_sorted() {
        assert_eq!(graph().step_names(), vec!["a", "b", "c"]);
    }
}
