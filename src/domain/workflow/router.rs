use std::fmt::Debug;

use crate::domain::conversation::ConversationState;

/// Pure branch decision at a fork in the graph.
///
/// `decide` must only ever return one of `branches()`; the graph builder
/// checks that every declared branch has a target.
pub trait Router: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn branches(&self) -> &'static [&'static str];

    fn decide(&self, state: &ConversationState) -> &'static str;
}
