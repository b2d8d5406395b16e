//! Resumable workflow engine
//!
//! A [`FlowGraph`] is a fixed set of named [`Step`]s joined by direct or
//! [`Router`]-guarded transitions. The [`Engine`] runs a thread's graph from
//! its saved resume position until a step suspends or the graph ends, then
//! persists state and position through a [`StateStore`].

mod engine;
mod error;
mod graph;
mod router;
mod step;
mod store;

pub use engine::{Engine, EngineConfig, EngineOutcome, TurnInput, TurnResult};
pub use error::WorkflowError;
pub use graph::{FlowGraph, FlowGraphBuilder, Transition, END};
pub use router::Router;
pub use step::{Interrupt, Step, StepOutcome};
pub use store::{StateStore, ThreadRecord};
