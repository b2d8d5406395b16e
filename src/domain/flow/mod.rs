//! PCP assignment and specialist search flows
//!
//! Both flows share one graph: `load_case` and the menu in `start` are common,
//! then the menu router picks the PCP or specialist branch.

pub mod response;
pub mod routers;
mod settings;
pub mod stages;
pub mod steps;


use std::sync::Arc;

pub use response::{ResponseMapper, TurnReply};
pub use settings::{
    render_distance, FlowSettings, DEFAULT_DISTANCE_TOKEN, DEFAULT_FILTERS_TEMPLATE,
    DEFAULT_SPECIALIST_SERVICE_PROMPT,
};

use crate::domain::directory::{MemberDirectory, PcpWriter, ProviderDirectory};
use crate::domain::intent::Classifier;
use crate::domain::workflow::{FlowGraph, WorkflowError, END};
use routers::{
    branch, FollowupRouter, KnowsProviderRouter, MenuRouter, PostCompletionRouter,
    SpecialistAddressRouter,
};
use steps::*;

/// Step names, also used as resume positions
pub mod names {
    pub const LOAD_CASE: &str = "load_case";
    pub const START: &str = "start";
    pub const ASSIGN_PCP_ASK_TERMINATION: &str = "assign_pcp_ask_termination";
    pub const COLLECT_TERMINATION_REASON: &str = "collect_termination_reason";
    pub const COLLECT_KNOWS_PROVIDER: &str = "collect_knows_provider";
    pub const COLLECT_PROVIDER_INPUT: &str = "collect_provider_input";
    pub const COLLECT_NO_FLOW_FILTERS: &str = "collect_no_flow_filters";
    pub const RUN_PROVIDER_SEARCH: &str = "run_provider_search";
    pub const PROVIDER_INTERACTION: &str = "provider_interaction";
    pub const WAIT_NEXT_FOLLOWUP: &str = "wait_next_followup";
    pub const PROVIDER_ID_ONLY_WARNING: &str = "provider_id_only_warning";
    pub const UPDATE_PCP: &str = "update_pcp";
    pub const SPECIALIST_ASK_SERVICE: &str = "specialist_ask_service";
    pub const SPECIALIST_ASK_FILTERS: &str = "specialist_ask_filters";
    pub const RUN_SPECIALIST_GENERIC_SEARCH: &str = "run_specialist_generic_search";
    pub const SPECIALIST_PROVIDER_ADDRESS: &str = "specialist_provider_address";
    pub const SPECIALIST_POST_COMPLETION: &str = "specialist_post_completion";
    pub const RETURN_TO_MENU: &str = "return_to_menu";
}

/// Collaborators shared by the flow steps
#[derive(Clone)]
pub struct FlowDeps {
    pub classifier: Arc<dyn Classifier>,
    pub providers: Arc<dyn ProviderDirectory>,
    pub members: Arc<dyn MemberDirectory>,
    pub pcp_writer: Arc<dyn PcpWriter>,
    pub settings: Arc<FlowSettings>,
}

/// Assemble and validate the conversation graph
pub fn build_flow_graph(deps: &FlowDeps) -> Result<FlowGraph, WorkflowError> {
    use names::*;

    FlowGraph::builder(LOAD_CASE)
        // Shared entry
        .step(LoadCase::new(deps.members.clone()))
        .step(Start::new(deps.classifier.clone()))
        .edge(LOAD_CASE, START)
        .routed(
            START,
            MenuRouter,
            &[
                (branch::ASSIGN_PCP, ASSIGN_PCP_ASK_TERMINATION),
                (branch::SPECIALIST, SPECIALIST_ASK_SERVICE),
                (branch::UNSUPPORTED, END),
            ],
        )
        // PCP assignment
        .step(AssignPcpAskTermination)
        .step(CollectTerminationReason::new(deps.classifier.clone()))
        .step(CollectKnowsProvider::new(deps.classifier.clone()))
        .step(CollectProviderInput)
        .step(CollectNoFlowFilters::new(deps.settings.clone()))
        .step(RunProviderSearch::new(
            deps.classifier.clone(),
            deps.providers.clone(),
            deps.settings.clone(),
        ))
        .step(ProviderInteraction::new(
            deps.classifier.clone(),
            deps.providers.clone(),
        ))
        .step(WaitNextFollowup)
        .step(ProviderIdOnlyWarning)
        .step(UpdatePcp::new(deps.members.clone(), deps.pcp_writer.clone()))
        .edge(ASSIGN_PCP_ASK_TERMINATION, COLLECT_TERMINATION_REASON)
        .edge(COLLECT_TERMINATION_REASON, COLLECT_KNOWS_PROVIDER)
        .routed(
            COLLECT_KNOWS_PROVIDER,
            KnowsProviderRouter,
            &[
                (branch::KNOWS, COLLECT_PROVIDER_INPUT),
                (branch::UNKNOWN, COLLECT_NO_FLOW_FILTERS),
            ],
        )
        .edge(COLLECT_PROVIDER_INPUT, RUN_PROVIDER_SEARCH)
        .edge(COLLECT_NO_FLOW_FILTERS, RUN_PROVIDER_SEARCH)
        .edge(RUN_PROVIDER_SEARCH, PROVIDER_INTERACTION)
        .routed(
            PROVIDER_INTERACTION,
            FollowupRouter,
            &[
                (branch::ASSIGN, UPDATE_PCP),
                (branch::PID_ONLY, PROVIDER_ID_ONLY_WARNING),
                (branch::LOOP, WAIT_NEXT_FOLLOWUP),
            ],
        )
        .edge(WAIT_NEXT_FOLLOWUP, PROVIDER_INTERACTION)
        .edge(PROVIDER_ID_ONLY_WARNING, PROVIDER_INTERACTION)
        .edge(UPDATE_PCP, END)
        // Specialist search
        .step(SpecialistAskService::new(
            deps.classifier.clone(),
            deps.settings.clone(),
        ))
        .step(SpecialistAskFilters::new(
            deps.classifier.clone(),
            deps.settings.clone(),
        ))
        .step(RunSpecialistGenericSearch::new(
            deps.classifier.clone(),
            deps.providers.clone(),
            deps.settings.clone(),
        ))
        .step(SpecialistProviderAddress::new(
            deps.classifier.clone(),
            deps.providers.clone(),
        ))
        .step(SpecialistPostCompletion::new(deps.classifier.clone()))
        .step(ReturnToMenu)
        .edge(SPECIALIST_ASK_SERVICE, SPECIALIST_ASK_FILTERS)
        .edge(SPECIALIST_ASK_FILTERS, RUN_SPECIALIST_GENERIC_SEARCH)
        .edge(RUN_SPECIALIST_GENERIC_SEARCH, SPECIALIST_PROVIDER_ADDRESS)
        .routed(
            SPECIALIST_PROVIDER_ADDRESS,
            SpecialistAddressRouter,
            &[
                (branch::DONE, SPECIALIST_POST_COMPLETION),
                (branch::LOOP, SPECIALIST_PROVIDER_ADDRESS),
            ],
        )
        .routed(
            SPECIALIST_POST_COMPLETION,
            PostCompletionRouter,
            &[(branch::END, END), (branch::MENU, RETURN_TO_MENU)],
        )
        .edge(RETURN_TO_MENU, START)
        .build()
}
