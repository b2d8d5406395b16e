use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{classified, fail, search_context};
use crate::domain::conversation::{ConversationState, KnowsProvider};
use crate::domain::directory::{
    render_provider_list, ProviderDirectory, ProviderQuery, ProviderRecord, ResolvedSearch,
    SearchDefaults, SearchType,
};
use crate::domain::flow::steps::provider_input::PROVIDER_INPUT_PROMPT;
use crate::domain::flow::{names, stages, FlowSettings};
use crate::domain::intent::{heuristics, Classifier};
use crate::domain::workflow::{Interrupt, Step, StepOutcome};
use crate::domain::DomainError;

const SEARCH_FAILED: &str =
    "We couldn't complete the provider search right now. Please try again later.";

const NO_RESULTS: &str = "No providers matched that search. ";

pub const LIST_TITLE: &str =
    "Reply with \"Assign <ProviderID>\" to select a provider, or ask for a provider's address.";

pub const SPECIALIST_LIST_TITLE: &str =
    "Ask for \"address of <ProviderID>\" to see where a provider practices.";

fn provider_list(records: &[ProviderRecord], title: &str) -> Interrupt {
    Interrupt::new(stages::SHOW_PROVIDER_LIST, render_provider_list(records))
        .with_code(107)
        .with_title(title)
}

/// Shown list on revisit, or `None` when no provider was found yet.
///
/// A populated result is never replaced: with a pending message the step
/// hands over to the follow-up step, otherwise it shows the same list again.
fn revisit(state: &ConversationState, title: &str) -> Option<StepOutcome> {
    if !state.has_search_results() {
        return None;
    }
    let results = state.providers_result.as_deref()?;

    if state.has_input() {
        Some(StepOutcome::Advance)
    } else {
        Some(StepOutcome::Suspend(provider_list(results, title)))
    }
}

/// Parse with the classifier; when that fails or leaves out a required
/// criterion, use the rule-based parse instead.
fn pick_query(
    parsed: ProviderQuery,
    fallback: impl FnOnce() -> ProviderQuery,
    defaults: &SearchDefaults,
) -> (ProviderQuery, ResolvedSearch) {
    let resolved = parsed.resolve(defaults);
    if resolved.missing_criterion().is_none() {
        return (parsed, resolved);
    }

    let fallback = fallback();
    let fallback_resolved = fallback.resolve(defaults);
    if fallback_resolved.missing_criterion().is_none() {
        (fallback, fallback_resolved)
    } else {
        (parsed, resolved)
    }
}

fn search_api_name(search_type: SearchType) -> &'static str {
    match search_type {
        SearchType::Id => "ProviderSearchById",
        SearchType::NameCityState => "ProviderSearchByName",
        SearchType::ZipOnly => "ProviderSearchByZip",
    }
}

/// PCP search, keyed by provider id or name when the provider is known and
/// by ZIP otherwise.
pub struct RunProviderSearch {
    classifier: Arc<dyn Classifier>,
    providers: Arc<dyn ProviderDirectory>,
    settings: Arc<FlowSettings>,
}

impl RunProviderSearch {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        providers: Arc<dyn ProviderDirectory>,
        settings: Arc<FlowSettings>,
    ) -> Self {
        Self {
            classifier,
            providers,
            settings,
        }
    }

    fn ask_again(&self, state: &ConversationState, prefix: &str) -> Interrupt {
        if state.knows_provider == KnowsProvider::Yes {
            Interrupt::new(
                stages::ASK_PROVIDER_INPUT,
                format!("{}{}", prefix, PROVIDER_INPUT_PROMPT),
            )
            .with_code(103)
            .dialog()
        } else {
            Interrupt::new(
                stages::ASK_NO_FLOW_FILTERS,
                format!("{}{}", prefix, self.settings.no_flow_filters_prompt()),
            )
            .with_code(103)
            .dialog()
        }
    }

    fn clear_raw_input(state: &mut ConversationState) {
        if state.knows_provider == KnowsProvider::Yes {
            state.raw_provider_input = None;
        } else {
            state.raw_filter_input = None;
        }
    }

    fn raw_input(state: &mut ConversationState) -> Option<String> {
        if state.knows_provider == KnowsProvider::Yes {
            if state.raw_provider_input.is_none() {
                state.raw_provider_input = state.take_input();
            }
            state.raw_provider_input.clone()
        } else {
            if state.raw_filter_input.is_none() {
                state.raw_filter_input = state.take_input();
            }
            state.raw_filter_input.clone()
        }
    }

    async fn parse(
        &self,
        state: &mut ConversationState,
        raw: &str,
        defaults: &SearchDefaults,
    ) -> (ProviderQuery, ResolvedSearch) {
        if state.knows_provider == KnowsProvider::Yes {
            let result = self.classifier.parse_provider_query(raw).await;
            let parsed = classified(state, "parse_provider_query", result, || {
                heuristics::provider_query(raw)
            });
            pick_query(parsed, || heuristics::provider_query(raw), defaults)
        } else {
            let result = self.classifier.parse_search_filters(raw).await;
            let mut parsed = classified(state, "parse_search_filters", result, || {
                heuristics::search_filters(raw)
            });
            parsed.search_type = Some(SearchType::ZipOnly);
            pick_query(
                parsed,
                || ProviderQuery {
                    search_type: Some(SearchType::ZipOnly),
                    ..heuristics::search_filters(raw)
                },
                defaults,
            )
        }
    }
}

#[async_trait]
impl Step for RunProviderSearch {
    fn name(&self) -> &'static str {
        names::RUN_PROVIDER_SEARCH
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if let Some(outcome) = revisit(state, LIST_TITLE) {
            return outcome;
        }

        let Some(raw) = Self::raw_input(state) else {
            return StepOutcome::Suspend(self.ask_again(state, ""));
        };

        let defaults = SearchDefaults::today(self.settings.default_radius_miles);
        let (query, search) = self.parse(state, &raw, &defaults).await;

        if let Some(missing) = search.missing_criterion() {
            debug!(thread_id = %state.thread_id, missing, "Provider search input incomplete");
            Self::clear_raw_input(state);
            state.provider_query = ProviderQuery::default();
            let prefix = format!("I couldn't find a {} in your reply. ", missing);
            return StepOutcome::Suspend(self.ask_again(state, &prefix));
        }

        state.provider_query = query;
        state.record_api_call(search_api_name(search.search_type));

        match self.providers.search(&search, &search_context(state)).await {
            Ok(results) => {
                info!(
                    thread_id = %state.thread_id,
                    search_type = search.search_type.as_str(),
                    count = results.len(),
                    "Provider search completed"
                );
                if results.is_empty() {
                    Self::clear_raw_input(state);
                    state.providers_result = None;
                    return StepOutcome::Suspend(self.ask_again(state, NO_RESULTS));
                }
                let interrupt = provider_list(&results, LIST_TITLE);
                state.providers_result = Some(results);
                StepOutcome::Suspend(interrupt)
            }
            Err(e) => fail(state, self.name(), &e, SEARCH_FAILED),
        }
    }
}

/// Specialist search around the ZIP from the filter answer
pub struct RunSpecialistGenericSearch {
    classifier: Arc<dyn Classifier>,
    providers: Arc<dyn ProviderDirectory>,
    settings: Arc<FlowSettings>,
}

impl RunSpecialistGenericSearch {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        providers: Arc<dyn ProviderDirectory>,
        settings: Arc<FlowSettings>,
    ) -> Self {
        Self {
            classifier,
            providers,
            settings,
        }
    }

    fn ask_again(&self, prefix: &str) -> Interrupt {
        Interrupt::new(
            stages::ASK_SPECIALIST_FILTERS,
            format!("{}{}", prefix, self.settings.specialist_filters_prompt()),
        )
        .with_code(103)
        .dialog()
    }
}

#[async_trait]
impl Step for RunSpecialistGenericSearch {
    fn name(&self) -> &'static str {
        names::RUN_SPECIALIST_GENERIC_SEARCH
    }

    async fn run(&self, state: &mut ConversationState) -> StepOutcome {
        if let Some(outcome) = revisit(state, SPECIALIST_LIST_TITLE) {
            return outcome;
        }

        if state.raw_filter_input.is_none() {
            state.raw_filter_input = state.take_input();
        }
        let Some(raw) = state.raw_filter_input.clone() else {
            return StepOutcome::Suspend(
                Interrupt::new(
                    stages::ASK_SPECIALIST_FILTERS,
                    self.settings.specialist_filters_prompt(),
                )
                .with_code(103)
                .dialog(),
            );
        };

        let Some(specialty) = state.specialist_service.clone() else {
            let error = DomainError::missing_precondition(
                "The specialist or service type was not captured. Please start a new search.",
            );
            return fail(state, self.name(), &error, "");
        };

        let defaults = SearchDefaults::today(self.settings.default_radius_miles);
        let result = self.classifier.parse_search_filters(&raw).await;
        let mut parsed = classified(state, "parse_search_filters", result, || {
            heuristics::search_filters(&raw)
        });
        parsed.search_type = Some(SearchType::ZipOnly);
        let (query, search) = pick_query(
            parsed,
            || ProviderQuery {
                search_type: Some(SearchType::ZipOnly),
                ..heuristics::search_filters(&raw)
            },
            &defaults,
        );

        if let Some(missing) = search.missing_criterion() {
            state.raw_filter_input = None;
            let prefix = format!("I couldn't find a {} in your reply. ", missing);
            return StepOutcome::Suspend(self.ask_again(&prefix));
        }

        state.provider_query = query;
        state.record_api_call("SpecialistSearch");

        match self
            .providers
            .search_specialists(&specialty, &search, &search_context(state))
            .await
        {
            Ok(results) => {
                info!(
                    thread_id = %state.thread_id,
                    specialty = %specialty,
                    count = results.len(),
                    "Specialist search completed"
                );
                if results.is_empty() {
                    state.raw_filter_input = None;
                    state.providers_result = None;
                    return StepOutcome::Suspend(self.ask_again(NO_RESULTS));
                }
                let interrupt = provider_list(&results, SPECIALIST_LIST_TITLE);
                state.providers_result = Some(results);
                StepOutcome::Suspend(interrupt)
            }
            Err(e) => fail(state, self.name(), &e, SEARCH_FAILED),
        }
    }
}
