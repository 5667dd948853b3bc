use crate::api::{issue, Request, RequestSink};
use crate::errors::ApiError;
use crate::filters::CriteriaSubscriber;
use crate::models::{FilterCriteria, OptionList};
use tracing::{debug, info, warn};

/// Option lists that do not depend on any other filter. Loaded once; a failed
/// load leaves the list empty and the dashboard keeps working.
#[derive(Debug, Default)]
pub struct OptionsCatalog {
    categories: OptionList,
    states: OptionList,
}

impl OptionsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the two independent startup requests.
    pub fn request_all(sink: &RequestSink) {
        issue(sink, Request::Categories);
        issue(sink, Request::States);
    }

    pub fn categories(&self) -> &OptionList {
        &self.categories
    }

    pub fn states(&self) -> &OptionList {
        &self.states
    }

    pub fn apply_categories(&mut self, result: Result<OptionList, ApiError>) {
        self.categories = resolve_list("categories", result);
    }

    pub fn apply_states(&mut self, result: Result<OptionList, ApiError>) {
        self.states = resolve_list("states", result);
    }
}

fn resolve_list(dimension: &str, result: Result<OptionList, ApiError>) -> OptionList {
    match result {
        Ok(list) => {
            info!(dimension, count = list.len(), "option list loaded");
            list
        }
        Err(err) => {
            warn!(dimension, "failed to load option list: {err}");
            OptionList::new()
        }
    }
}

/// An option list scoped to the current value of a parent filter.
#[derive(Debug)]
struct DependentList {
    dimension: &'static str,
    parent: Option<String>,
    options: OptionList,
}

impl DependentList {
    fn new(dimension: &'static str) -> Self {
        Self {
            dimension,
            parent: None,
            options: OptionList::new(),
        }
    }

    /// Follows the parent value. On change the old list is dropped at once;
    /// returns the parent to request options for, if any.
    fn track(&mut self, parent: Option<&str>) -> Option<String> {
        if self.parent.as_deref() == parent {
            return None;
        }
        self.parent = parent.map(str::to_string);
        self.options = OptionList::new();
        self.parent.clone()
    }

    fn accept(&mut self, parent: &str, result: Result<OptionList, ApiError>) -> bool {
        if self.parent.as_deref() != Some(parent) {
            debug!(
                dimension = self.dimension,
                parent,
                current = ?self.parent,
                "discarding stale option list"
            );
            return false;
        }
        self.options = resolve_list(self.dimension, result);
        true
    }
}

/// Keeps subcategories in step with the category and cities in step with
/// the state. Results are applied only while they still match the parent
/// value they were requested for, whatever order they arrive in.
#[derive(Debug)]
pub struct DependentOptionsResolver {
    subcategories: DependentList,
    cities: DependentList,
    sink: RequestSink,
}

impl DependentOptionsResolver {
    pub fn new(sink: RequestSink) -> Self {
        Self {
            subcategories: DependentList::new("subcategories"),
            cities: DependentList::new("cities"),
            sink,
        }
    }

    pub fn subcategories(&self) -> &OptionList {
        &self.subcategories.options
    }

    pub fn cities(&self) -> &OptionList {
        &self.cities.options
    }

    /// Returns whether the result was applied.
    pub fn apply_subcategories(&mut self, category: &str, result: Result<OptionList, ApiError>) -> bool {
        self.subcategories.accept(category, result)
    }

    /// Returns whether the result was applied.
    pub fn apply_cities(&mut self, state: &str, result: Result<OptionList, ApiError>) -> bool {
        self.cities.accept(state, result)
    }
}

impl CriteriaSubscriber for DependentOptionsResolver {
    fn criteria_published(&mut self, criteria: &FilterCriteria) {
        if let Some(category) = self.subcategories.track(criteria.category.as_deref()) {
            issue(&self.sink, Request::Subcategories { category });
        }
        if let Some(state) = self.cities.track(criteria.state.as_deref()) {
            issue(&self.sink, Request::Cities { state });
        }
    }
}
