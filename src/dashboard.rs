use crate::api::{Completion, ReportingApi, Request, RequestSink};
use crate::errors::ApiError;
use crate::fetcher::DashboardFetcher;
use crate::filters::FilterState;
use crate::models::{FetchState, FilterCriteria, OptionList};
use crate::options::{DependentOptionsResolver, OptionsCatalog};
use crate::projection::DashboardView;
use chrono::NaiveDate;
use std::{cell::RefCell, rc::Rc, sync::Arc};
use tokio::{sync::mpsc, task::JoinSet};
use tracing::{debug, error, info};

/// What happened to a completion once it reached its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Applied,
    Discarded,
}

/// Wires the filter publisher to its subscribers and runs their requests.
///
/// Lives on a single task. Filter mutations publish synchronously; any
/// requests they cause are spawned immediately and their results are applied
/// one at a time through [`Dashboard::next_completion`] or
/// [`Dashboard::settle`]. Mutating between those awaits is expected; stale
/// results are dropped by the component that owns them.
///
/// Anything that dispatches requests must run inside a tokio runtime.
pub struct Dashboard<A: ReportingApi> {
    api: Arc<A>,
    filters: FilterState,
    catalog: OptionsCatalog,
    resolver: Rc<RefCell<DependentOptionsResolver>>,
    fetcher: Rc<RefCell<DashboardFetcher>>,
    sink: RequestSink,
    requests: mpsc::UnboundedReceiver<Request>,
    tasks: JoinSet<Completion>,
}

impl<A: ReportingApi> Dashboard<A> {
    pub fn new(api: A) -> Self {
        let (sink, requests) = mpsc::unbounded_channel();
        let resolver = Rc::new(RefCell::new(DependentOptionsResolver::new(sink.clone())));
        let fetcher = Rc::new(RefCell::new(DashboardFetcher::new(sink.clone())));

        let mut filters = FilterState::new();
        filters.subscribe(resolver.clone());
        filters.subscribe(fetcher.clone());

        Self {
            api: Arc::new(api),
            filters,
            catalog: OptionsCatalog::new(),
            resolver,
            fetcher,
            sink,
            requests,
            tasks: JoinSet::new(),
        }
    }

    /// Loads the option catalog and fetches the snapshot for the current
    /// (initially empty) criteria.
    pub fn start(&mut self) {
        info!("starting dashboard");
        OptionsCatalog::request_all(&self.sink);
        self.filters.publish_current();
        self.dispatch();
    }

    /// Fetches again for the current criteria.
    pub fn refresh(&mut self) {
        self.filters.publish_current();
        self.dispatch();
    }

    pub fn set_start_date(&mut self, date: Option<NaiveDate>) -> bool {
        self.mutate(|filters| filters.set_start_date(date))
    }

    pub fn set_end_date(&mut self, date: Option<NaiveDate>) -> bool {
        self.mutate(|filters| filters.set_end_date(date))
    }

    pub fn set_category(&mut self, category: Option<&str>) -> bool {
        self.mutate(|filters| filters.set_category(category))
    }

    pub fn set_subcategory(&mut self, subcategory: Option<&str>) -> bool {
        self.mutate(|filters| filters.set_subcategory(subcategory))
    }

    pub fn set_state(&mut self, state: Option<&str>) -> bool {
        self.mutate(|filters| filters.set_state(state))
    }

    pub fn set_city(&mut self, city: Option<&str>) -> bool {
        self.mutate(|filters| filters.set_city(city))
    }

    pub fn clear_filters(&mut self) -> bool {
        self.mutate(FilterState::clear)
    }

    pub fn criteria(&self) -> &FilterCriteria {
        self.filters.criteria()
    }

    pub fn categories(&self) -> &OptionList {
        self.catalog.categories()
    }

    pub fn states(&self) -> &OptionList {
        self.catalog.states()
    }

    pub fn subcategories(&self) -> OptionList {
        self.resolver.borrow().subcategories().clone()
    }

    pub fn cities(&self) -> OptionList {
        self.resolver.borrow().cities().clone()
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetcher.borrow().state().clone()
    }

    pub fn view(&self) -> Option<DashboardView> {
        self.fetcher.borrow().state().view()
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for the next request to finish and hands its result to the
    /// owning component. `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Settled> {
        let joined = self.tasks.join_next().await?;
        match joined {
            Ok(completion) => Some(self.apply(completion)),
            Err(err) => {
                error!("request task did not complete: {err}");
                Some(Settled::Discarded)
            }
        }
    }

    /// Applies completions until no request is in flight.
    pub async fn settle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    fn mutate(&mut self, change: impl FnOnce(&mut FilterState) -> bool) -> bool {
        let published = change(&mut self.filters);
        if published {
            self.dispatch();
        }
        published
    }

    fn dispatch(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            debug!(?request, "dispatching request");
            let api = Arc::clone(&self.api);
            let fallback = request.clone();
            // A call that panics still settles its owner, as a transport error.
            self.tasks.spawn(async move {
                let call = tokio::spawn(async move { request.execute(api.as_ref()).await });
                match call.await {
                    Ok(completion) => completion,
                    Err(err) => {
                        error!(request = ?fallback, "request task did not complete: {err}");
                        fallback.failed(ApiError::transport(format!("request task did not complete: {err}")))
                    }
                }
            });
        }
    }

    fn apply(&mut self, completion: Completion) -> Settled {
        let applied = match completion {
            Completion::Categories(result) => {
                self.catalog.apply_categories(result);
                true
            }
            Completion::States(result) => {
                self.catalog.apply_states(result);
                true
            }
            Completion::Subcategories { category, result } => self
                .resolver
                .borrow_mut()
                .apply_subcategories(&category, result),
            Completion::Cities { state, result } => {
                self.resolver.borrow_mut().apply_cities(&state, result)
            }
            Completion::Snapshot { ticket, result } => {
                self.fetcher.borrow_mut().apply(ticket, result)
            }
        };

        if applied {
            Settled::Applied
        } else {
            Settled::Discarded
        }
    }
}
