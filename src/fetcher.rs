use crate::api::{issue, Request, RequestSink};
use crate::errors::ApiError;
use crate::filters::CriteriaSubscriber;
use crate::models::{DashboardSnapshot, FetchState, FilterCriteria};
use tracing::{debug, error, info};

/// Shown to the user for any snapshot failure; the transport error is logged only.
pub const FETCH_ERROR_MESSAGE: &str = "Error al cargar los datos.";

/// Query parameters for `GET /api/dashboard/stats/`, in the order the backend
/// documents them. Unset criteria fields have no entry at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotQuery {
    pairs: Vec<(&'static str, String)>,
}

impl SnapshotQuery {
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        let mut pairs = Vec::with_capacity(6);
        if let Some(date) = criteria.start_date {
            pairs.push(("start_date", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = criteria.end_date {
            pairs.push(("end_date", date.format("%Y-%m-%d").to_string()));
        }
        let labels = [
            ("category", &criteria.category),
            ("subcategory", &criteria.subcategory),
            ("state", &criteria.state),
            ("city", &criteria.city),
        ];
        for (key, value) in labels {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Owns the [`FetchState`]. Every published criteria value gets a fresh
/// ticket; only the completion carrying the latest ticket may settle the state.
#[derive(Debug)]
pub struct DashboardFetcher {
    state: FetchState,
    latest_ticket: u64,
    sink: RequestSink,
}

impl DashboardFetcher {
    pub fn new(sink: RequestSink) -> Self {
        Self {
            state: FetchState::Idle,
            latest_ticket: 0,
            sink,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn latest_ticket(&self) -> u64 {
        self.latest_ticket
    }

    /// Returns whether the result settled the state.
    pub fn apply(&mut self, ticket: u64, result: Result<DashboardSnapshot, ApiError>) -> bool {
        if ticket != self.latest_ticket {
            debug!(ticket, latest = self.latest_ticket, "discarding stale snapshot");
            return false;
        }

        self.state = match result {
            Ok(snapshot) => {
                info!(
                    ticket,
                    total_sales = snapshot.total_sales,
                    customers = snapshot.top_customers.len(),
                    products = snapshot.top_products.len(),
                    "dashboard snapshot ready"
                );
                FetchState::Ready(snapshot)
            }
            Err(err) => {
                error!(ticket, "failed to fetch dashboard snapshot: {err}");
                FetchState::Failed(FETCH_ERROR_MESSAGE.to_string())
            }
        };
        true
    }
}

impl CriteriaSubscriber for DashboardFetcher {
    fn criteria_published(&mut self, criteria: &FilterCriteria) {
        self.latest_ticket += 1;
        self.state = FetchState::Loading;
        issue(
            &self.sink,
            Request::Snapshot {
                ticket: self.latest_ticket,
                query: SnapshotQuery::from_criteria(criteria),
            },
        );
    }
}
