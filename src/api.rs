use crate::config::ClientConfig;
use crate::errors::ApiError;
use crate::fetcher::SnapshotQuery;
use crate::models::{DashboardSnapshot, OptionList, RawSnapshot};
use reqwest::{header::ACCEPT, Client, Url};
use serde::de::DeserializeOwned;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::debug;

pub const CATEGORIES_PATH: &str = "api/categories/";
pub const SUBCATEGORIES_PATH: &str = "api/subcategories/";
pub const STATES_PATH: &str = "api/states/";
pub const CITIES_PATH: &str = "api/cities/";
pub const STATS_PATH: &str = "api/dashboard/stats/";

/// Read-only reporting backend. Implementations must be cheap to share; the
/// coordinator spawns each request as its own task.
pub trait ReportingApi: Send + Sync + 'static {
    fn categories(&self) -> impl Future<Output = Result<OptionList, ApiError>> + Send;

    fn subcategories(&self, category: &str) -> impl Future<Output = Result<OptionList, ApiError>> + Send;

    fn states(&self) -> impl Future<Output = Result<OptionList, ApiError>> + Send;

    fn cities(&self, state: &str) -> impl Future<Output = Result<OptionList, ApiError>> + Send;

    fn dashboard_stats(
        &self,
        query: &SnapshotQuery,
    ) -> impl Future<Output = Result<DashboardSnapshot, ApiError>> + Send;
}

/// A request a component wants issued. Carries whatever tag the issuer needs
/// to recognise a stale answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Categories,
    States,
    Subcategories { category: String },
    Cities { state: String },
    Snapshot { ticket: u64, query: SnapshotQuery },
}

#[derive(Debug)]
pub enum Completion {
    Categories(Result<OptionList, ApiError>),
    States(Result<OptionList, ApiError>),
    Subcategories {
        category: String,
        result: Result<OptionList, ApiError>,
    },
    Cities {
        state: String,
        result: Result<OptionList, ApiError>,
    },
    Snapshot {
        ticket: u64,
        result: Result<DashboardSnapshot, ApiError>,
    },
}

pub type RequestSink = mpsc::UnboundedSender<Request>;

/// Queues a request for the coordinator. A closed sink means the dashboard is
/// gone, so the request is dropped.
pub fn issue(sink: &RequestSink, request: Request) {
    if let Err(err) = sink.send(request) {
        debug!(request = ?err.0, "request sink closed; dropping request");
    }
}

impl Request {
    pub async fn execute<A: ReportingApi>(self, api: &A) -> Completion {
        match self {
            Request::Categories => Completion::Categories(api.categories().await),
            Request::States => Completion::States(api.states().await),
            Request::Subcategories { category } => {
                let result = api.subcategories(&category).await;
                Completion::Subcategories { category, result }
            }
            Request::Cities { state } => {
                let result = api.cities(&state).await;
                Completion::Cities { state, result }
            }
            Request::Snapshot { ticket, query } => {
                let result = api.dashboard_stats(&query).await;
                Completion::Snapshot { ticket, result }
            }
        }
    }

    /// The completion for a request that never produced an answer, tagged the
    /// same way so its owner can still settle or discard it.
    pub fn failed(self, err: ApiError) -> Completion {
        match self {
            Request::Categories => Completion::Categories(Err(err)),
            Request::States => Completion::States(Err(err)),
            Request::Subcategories { category } => Completion::Subcategories {
                category,
                result: Err(err),
            },
            Request::Cities { state } => Completion::Cities {
                state,
                result: Err(err),
            },
            Request::Snapshot { ticket, .. } => Completion::Snapshot {
                ticket,
                result: Err(err),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpReportingApi {
    client: Client,
    base_url: Url,
}

impl HttpReportingApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }

    /// Unset parameters never reach the url; no parameters means no `?`.
    pub fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| ApiError::transport(format!("cannot build url for {path}: {err}")))?;

        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    pub fn stats_url(&self, query: &SnapshotQuery) -> Result<Url, ApiError> {
        let params: Vec<(&str, &str)> = query
            .pairs()
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        self.endpoint(STATS_PATH, &params)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("request failed"),
            ));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn option_list(&self, url: Url) -> Result<OptionList, ApiError> {
        let labels: Option<Vec<Option<String>>> = self.get_json(url).await?;
        Ok(OptionList::from_labels(
            labels.unwrap_or_default().into_iter().flatten(),
        ))
    }
}

impl ReportingApi for HttpReportingApi {
    async fn categories(&self) -> Result<OptionList, ApiError> {
        self.option_list(self.endpoint(CATEGORIES_PATH, &[])?).await
    }

    async fn subcategories(&self, category: &str) -> Result<OptionList, ApiError> {
        self.option_list(self.endpoint(SUBCATEGORIES_PATH, &[("category", category)])?)
            .await
    }

    async fn states(&self) -> Result<OptionList, ApiError> {
        self.option_list(self.endpoint(STATES_PATH, &[])?).await
    }

    async fn cities(&self, state: &str) -> Result<OptionList, ApiError> {
        self.option_list(self.endpoint(CITIES_PATH, &[("state", state)])?)
            .await
    }

    async fn dashboard_stats(&self, query: &SnapshotQuery) -> Result<DashboardSnapshot, ApiError> {
        let raw: Option<RawSnapshot> = self.get_json(self.stats_url(query)?).await?;
        Ok(raw.unwrap_or_default().into())
    }
}
