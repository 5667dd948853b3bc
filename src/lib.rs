pub mod api;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod fetcher;
pub mod filters;
pub mod models;
pub mod options;
pub mod projection;

pub use api::{HttpReportingApi, ReportingApi};
pub use config::ClientConfig;
pub use dashboard::{Dashboard, Settled};
pub use errors::{ApiError, ConfigError};
pub use fetcher::FETCH_ERROR_MESSAGE;
pub use models::{DashboardSnapshot, FetchState, FilterCriteria, OptionList};
pub use projection::{project, DashboardView};
