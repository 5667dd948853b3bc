use sales_dashboard::{ClientConfig, Dashboard, DashboardView, FilterCriteria, HttpReportingApi, OptionList};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Serialize)]
struct Report<'a> {
    criteria: &'a FilterCriteria,
    categories: &'a OptionList,
    states: &'a OptionList,
    view: Option<DashboardView>,
    error: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    info!("reporting api at {}", config.base_url);
    let api = HttpReportingApi::new(&config)?;

    let mut dashboard = Dashboard::new(api);
    dashboard.start();
    dashboard.settle().await;

    let fetch_state = dashboard.fetch_state();
    let report = Report {
        criteria: dashboard.criteria(),
        categories: dashboard.categories(),
        states: dashboard.states(),
        view: fetch_state.view(),
        error: fetch_state.error().map(str::to_string),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
