use crate::cli::ServeArgs;
use crate::infra::{AppState, Narrator};
use crate::routes::with_assessment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use healthspan::assessment::{AssessmentService, CatalogError, QuestionCatalog};
use healthspan::config::AppConfig;
use healthspan::error::AppError;
use healthspan::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let catalog = checked_catalog(QuestionCatalog::standard())?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let narrator = Arc::new(Narrator::from_config(&config.narrative));
    let assessment_service = Arc::new(AssessmentService::new(
        catalog,
        narrator,
        config.share.base_url.clone(),
    ));

    let app = with_assessment_routes(assessment_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, share_base = %config.share.base_url, "healthspan assessment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn checked_catalog(
    catalog: Result<QuestionCatalog, CatalogError>,
) -> Result<Arc<QuestionCatalog>, AppError> {
    let catalog = catalog
        .inspect_err(|err| error!(error = %err, "question catalog failed verification"))?;
    info!(questions = catalog.len(), "question catalog verified");
    Ok(Arc::new(catalog))
}
