use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryDocumentStore, InMemoryIdentityDirectory, InMemoryProfileStore,
    InMemoryRateCounter, InMemorySubmissionLog, LogMailer,
};
use crate::routes::with_intake_routes;
use crate::store::SqliteStores;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use wellform::catalog::AssessmentCatalog;
use wellform::config::AppConfig;
use wellform::error::AppError;
use wellform::intake::{IntakePipeline, IntakeSinks};
use wellform::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(AssessmentCatalog::builtin()?);
    let sinks = match args.db.take() {
        Some(path) => {
            info!(path = %path.display(), "persisting submissions to sqlite");
            let stores = SqliteStores::open(&path)?;
            IntakeSinks {
                documents: Arc::new(stores.documents()),
                profiles: Arc::new(stores.profiles()),
                log: Arc::new(stores.log()),
                identities: Arc::new(stores.identities()),
                counters: Arc::new(stores.counters()),
                mailer: Arc::new(LogMailer),
            }
        }
        None => IntakeSinks {
            documents: Arc::new(InMemoryDocumentStore::default()),
            profiles: Arc::new(InMemoryProfileStore::default()),
            log: Arc::new(InMemorySubmissionLog::default()),
            identities: Arc::new(InMemoryIdentityDirectory::default()),
            counters: Arc::new(InMemoryRateCounter::default()),
            mailer: Arc::new(LogMailer),
        },
    };
    let pipeline = Arc::new(IntakePipeline::new(catalog, sinks, &config.intake));

    let app = with_intake_routes(pipeline)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "assessment intake service ready");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
