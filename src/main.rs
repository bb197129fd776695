use std::sync::Arc;

use apod_web::app::service::ApodService;
use apod_web::config::Config;
use apod_web::infra::kafka::KafkaNotifier;
use apod_web::infra::mongo_store::MongoStore;
use apod_web::infra::provider::NasaApodClient;
use apod_web::logging;
use apod_web::metrics::{MetricsSink, PrometheusMetrics};
use apod_web::server::{self, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let config = Config::from_env()?;

    let metrics: Arc<dyn MetricsSink> = Arc::new(PrometheusMetrics::install()?);
    let store = Arc::new(MongoStore::connect(&config.mongo).await?);
    let provider = Arc::new(NasaApodClient::new(config.nasa_api_key.clone())?);
    let publisher = Arc::new(KafkaNotifier::new(&config.kafka));

    let service = Arc::new(ApodService::new(provider, store, publisher, metrics.clone()));
    let state = AppState { service, metrics };

    info!(port = config.port, "Starting APOD web backend");
    server::serve(state, config.port).await?;

    Ok(())
}
