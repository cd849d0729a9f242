// Ingestion Lambda binary entry point

#[path = "ingest/config.rs"]
mod config;

#[path = "ingest/cors.rs"]
mod cors;

#[path = "ingest/error.rs"]
mod error;

#[path = "ingest/router.rs"]
mod router;

#[path = "ingest/handlers/mod.rs"]
mod handlers;

#[path = "ingest/repo/mod.rs"]
mod repo;

use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use mediciones_backend::{Clock, DocumentStore, SystemClock};
use repo::readings::DynamoReadingStore;

async fn function_handler(
    event: Request,
    config: &Config,
    store: &dyn DocumentStore,
    clock: &dyn Clock,
) -> Result<Response<Body>, Error> {
    // Extract request ID from Lambda context
    let request_id = event.lambda_context().request_id.clone();

    info!(
        request_id = %request_id,
        method = %event.method(),
        path = %event.uri().path(),
        "Ingestion Lambda invoked"
    );

    let response = router::route_request(event, &request_id, config, store, clock).await;

    info!(
        request_id = %request_id,
        status = %response.status(),
        "Request completed"
    );

    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();

    info!("Ingestion Lambda starting");

    // Store client lives for the whole process, shared by every invocation
    let config = Config::from_env().await?;
    let store = DynamoReadingStore::new(config.dynamodb_client.clone(), config.readings_table.clone());
    let clock = SystemClock::new();

    info!(
        readings_table = %config.readings_table,
        default_device_label = %config.default_device_label,
        "Configuration loaded"
    );

    let config = &config;
    let store = &store;
    let clock = &clock;
    run(service_fn(move |event: Request| async move {
        function_handler(event, config, store, clock).await
    }))
    .await
}
