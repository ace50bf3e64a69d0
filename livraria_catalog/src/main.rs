use std::sync::Arc;

use actix_web::{App, HttpServer};
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use paperclip::actix::{OpenApiExt, web};
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{EnvFilter, Registry};
use tracing_subscriber::layer::SubscriberExt;

use livraria_catalog::app_config::{config_app, json_config, path_config};
use livraria_catalog::app_settings::AppSettings;
use livraria_catalog::livros_repository::{
    InMemoryLivrosRepository, LivrosRepository, PostgresLivrosRepository,
};
use livraria_catalog::livros_service::LivrosService;

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry() {
    let app_name = "livraria_catalog";

    // Spans are exported in batch to jaeger
    global::set_text_map_propagator(TraceContextPropagator::new());
    #[allow(deprecated)]
    let tracer = opentelemetry_jaeger::new_agent_pipeline()
        .with_service_name(app_name)
        .install_batch(TokioCurrentThread)
        .expect("Failed to install OpenTelemetry tracer.");

    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let formatting_layer = BunyanFormattingLayer::new(app_name.into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to install `tracing` subscriber.")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry();
    let settings = AppSettings::from_env()?;

    let livros_repository: Arc<dyn LivrosRepository> = if settings.use_in_memory_db {
        tracing::info!("Using in memory livros repository");
        Arc::new(InMemoryLivrosRepository::default())
    } else {
        Arc::new(PostgresLivrosRepository::init(settings.postgres_config()).await?)
    };
    let livros_service = web::Data::new(LivrosService::new(livros_repository));

    tracing::info!("Starting HTTP server at http://0.0.0.0:{}", settings.port);
    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(livros_service.clone())
            .app_data(json_config())
            .app_data(path_config())
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind(("0.0.0.0", settings.port))?
    .run()
    .await?;

    global::shutdown_tracer_provider();
    Ok(())
}
