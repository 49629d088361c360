use std::fs::File;
use std::future::ready;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use axum::{routing::get, Router};
use clap::Parser;
use common_kafka::kafka_consumer::RecvErr;
use kiosk_consumer::{
    app_context::AppContext,
    config::Config,
    handle_message,
    metrics_consts::{
        EMPTY_EVENTS, EVENTS_RECEIVED, EVENTS_REJECTED, EVENTS_UPLOADED, UPLOAD_TIME,
    },
};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(about = "Consumes visitor interaction events from kiosks and uploads them to postgres")]
struct Cli {
    /// Append log output to this file instead of the console
    #[arg(short, long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn setup_tracing(log_file: Option<&Path>) -> Result<(), std::io::Error> {
    match log_file {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            let log_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .with_filter(EnvFilter::from_default_env());
            tracing_subscriber::registry().with(log_layer).init();
        }
        None => {
            let log_layer =
                tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
            tracing_subscriber::registry().with(log_layer).init();
        }
    }
    Ok(())
}

pub async fn index() -> &'static str {
    "visitor interaction pipeline"
}

fn start_health_liveness_server(config: &Config, context: Arc<AppContext>) -> JoinHandle<()> {
    let recorder_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    let router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route(
            "/_liveness",
            get(move || ready(context.health_registry.get_status())),
        )
        .route("/metrics", get(move || ready(recorder_handle.render())));
    let bind = format!("{}:{}", config.host, config.port);
    tokio::task::spawn(async move {
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .expect("failed to bind health/metrics listener");
        axum::serve(listener, router)
            .await
            .expect("failed to start serving metrics");
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_tracing(cli.log_file.as_deref())?;
    info!("Starting up...");

    let config = Config::init_with_defaults()?;
    let context = Arc::new(AppContext::new(&config).await?);

    info!(
        "Subscribed to topic: {}",
        config.consumer.kafka_consumer_topic
    );

    start_health_liveness_server(&config, context.clone());

    // One message at a time: fetch, validate, persist, then poll again. A
    // rejected message is logged with its payload and dropped; nothing here
    // halts the loop short of the process dying.
    loop {
        context.worker_liveness.report_healthy();

        let (payload, offset) = match context.kafka_consumer.recv().await {
            Ok(received) => received,
            Err(RecvErr::Empty) => {
                warn!("Received empty event");
                metrics::counter!(EMPTY_EVENTS).increment(1);
                continue;
            }
            Err(RecvErr::Kafka(e)) => {
                // Rebalances and transient partition errors land here; skip
                // the poll and carry on
                error!("Kafka error: {}", e);
                continue;
            }
        };

        // Rejected messages advance the offset too - bad input is dropped,
        // not retried. Panicking on store failure, if kafka is down, we're down.
        offset.store().expect("Failed to store offset");

        metrics::counter!(EVENTS_RECEIVED).increment(1);

        let upload_start = Instant::now();
        match handle_message(&context, &payload).await {
            Ok(event) => {
                metrics::histogram!(UPLOAD_TIME).record(upload_start.elapsed().as_secs_f64());
                metrics::counter!(EVENTS_UPLOADED).increment(1);
                info!(
                    site = event.site,
                    val = event.val,
                    request_type = event.request_type,
                    at = %event.at,
                    "Uploaded interaction"
                );
            }
            Err(e) => {
                metrics::counter!(EVENTS_REJECTED, "cause" => e.cause_label()).increment(1);
                error!(
                    payload = %String::from_utf8_lossy(&payload),
                    "Rejected event: {}",
                    e
                );
            }
        }
    }
}
