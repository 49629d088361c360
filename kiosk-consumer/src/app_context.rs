use std::time::Duration;

use common_kafka::kafka_consumer::SingleTopicConsumer;
use health::{HealthHandle, HealthRegistry};
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::errors::PipelineError;
use crate::sink::InteractionSink;

pub struct AppContext {
    pub health_registry: HealthRegistry,
    pub worker_liveness: HealthHandle,
    pub kafka_consumer: SingleTopicConsumer,
    pub sink: InteractionSink,
}

impl AppContext {
    pub async fn new(config: &Config) -> Result<Self, PipelineError> {
        let health_registry = HealthRegistry::new();
        let worker_liveness = health_registry.register("worker", Duration::from_secs(60));

        let kafka_consumer =
            SingleTopicConsumer::new(config.kafka.clone(), config.consumer.clone())?;

        let options = PgPoolOptions::new().max_connections(config.max_pg_connections);
        let pool = options.connect(&config.database_url).await?;

        Ok(Self {
            health_registry,
            worker_liveness,
            kafka_consumer,
            sink: InteractionSink::new(pool),
        })
    }
}
