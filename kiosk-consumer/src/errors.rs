use chrono::{NaiveDate, NaiveTime};
use rdkafka::error::KafkaError;
use thiserror::Error;

/// The message could not be turned into typed fields at all. These are
/// permanent rejections, never retried.
#[derive(Debug, Error)]
pub enum MalformedInput {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),
    #[error("field '{0}' is not an integer")]
    NotAnInteger(&'static str),
    #[error("'at' is not an ISO-8601 timestamp: {0}")]
    InvalidTimestamp(String),
}

/// The fields parsed, but fall outside the museum's domain rules. The reason
/// is preserved so the rejection log line says what was wrong.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("val {0} is outside the accepted set")]
    ValueOutOfRange(i64),
    #[error("val is the request sentinel but no type was supplied")]
    MissingRequestType,
    #[error("type is present but is not an integer")]
    TypeNotAnInteger,
    #[error("type {0} is not a known request kind")]
    TypeOutOfRange(i64),
    #[error("site {0} is not a known exhibition site")]
    SiteOutOfRange(i64),
    #[error("event date {0} is in the future")]
    FutureDate(NaiveDate),
    #[error("event time {0} is outside museum opening hours")]
    OutsideOpeningHours(NaiveTime),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed input: {0}")]
    Malformed(#[from] MalformedInput),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("persistence failed: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),
    #[error("config error: {0}")]
    Config(#[from] envconfig::Error),
}

impl PipelineError {
    /// Metrics label for the per-message rejection counters.
    pub fn cause_label(&self) -> &'static str {
        match self {
            PipelineError::Malformed(_) => "malformed_input",
            PipelineError::Validation(_) => "validation",
            PipelineError::Persistence(_) => "persistence",
            PipelineError::Kafka(_) => "kafka",
            PipelineError::Config(_) => "config",
        }
    }
}
