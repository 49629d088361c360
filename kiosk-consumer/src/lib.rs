use chrono::Local;
use tracing::debug;

use crate::app_context::AppContext;
use crate::errors::{MalformedInput, PipelineError};
use crate::types::{NormalizedEvent, RawEvent};

pub mod app_context;
pub mod config;
pub mod errors;
pub mod metrics_consts;
pub mod sink;
pub mod types;
pub mod validation;

/// The whole per-message path: parse the payload, run the domain rules,
/// persist the interaction. All-or-nothing; any failure maps to one of the
/// three rejection kinds and the message is dropped by the caller.
pub async fn handle_message(
    context: &AppContext,
    payload: &[u8],
) -> Result<NormalizedEvent, PipelineError> {
    let raw: RawEvent = serde_json::from_slice(payload).map_err(MalformedInput::InvalidJson)?;
    debug!("Handling event: {:?}", raw);

    let parsed = validation::normalize(&raw)?;
    // The museum clock is local wall time, which is also what the kiosks stamp
    let event = validation::validate(parsed, Local::now().naive_local())?;

    context.sink.upload(&event).await?;
    Ok(event)
}
