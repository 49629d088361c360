use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The document a kiosk publishes, as loosely typed as it arrives: every
/// field is optional, and the numeric ones show up as JSON numbers or as
/// quoted strings depending on the kiosk firmware. Never persisted as-is.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawEvent {
    #[serde(default)]
    pub at: Option<Value>,
    #[serde(default)]
    pub site: Option<Value>,
    #[serde(default)]
    pub val: Option<Value>,
    #[serde(default, rename = "type")]
    pub request_type: Option<Value>,
}

/// Output of normalization: required fields present and typed, but not yet
/// checked against domain rules. `request_type` stays raw because coercing it
/// is part of validation, not parsing.
#[derive(Clone, Debug)]
pub struct ParsedEvent {
    pub at: NaiveDateTime,
    pub site: i64,
    pub val: i64,
    pub request_type: Option<Value>,
}

/// A fully validated event, ready to persist. `site` is 1-based here (kiosks
/// report 0-based). If `val` is the request sentinel, `request_type` is
/// guaranteed `Some`. Built per message and dropped right after upload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NormalizedEvent {
    pub at: NaiveDateTime,
    pub site: i32,
    pub val: i32,
    pub request_type: Option<i32>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestInteraction {
    pub site: i32,
    pub request_value: i32,
    pub at: NaiveDateTime,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RatingInteraction {
    pub site: i32,
    pub rating_value: i32,
    pub at: NaiveDateTime,
}

/// The two persisted shapes, keyed by destination table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Interaction {
    Request(RequestInteraction),
    Rating(RatingInteraction),
}

impl From<&NormalizedEvent> for Interaction {
    /// Routing is decided by the presence of `type`, not by the sentinel: an
    /// event carrying both a rating `val` and a `type` becomes a request
    /// record and its `val` is discarded. That mirrors the upstream producer
    /// contract as deployed today, so don't "fix" it here without a product
    /// decision.
    fn from(event: &NormalizedEvent) -> Self {
        match event.request_type {
            Some(request_value) => Interaction::Request(RequestInteraction {
                site: event.site,
                request_value,
                at: event.at,
            }),
            None => Interaction::Rating(RatingInteraction {
                site: event.site,
                rating_value: event.val,
                at: event.at,
            }),
        }
    }
}
