use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde_json::Value;

use crate::errors::{MalformedInput, ValidationError};
use crate::types::{NormalizedEvent, ParsedEvent, RawEvent};

/// A `val` of -1 means "this is an assistance request", and the rating scale
/// is 0 to 4, so the full accepted set is the two combined.
pub const REQUEST_SENTINEL: i64 = -1;
pub const VALID_VALS: [i64; 6] = [-1, 0, 1, 2, 3, 4];
pub const VALID_TYPES: [i64; 2] = [0, 1];
pub const VALID_SITES: [i64; 6] = [0, 1, 2, 3, 4, 5];

static START_OF_DAY: LazyLock<NaiveTime> =
    LazyLock::new(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
static END_OF_DAY: LazyLock<NaiveTime> =
    LazyLock::new(|| NaiveTime::from_hms_opt(23, 59, 59).unwrap());
static MUSEUM_OPENING: LazyLock<NaiveTime> =
    LazyLock::new(|| NaiveTime::from_hms_opt(8, 45, 0).unwrap());
static MUSEUM_CLOSING: LazyLock<NaiveTime> =
    LazyLock::new(|| NaiveTime::from_hms_opt(18, 15, 0).unwrap());

/// Parse a raw kiosk document into typed fields. Pure; rejects anything with
/// a missing required field, an untypeable number, or a bad timestamp.
/// `type` is genuinely optional at this stage, so it passes through untouched.
pub fn normalize(raw: &RawEvent) -> Result<ParsedEvent, MalformedInput> {
    let at = raw.at.as_ref().ok_or(MalformedInput::MissingField("at"))?;
    let site = raw
        .site
        .as_ref()
        .ok_or(MalformedInput::MissingField("site"))?;
    let val = raw.val.as_ref().ok_or(MalformedInput::MissingField("val"))?;

    Ok(ParsedEvent {
        at: parse_timestamp(at)?,
        site: coerce_int(site).ok_or(MalformedInput::NotAnInteger("site"))?,
        val: coerce_int(val).ok_or(MalformedInput::NotAnInteger("val"))?,
        request_type: raw.request_type.clone(),
    })
}

/// Apply the domain rules and finalize classification. Each check
/// short-circuits; `now` is passed in rather than read from the system clock
/// so the whole thing stays a pure function of its inputs.
pub fn validate(parsed: ParsedEvent, now: NaiveDateTime) -> Result<NormalizedEvent, ValidationError> {
    if !VALID_VALS.contains(&parsed.val) {
        return Err(ValidationError::ValueOutOfRange(parsed.val));
    }
    if parsed.val == REQUEST_SENTINEL && parsed.request_type.is_none() {
        return Err(ValidationError::MissingRequestType);
    }

    // A present-but-invalid type is rejected even when val is a plain rating
    let request_type = match &parsed.request_type {
        Some(value) => {
            let kind = coerce_int(value).ok_or(ValidationError::TypeNotAnInteger)?;
            if !VALID_TYPES.contains(&kind) {
                return Err(ValidationError::TypeOutOfRange(kind));
            }
            Some(kind as i32)
        }
        None => None,
    };

    if !VALID_SITES.contains(&parsed.site) {
        return Err(ValidationError::SiteOutOfRange(parsed.site));
    }
    // Kiosks report sites 0-based, the exhibition tables are 1-based
    let site = (parsed.site + 1) as i32;

    if parsed.at.date() > now.date() {
        return Err(ValidationError::FutureDate(parsed.at.date()));
    }
    let time = parsed.at.time();
    // Strictly inside either window is out of hours; the boundary instants
    // (exactly opening or closing time) are accepted
    if *START_OF_DAY < time && time < *MUSEUM_OPENING {
        return Err(ValidationError::OutsideOpeningHours(time));
    }
    if *MUSEUM_CLOSING < time && time < *END_OF_DAY {
        return Err(ValidationError::OutsideOpeningHours(time));
    }

    Ok(NormalizedEvent {
        at: parsed.at,
        site,
        val: parsed.val as i32,
        request_type,
    })
}

// Kiosk firmware is inconsistent about quoting numbers, so accept both
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// ISO-8601, with or without an offset. Offsets are stripped, keeping the
/// wall-clock time: events are treated as naive museum-local time. Subsecond
/// precision is dropped.
fn parse_timestamp(value: &Value) -> Result<NaiveDateTime, MalformedInput> {
    let Value::String(s) = value else {
        return Err(MalformedInput::InvalidTimestamp(value.to_string()));
    };
    let parsed = match DateTime::parse_from_rfc3339(s) {
        Ok(with_offset) => with_offset.naive_local(),
        Err(_) => s
            .parse::<NaiveDateTime>()
            .map_err(|_| MalformedInput::InvalidTimestamp(s.clone()))?,
    };
    Ok(parsed.with_nanosecond(0).unwrap_or(parsed))
}
