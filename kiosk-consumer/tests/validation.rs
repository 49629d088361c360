use chrono::{NaiveDate, NaiveDateTime};
use kiosk_consumer::errors::{MalformedInput, ValidationError};
use kiosk_consumer::types::{Interaction, NormalizedEvent, RawEvent};
use kiosk_consumer::validation::{normalize, validate};
use serde_json::{json, Value};

/// A fixed "now" so the temporal rules are deterministic: midday on
/// 2025-01-02.
fn clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 2)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn raw(value: Value) -> RawEvent {
    serde_json::from_value(value).unwrap()
}

fn run(value: Value) -> Result<NormalizedEvent, ValidationError> {
    let parsed = normalize(&raw(value)).expect("input should parse");
    validate(parsed, clock())
}

fn accepted(value: Value) -> NormalizedEvent {
    run(value).expect("event should be accepted")
}

#[test]
fn rating_event_is_accepted_and_routed_to_rating_interaction() {
    // Scenario A: plain rating from site 0
    let event = accepted(json!({"at": "2025-01-01T09:30:00", "site": "0", "val": "4"}));
    assert_eq!(event.site, 1);
    assert_eq!(event.val, 4);
    assert_eq!(event.request_type, None);

    let Interaction::Rating(rating) = Interaction::from(&event) else {
        panic!("expected a rating interaction");
    };
    assert_eq!(rating.site, 1);
    assert_eq!(rating.rating_value, 4);
    assert_eq!(rating.at.to_string(), "2025-01-01 09:30:00");
}

#[test]
fn sentinel_without_type_is_rejected() {
    // Scenario B
    let result = run(json!({"at": "2025-01-01T09:30:00", "site": "0", "val": "-1"}));
    assert!(matches!(result, Err(ValidationError::MissingRequestType)));
}

#[test]
fn request_event_is_accepted_and_routed_to_request_interaction() {
    // Scenario C: assistance request from site 1
    let event = accepted(json!({"at": "2025-01-01T09:30:00", "site": "1", "val": "-1", "type": "0"}));
    assert_eq!(event.site, 2);
    assert_eq!(event.request_type, Some(0));

    let Interaction::Request(request) = Interaction::from(&event) else {
        panic!("expected a request interaction");
    };
    assert_eq!(request.site, 2);
    assert_eq!(request.request_value, 0);
    assert_eq!(request.at.to_string(), "2025-01-01 09:30:00");
}

#[test]
fn missing_required_fields_are_malformed_input() {
    // Scenario D and friends
    let result = normalize(&raw(json!({"site": "0", "val": "1"})));
    assert!(matches!(result, Err(MalformedInput::MissingField("at"))));

    let result = normalize(&raw(json!({"at": "2025-01-01T09:30:00", "val": "1"})));
    assert!(matches!(result, Err(MalformedInput::MissingField("site"))));

    let result = normalize(&raw(json!({"at": "2025-01-01T09:30:00", "site": "0"})));
    assert!(matches!(result, Err(MalformedInput::MissingField("val"))));
}

#[test]
fn untypeable_fields_are_malformed_input() {
    let result = normalize(&raw(json!({"at": "2025-01-01T09:30:00", "site": "zero", "val": "1"})));
    assert!(matches!(result, Err(MalformedInput::NotAnInteger("site"))));

    let result = normalize(&raw(json!({"at": "2025-01-01T09:30:00", "site": "0", "val": true})));
    assert!(matches!(result, Err(MalformedInput::NotAnInteger("val"))));

    let result = normalize(&raw(json!({"at": "not a date", "site": "0", "val": "1"})));
    assert!(matches!(result, Err(MalformedInput::InvalidTimestamp(_))));
}

#[test]
fn future_dated_events_are_rejected_regardless_of_other_fields() {
    // Scenario E: one day after the fixed clock
    let result = run(json!({"at": "2025-01-03T09:30:00", "site": "0", "val": "4"}));
    assert!(matches!(result, Err(ValidationError::FutureDate(_))));

    let result = run(json!({"at": "2025-01-03T09:30:00", "site": "1", "val": "-1", "type": "1"}));
    assert!(matches!(result, Err(ValidationError::FutureDate(_))));
}

#[test]
fn same_day_events_are_accepted_whatever_the_hour_relative_to_now() {
    // 17:00 is after the fixed clock's midday but still today
    accepted(json!({"at": "2025-01-02T17:00:00", "site": "0", "val": "2"}));
}

#[test]
fn val_outside_the_accepted_set_is_rejected() {
    for val in [-2i64, 5, 100] {
        let result = run(json!({"at": "2025-01-01T09:30:00", "site": "0", "val": val}));
        assert!(
            matches!(result, Err(ValidationError::ValueOutOfRange(v)) if v == val),
            "val {val} should be out of range"
        );
    }
    for val in [-1, 0, 1, 2, 3, 4] {
        let result = run(json!({"at": "2025-01-01T09:30:00", "site": "0", "val": val, "type": 0}));
        assert!(result.is_ok(), "val {val} should be accepted");
    }
}

#[test]
fn invalid_type_is_rejected_even_for_plain_ratings() {
    let result = run(json!({"at": "2025-01-01T09:30:00", "site": "0", "val": "4", "type": "2"}));
    assert!(matches!(result, Err(ValidationError::TypeOutOfRange(2))));

    let result = run(json!({"at": "2025-01-01T09:30:00", "site": "0", "val": "-1", "type": "-1"}));
    assert!(matches!(result, Err(ValidationError::TypeOutOfRange(-1))));

    let result = run(json!({"at": "2025-01-01T09:30:00", "site": "0", "val": "4", "type": "emergency"}));
    assert!(matches!(result, Err(ValidationError::TypeNotAnInteger)));
}

#[test]
fn sites_are_shifted_to_one_based_and_range_checked() {
    for site in 0..=5i32 {
        let event = accepted(json!({"at": "2025-01-01T09:30:00", "site": site, "val": "3"}));
        assert_eq!(event.site, site + 1);
    }
    for site in [-1i64, 6, 42] {
        let result = run(json!({"at": "2025-01-01T09:30:00", "site": site, "val": "3"}));
        assert!(
            matches!(result, Err(ValidationError::SiteOutOfRange(s)) if s == site),
            "site {site} should be out of range"
        );
    }
}

#[test]
fn events_before_opening_or_after_closing_are_rejected() {
    for time in ["00:00:01", "05:00:00", "08:44:59"] {
        let result = run(json!({"at": format!("2025-01-01T{time}"), "site": "0", "val": "3"}));
        assert!(
            matches!(result, Err(ValidationError::OutsideOpeningHours(_))),
            "{time} is before opening"
        );
    }
    for time in ["18:15:01", "20:00:00", "23:59:58"] {
        let result = run(json!({"at": format!("2025-01-01T{time}"), "site": "0", "val": "3"}));
        assert!(
            matches!(result, Err(ValidationError::OutsideOpeningHours(_))),
            "{time} is after closing"
        );
    }
}

#[test]
fn boundary_instants_are_accepted() {
    // Exactly opening and exactly closing pass; so do the day's endpoints,
    // which sit outside both strict windows
    for time in ["08:45:00", "18:15:00", "00:00:00", "23:59:59"] {
        let result = run(json!({"at": format!("2025-01-01T{time}"), "site": "0", "val": "3"}));
        assert!(result.is_ok(), "{time} should be accepted");
    }
}

#[test]
fn stray_type_on_a_rating_routes_to_request_and_discards_val() {
    // Deployed producer behavior: presence of type decides the destination
    let event = accepted(json!({"at": "2025-01-01T09:30:00", "site": "0", "val": "4", "type": "1"}));
    let Interaction::Request(request) = Interaction::from(&event) else {
        panic!("expected a request interaction");
    };
    assert_eq!(request.request_value, 1);
}

#[test]
fn validation_is_idempotent() {
    let parsed = normalize(&raw(
        json!({"at": "2025-01-01T09:30:00", "site": "0", "val": "4"}),
    ))
    .unwrap();
    let first = validate(parsed.clone(), clock()).unwrap();
    let second = validate(parsed, clock()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unknown_fields_are_ignored() {
    accepted(json!({
        "at": "2025-01-01T09:30:00",
        "site": "0",
        "val": "4",
        "kiosk_firmware": "2.4.1"
    }));
}
