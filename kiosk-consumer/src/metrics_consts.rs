pub const EVENTS_RECEIVED: &str = "kiosk_events_received";
pub const EVENTS_UPLOADED: &str = "kiosk_events_uploaded";
pub const EVENTS_REJECTED: &str = "kiosk_events_rejected";
pub const EMPTY_EVENTS: &str = "kiosk_events_empty";
pub const UPLOAD_TIME: &str = "kiosk_upload_time_seconds";
