use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use time::OffsetDateTime;

/// Health reporting for components of the service.
///
/// Long-running loops register themselves with a deadline and must report
/// healthy more often than that deadline, or the overall status goes
/// unhealthy. The process status is the combination of every registered
/// component: all must have recently reported for the probe to pass.
#[derive(Debug)]
pub struct HealthStatus {
    /// The overall status: true if all components are healthy
    pub healthy: bool,
    /// Current status of each registered component, for display
    pub components: HashMap<String, ComponentStatus>,
}

impl IntoResponse for HealthStatus {
    /// Computes the axum status code based on the overall health status,
    /// and prints each component status in the body for debugging.
    fn into_response(self) -> Response {
        let body = format!("{self:?}");
        match self.healthy {
            true => (StatusCode::OK, body),
            false => (StatusCode::INTERNAL_SERVER_ERROR, body),
        }
        .into_response()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ComponentStatus {
    /// Automatically set when a component is newly registered
    Starting,
    /// Recently reported healthy, will need to report again before the date
    HealthyUntil(OffsetDateTime),
    /// Reported unhealthy
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_healthy(&self) -> bool {
        match self {
            ComponentStatus::HealthyUntil(until) => until.gt(&OffsetDateTime::now_utc()),
            _ => false,
        }
    }
}

#[derive(Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentStatus>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new component, returning a handle it reports through.
    /// Registered components start in `Starting`, which is unhealthy, so a
    /// component that never reports keeps the probe failing.
    pub fn register(&self, component: impl Into<String>, deadline: Duration) -> HealthHandle {
        let component = component.into();
        self.components
            .write()
            .expect("health registry lock poisoned")
            .insert(component.clone(), ComponentStatus::Starting);
        HealthHandle {
            component,
            deadline,
            registry: self.clone(),
        }
    }

    pub fn get_status(&self) -> HealthStatus {
        let components = self
            .components
            .read()
            .expect("health registry lock poisoned")
            .clone();
        let healthy = !components.is_empty() && components.values().all(|c| c.is_healthy());
        HealthStatus {
            healthy,
            components,
        }
    }

    fn set(&self, component: &str, status: ComponentStatus) {
        self.components
            .write()
            .expect("health registry lock poisoned")
            .insert(component.to_string(), status);
    }
}

#[derive(Clone)]
pub struct HealthHandle {
    component: String,
    deadline: Duration,
    registry: HealthRegistry,
}

impl HealthHandle {
    /// Report as healthy. Must be called more frequently than the deadline
    /// given at registration.
    pub fn report_healthy(&self) {
        self.registry.set(
            &self.component,
            ComponentStatus::HealthyUntil(OffsetDateTime::now_utc() + self.deadline),
        );
    }

    pub fn report_unhealthy(&self) {
        self.registry.set(&self.component, ComponentStatus::Unhealthy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_is_unhealthy() {
        let registry = HealthRegistry::new();
        assert!(!registry.get_status().healthy);
    }

    #[test]
    fn unreported_component_is_unhealthy() {
        let registry = HealthRegistry::new();
        let _handle = registry.register("worker", Duration::from_secs(30));
        let status = registry.get_status();
        assert!(!status.healthy);
        assert_eq!(
            status.components.get("worker"),
            Some(&ComponentStatus::Starting)
        );
    }

    #[test]
    fn reported_component_is_healthy_until_deadline() {
        let registry = HealthRegistry::new();
        let handle = registry.register("worker", Duration::from_secs(30));
        handle.report_healthy();
        assert!(registry.get_status().healthy);

        handle.report_unhealthy();
        assert!(!registry.get_status().healthy);
    }

    #[test]
    fn one_stalled_component_fails_the_probe() {
        let registry = HealthRegistry::new();
        let worker = registry.register("worker", Duration::from_secs(30));
        let stalled = registry.register("stalled", Duration::from_millis(0));
        worker.report_healthy();
        stalled.report_healthy();
        // A zero deadline expires immediately
        assert!(!registry.get_status().healthy);
    }
}
