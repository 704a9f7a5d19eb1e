//! Explicit checks run before a service is persisted.
//!
//! Stores never validate on their own; the engine and the lifecycle call these
//! functions and hand the store an already normalized record.

use fleet_errors::{DispatchError, DispatchResult};

use crate::entities::{NewService, Service, ServicePatch, ServiceStatus};

/// A service that carries a driver is never left `pending`.
pub fn promote_assigned(status: ServiceStatus, driver_id: Option<i64>) -> ServiceStatus {
    match (status, driver_id) {
        (ServiceStatus::Pending, Some(_)) => ServiceStatus::InProgress,
        (status, _) => status,
    }
}

/// Values supplied directly by a caller must be strictly positive.
pub fn validate_supplied_metric(value: Option<f64>, field: &str) -> DispatchResult<()> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(DispatchError::invalid_input(format!(
            "{field} must be greater than 0, got {v}"
        ))),
        _ => Ok(()),
    }
}

fn validate_stored_metric(value: Option<f64>, field: &str) -> DispatchResult<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(DispatchError::invalid_input(format!(
            "{field} must be a non-negative number, got {v}"
        ))),
        _ => Ok(()),
    }
}

pub fn prepare_new_service(record: &mut NewService) -> DispatchResult<()> {
    record.status = promote_assigned(record.status, record.driver_id);

    match (record.status, record.driver_id) {
        (ServiceStatus::Pending, None) | (ServiceStatus::InProgress, Some(_)) => {}
        (ServiceStatus::InProgress, None) => {
            return Err(DispatchError::invalid_input(
                "an in_progress service needs a driver",
            ))
        }
        (status, _) => {
            return Err(DispatchError::invalid_input(format!(
                "services cannot be created as {status}"
            )))
        }
    }

    validate_stored_metric(record.distance, "distance")?;
    validate_stored_metric(record.estimated_time, "estimated_time")?;
    Ok(())
}

/// Normalizes `patch` against the current state of the service.
///
/// Pins `expected_status` and `expected_driver_id` to the observed record
/// (unless the caller already pinned them), applies auto-promotion, and
/// rejects illegal transitions.
pub fn prepare_patch(current: &Service, patch: &mut ServicePatch) -> DispatchResult<()> {
    if current.status.is_terminal() {
        return Err(DispatchError::ServiceFinalized {
            id: current.id,
            status: current.status.to_string(),
        });
    }

    let mut target = current.clone();
    patch.apply_to(&mut target);

    let promoted = promote_assigned(target.status, target.driver_id);
    if promoted != target.status {
        patch.status = Some(promoted);
        target.status = promoted;
    }

    if !current.status.can_transition_to(target.status) {
        return Err(DispatchError::invalid_transition(
            current.id,
            current.status,
            format!("move to {}", target.status),
        ));
    }
    if target.status == ServiceStatus::Completed && target.driver_id.is_none() {
        return Err(DispatchError::invalid_transition(
            current.id,
            current.status,
            "complete without a driver",
        ));
    }
    if target.status == ServiceStatus::InProgress && target.driver_id.is_none() {
        return Err(DispatchError::invalid_transition(
            current.id,
            current.status,
            "run without a driver",
        ));
    }

    validate_stored_metric(target.distance, "distance")?;
    validate_stored_metric(target.estimated_time, "estimated_time")?;

    if patch.expected_status.is_none() {
        patch.expected_status = Some(current.status);
    }
    if patch.expected_driver_id.is_none() {
        patch.expected_driver_id = Some(current.driver_id);
    }
    Ok(())
}
