use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fleet_errors::DispatchError;

use crate::value_objects::Coordinates;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub city: String,
    pub street: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl Address {
    /// Case-insensitive location match; `country` is ignored when `None`.
    pub fn is_located_in(&self, city: &str, country: Option<&str>) -> bool {
        same_place(&self.city, city)
            && country.map_or(true, |country| same_place(&self.country, country))
    }
}

fn same_place(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub address_id: i64,
    pub is_available: bool,
}

/// An available driver joined with its home address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverCandidate {
    pub driver: Driver,
    pub home: Address,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    InProgress,
    Completed,
    Canceled,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::InProgress => "in_progress",
            ServiceStatus::Completed => "completed",
            ServiceStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceStatus::Completed | ServiceStatus::Canceled)
    }

    /// Legal moves of the lifecycle. Staying in a non-terminal state is allowed
    /// so that field updates (e.g. a new driver) can ride along.
    pub fn can_transition_to(&self, next: ServiceStatus) -> bool {
        use ServiceStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, InProgress)
                | (Pending, Canceled)
                | (InProgress, InProgress)
                | (InProgress, Completed)
                | (InProgress, Canceled)
        )
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ServiceStatus::Pending),
            "in_progress" => Ok(ServiceStatus::InProgress),
            "completed" => Ok(ServiceStatus::Completed),
            "canceled" => Ok(ServiceStatus::Canceled),
            _ => Err(format!("Invalid service status: {s}")),
        }
    }
}

impl sqlx::Type<sqlx::Sqlite> for ServiceStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ServiceStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        s.parse::<ServiceStatus>().map_err(Into::into)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ServiceStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: i64,
    pub pickup_address_id: i64,
    pub client_id: i64,
    pub driver_id: Option<i64>,
    pub status: ServiceStatus,
    /// Minutes.
    pub estimated_time: Option<f64>,
    /// Kilometres.
    pub distance: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    pub fn is_assigned_to(&self, driver_id: i64) -> bool {
        self.driver_id == Some(driver_id)
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

/// A service record that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewService {
    pub pickup_address_id: i64,
    pub client_id: i64,
    pub driver_id: Option<i64>,
    pub status: ServiceStatus,
    pub estimated_time: Option<f64>,
    pub distance: Option<f64>,
}

impl NewService {
    pub fn pending(pickup_address_id: i64, client_id: i64) -> Self {
        Self {
            pickup_address_id,
            client_id,
            driver_id: None,
            status: ServiceStatus::Pending,
            estimated_time: None,
            distance: None,
        }
    }

    pub fn with_driver(mut self, driver_id: i64) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    pub fn with_route(mut self, distance: Option<f64>, estimated_time: Option<f64>) -> Self {
        self.distance = distance;
        self.estimated_time = estimated_time;
        self
    }
}

/// Partial update of a service. `expected_status` and `expected_driver_id`
/// turn the write into a compare-and-set against the stored record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServicePatch {
    pub expected_status: Option<ServiceStatus>,
    pub expected_driver_id: Option<Option<i64>>,
    pub status: Option<ServiceStatus>,
    pub driver_id: Option<Option<i64>>,
    pub distance: Option<Option<f64>>,
    pub estimated_time: Option<Option<f64>>,
}

impl ServicePatch {
    pub fn expecting(status: ServiceStatus) -> Self {
        Self {
            expected_status: Some(status),
            ..Self::default()
        }
    }

    pub fn expecting_driver(mut self, driver_id: Option<i64>) -> Self {
        self.expected_driver_id = Some(driver_id);
        self
    }

    pub fn status(mut self, status: ServiceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn driver(mut self, driver_id: Option<i64>) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    pub fn route(mut self, distance: Option<f64>, estimated_time: Option<f64>) -> Self {
        self.distance = Some(distance);
        self.estimated_time = Some(estimated_time);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.driver_id.is_none()
            && self.distance.is_none()
            && self.estimated_time.is_none()
    }

    /// The `StaleService` error for `current` when it no longer matches the
    /// expectations of this patch, `None` when it does.
    pub fn conflict_with(&self, current: &Service) -> Option<DispatchError> {
        if let Some(expected) = self.expected_status {
            if current.status != expected {
                return Some(DispatchError::StaleService {
                    id: current.id,
                    expected: expected.to_string(),
                    actual: current.status.to_string(),
                });
            }
        }
        if let Some(expected) = self.expected_driver_id {
            if current.driver_id != expected {
                return Some(DispatchError::StaleService {
                    id: current.id,
                    expected: driver_label(expected),
                    actual: driver_label(current.driver_id),
                });
            }
        }
        None
    }

    /// Writes the patched fields onto `service`. Does not validate or touch timestamps.
    pub fn apply_to(&self, service: &mut Service) {
        if let Some(status) = self.status {
            service.status = status;
        }
        if let Some(driver_id) = self.driver_id {
            service.driver_id = driver_id;
        }
        if let Some(distance) = self.distance {
            service.distance = distance;
        }
        if let Some(estimated_time) = self.estimated_time {
            service.estimated_time = estimated_time;
        }
    }
}

fn driver_label(driver_id: Option<i64>) -> String {
    match driver_id {
        Some(id) => format!("driver {id}"),
        None => "no driver".to_string(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceFilter {
    pub status: Option<ServiceStatus>,
    pub driver_id: Option<i64>,
    pub client_id: Option<i64>,
}

impl ServiceFilter {
    pub fn with_status(status: ServiceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, service: &Service) -> bool {
        self.status.map_or(true, |status| service.status == status)
            && self.driver_id.map_or(true, |id| service.driver_id == Some(id))
            && self.client_id.map_or(true, |id| service.client_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bogota() -> Address {
        Address {
            id: 1,
            name: "Origen".to_string(),
            country: "Colombia".to_string(),
            city: "Bogotá".to_string(),
            street: Some("Calle 1 #2-3".to_string()),
            coordinates: Some(Coordinates::new(4.60971, -74.08175).unwrap()),
        }
    }

    fn service(status: ServiceStatus, driver_id: Option<i64>) -> Service {
        Service {
            id: 1,
            pickup_address_id: 1,
            client_id: 1,
            driver_id,
            status,
            estimated_time: None,
            distance: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_address_location_match() {
        let address = bogota();
        assert!(address.is_located_in("Bogotá", Some("Colombia")));
        assert!(address.is_located_in("BOGOTÁ", Some("colombia")));
        assert!(address.is_located_in(" bogotá ", None));
        assert!(!address.is_located_in("Bogotá", Some("Peru")));
        assert!(!address.is_located_in("Medellín", None));
    }

    #[test]
    fn test_status_transitions() {
        use ServiceStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Canceled));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Canceled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Completed));
        assert!(!Canceled.can_transition_to(Pending));
        assert!(Completed.is_terminal());
        assert!(Canceled.is_terminal());
        assert!(!InProgress.is_terminal());
    }

    #[test]
    fn test_status_text_representation() {
        assert_eq!(ServiceStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            "completed".parse::<ServiceStatus>().unwrap(),
            ServiceStatus::Completed
        );
        assert!("done".parse::<ServiceStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&ServiceStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_patch_apply() {
        let mut current = service(ServiceStatus::Pending, None);
        let patch = ServicePatch::expecting(ServiceStatus::Pending)
            .driver(Some(9))
            .route(Some(2.0), Some(3.0));
        assert!(!patch.is_empty());

        patch.apply_to(&mut current);
        assert_eq!(current.driver_id, Some(9));
        assert_eq!(current.distance, Some(2.0));
        assert_eq!(current.estimated_time, Some(3.0));
        assert_eq!(current.status, ServiceStatus::Pending);
        assert!(ServicePatch::expecting(ServiceStatus::Pending).is_empty());
    }

    #[test]
    fn test_patch_conflict_checks_status_then_driver() {
        let current = service(ServiceStatus::InProgress, Some(2));

        let matching = ServicePatch::expecting(ServiceStatus::InProgress).expecting_driver(Some(2));
        assert!(matching.conflict_with(&current).is_none());
        assert!(ServicePatch::default().conflict_with(&current).is_none());

        let stale_status =
            ServicePatch::expecting(ServiceStatus::Pending).expecting_driver(Some(7));
        match stale_status.conflict_with(&current) {
            Some(DispatchError::StaleService { expected, actual, .. }) => {
                assert_eq!(expected, "pending");
                assert_eq!(actual, "in_progress");
            }
            other => panic!("unexpected conflict: {other:?}"),
        }

        let stale_driver =
            ServicePatch::expecting(ServiceStatus::InProgress).expecting_driver(Some(1));
        match stale_driver.conflict_with(&current) {
            Some(DispatchError::StaleService { expected, actual, .. }) => {
                assert_eq!(expected, "driver 1");
                assert_eq!(actual, "driver 2");
            }
            other => panic!("unexpected conflict: {other:?}"),
        }
    }

    #[test]
    fn test_service_filter() {
        let pending = service(ServiceStatus::Pending, None);
        let assigned = service(ServiceStatus::InProgress, Some(3));

        let filter = ServiceFilter::with_status(ServiceStatus::Pending);
        assert!(filter.matches(&pending));
        assert!(!filter.matches(&assigned));

        let filter = ServiceFilter {
            driver_id: Some(3),
            ..ServiceFilter::default()
        };
        assert!(filter.matches(&assigned));
        assert!(!filter.matches(&pending));
        assert!(ServiceFilter::default().matches(&pending));
    }
}
