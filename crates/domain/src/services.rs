use serde::{Deserialize, Serialize};

use crate::{entities::DriverCandidate, value_objects::Coordinates};

/// Outcome of a candidate selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    pub driver_id: i64,
    /// Kilometres from the driver's home to the pickup.
    pub distance_km: f64,
}

/// Candidate selection seam.
///
/// Selection is pure CPU work over an already fetched candidate list, so the
/// trait is synchronous. Implementations must be deterministic for a given
/// candidate order.
pub trait DispatchStrategy: Send + Sync {
    fn select_driver(&self, pickup: Coordinates, candidates: &[DriverCandidate])
        -> Option<Selection>;

    fn name(&self) -> &str;
}
