use std::sync::Arc;

use tracing::debug;

use fleet_domain::{Coordinates, DispatchError, DispatchResult, DispatchStrategy, DriverCandidate, Selection};

use crate::geo::distance_km;

/// Linear scan that picks the candidate living closest to the pickup.
///
/// Only a strictly smaller distance replaces the current best, so ties go to
/// the earliest candidate in the list.
pub struct NearestDriverStrategy;

impl NearestDriverStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NearestDriverStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchStrategy for NearestDriverStrategy {
    fn select_driver(
        &self,
        pickup: Coordinates,
        candidates: &[DriverCandidate],
    ) -> Option<Selection> {
        if candidates.is_empty() {
            debug!("no candidates to score");
            return None;
        }

        let mut best: Option<Selection> = None;
        for candidate in candidates {
            let Some(home) = candidate.home.coordinates else {
                debug!(
                    "skipping driver {}: home address {} has no coordinates",
                    candidate.driver.id, candidate.home.id
                );
                continue;
            };

            let distance = distance_km(pickup, home);
            let better = best.map_or(true, |current| distance < current.distance_km);
            if better {
                best = Some(Selection {
                    driver_id: candidate.driver.id,
                    distance_km: distance,
                });
            }
        }

        if let Some(selection) = &best {
            debug!(
                "nearest strategy selected driver {} at {:.3} km ({} candidates)",
                selection.driver_id,
                selection.distance_km,
                candidates.len()
            );
        }

        best
    }

    fn name(&self) -> &str {
        "nearest"
    }
}

/// Builds the strategy named in `[dispatcher] strategy`.
pub fn strategy_from_name(name: &str) -> DispatchResult<Arc<dyn DispatchStrategy>> {
    match name {
        "nearest" => Ok(Arc::new(NearestDriverStrategy::new())),
        other => Err(DispatchError::config_error(format!(
            "unknown dispatch strategy: {other}"
        ))),
    }
}
