//! Fleet dispatch core
//!
//! Matches service requests to the nearest available driver and drives the
//! service state machine afterwards. Storage is reached only through the
//! ports in `fleet_domain::repositories`.

pub mod engine;
pub mod geo;
pub mod lifecycle;
pub mod strategies;

pub use engine::{
    DispatchEngine, DispatchOutcome, DispatchSettings, RouteEstimate, ServiceRequest,
    NO_DRIVERS_AVAILABLE,
};
pub use lifecycle::{ServiceLifecycle, ServiceStatusSummary};
pub use strategies::{strategy_from_name, NearestDriverStrategy};
