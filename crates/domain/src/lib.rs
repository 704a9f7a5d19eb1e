pub mod entities;
pub mod repositories;
pub mod services;
pub mod validation;
pub mod value_objects;

pub use entities::*;
pub use fleet_errors::{DispatchError, DispatchResult, ErrorKind};
pub use repositories::*;
pub use services::*;
pub use value_objects::*;
