pub mod app_config;
pub mod database;
pub mod dispatcher;
pub mod observability;

pub use app_config::*;
pub use database::*;
pub use dispatcher::*;
pub use observability::*;
