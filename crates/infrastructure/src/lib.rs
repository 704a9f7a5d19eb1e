pub mod database;
pub mod memory;
pub mod seed;

pub use database::*;
pub use memory::InMemoryFleetStore;
pub use seed::{DemoSeeder, SeedPlan, SeedReport};
