pub mod mapping;
pub mod sqlite;

pub use sqlite::{
    DatabaseManager, SqliteAddressDirectory, SqliteClientDirectory, SqliteDriverPool,
    SqliteServiceStore,
};
