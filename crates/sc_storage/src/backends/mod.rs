pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryRatingStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRatingStore;
