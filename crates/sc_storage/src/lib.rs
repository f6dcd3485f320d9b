use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sc_core::{Error, RatingStore, RatingWriter, Result};
use tracing::info;

pub mod backends;

pub use backends::*;

/// Default number of records per `scan_page`.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::InvalidRequest(format!(
                "Unknown rating store '{}'. Available stores: memory, sqlite",
                other
            ))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// A store handle usable both for reading and for administrative writes.
pub trait RatingBackend: RatingStore + RatingWriter {
    fn into_store(self: Arc<Self>) -> Arc<dyn RatingStore>;
    fn into_writer(self: Arc<Self>) -> Arc<dyn RatingWriter>;
}

impl<T: RatingStore + RatingWriter + 'static> RatingBackend for T {
    fn into_store(self: Arc<Self>) -> Arc<dyn RatingStore> {
        self
    }

    fn into_writer(self: Arc<Self>) -> Arc<dyn RatingWriter> {
        self
    }
}

pub async fn create_store(kind: StoreKind, url: Option<&str>) -> Result<Arc<dyn RatingBackend>> {
    let store: Arc<dyn RatingBackend> = match kind {
        StoreKind::Memory => Arc::new(MemoryRatingStore::new()),
        #[cfg(feature = "sqlite")]
        StoreKind::Sqlite => {
            let path = url.unwrap_or("ratings.db");
            Arc::new(SqliteRatingStore::new_with_path(std::path::Path::new(path)).await?)
        }
        #[cfg(not(feature = "sqlite"))]
        StoreKind::Sqlite => {
            let _ = url;
            return Err(Error::StoreUnavailable(
                "sqlite support not compiled in (enable the `sqlite` feature)".to_string(),
            ));
        }
    };
    info!("🏦 Rating store initialized (using {})", kind);
    Ok(store)
}

pub mod prelude {
    pub use super::{create_store, RatingBackend, StoreKind};
    pub use super::backends::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_core::RatingRecord;

    #[test]
    fn test_store_kind_parsing() {
        assert_eq!("Memory".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert_eq!("sqlite".parse::<StoreKind>().unwrap(), StoreKind::Sqlite);
        assert!("dynamo".parse::<StoreKind>().is_err());
    }

    #[tokio::test]
    async fn test_create_memory_store() {
        let store = create_store(StoreKind::Memory, None).await.unwrap();
        store
            .put_rating(&RatingRecord { url: "u".into(), average_rating: 2.0 })
            .await
            .unwrap();
        assert_eq!(store.scan_all().await.unwrap().len(), 1);
    }
}
