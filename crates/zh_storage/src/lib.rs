use std::path::Path;
use std::sync::Arc;
use zh_core::{ArticleStorage, Error, Result};

pub mod backends;

pub use backends::*;

/// Build the store named by `kind` (`sqlite` or `memory`).
///
/// The returned handle is not initialized yet; callers run
/// `ensure_initialized` before using it.
#[cfg_attr(not(feature = "sqlite"), allow(unused_variables))]
pub fn create_storage(kind: &str, db_path: &Path) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(SQLiteStorage::new_with_path(db_path))),
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        other => Err(Error::Config(format!(
            "Unknown storage backend: {}. Available backends: sqlite, memory",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_storage;
}
