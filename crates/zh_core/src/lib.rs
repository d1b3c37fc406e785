pub mod error;
pub mod id;
pub mod models;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use id::short_id;
pub use models::GenerationModel;
pub use storage::ArticleStorage;
pub use types::{GenerationOutput, ScrapedRecord, StoredArticle};

pub mod prelude {
    pub use super::{ArticleStorage, Error, GenerationModel, GenerationOutput, Result};
    pub use super::{ScrapedRecord, StoredArticle};
}
