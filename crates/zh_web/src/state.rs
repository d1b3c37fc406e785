use std::sync::Arc;
use zh_core::ArticleStorage;

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
}
