use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use zh_core::{Error, Result};

pub mod handlers;
pub mod state;

pub use state::AppState;

/// Read-only JSON routes over the article store.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/:id", get(handlers::get_article))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Serving articles on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state))
        .await
        .map_err(Error::Io)
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use zh_core::{Error, Result, StoredArticle};
}
