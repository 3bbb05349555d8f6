use axum::Router;
use tower_http::trace::TraceLayer;

pub mod commands;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod http;
pub mod sessions;
pub mod state;
pub mod texts;
pub mod transport;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(http::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
