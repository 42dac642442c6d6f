use axum::Router;

pub mod audit;
pub mod items;
pub mod stock;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .merge(items::router())
        .merge(stock::router())
        .merge(audit::router())
}
