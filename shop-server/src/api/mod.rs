//! API routes
//!
//! # Structure
//!
//! - [`health`] - liveness and database check
//! - [`auth`] - registration, login, current account
//! - [`users`] - profile, address book, admin user management
//! - [`products`], [`categories`], [`search`] - catalog
//! - [`cart`], [`orders`], [`coupons`] - checkout and order lifecycle
//! - [`reviews`] - product reviews
//! - [`chat`], [`notifications`], [`contact`] - customer engagement
//! - [`settings`], [`dashboard`], [`upload`] - administration

pub mod auth;
pub mod cart;
pub mod categories;
pub mod chat;
pub mod contact;
pub mod coupons;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod search;
pub mod settings;
pub mod upload;
pub mod users;

use axum::Router;
use http::{HeaderName, HeaderValue, Method};
use shared::error::ApiResponse;
use shared::response::{PageQuery, PaginatedResponse};
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::state::AppState;

/// Handler result: success envelope or an error mapped to its status
pub type ApiResult<T> = Result<ApiResponse<T>, ServiceError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::success(data))
}

pub fn ok_message(message: impl Into<String>) -> ApiResult<()> {
    Ok(ApiResponse::ok(message))
}

pub fn paginated<T>(items: Vec<T>, page: &PageQuery, total: i64) -> ApiResult<PaginatedResponse<T>> {
    ok(PaginatedResponse::new(items, page, total))
}

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Every route, no middleware
pub fn build_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(users::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(orders::router())
        .merge(cart::router())
        .merge(reviews::router())
        .merge(coupons::router())
        .merge(contact::router())
        .merge(settings::router())
        .merge(dashboard::router())
        .merge(upload::router())
        .merge(search::router())
        .merge(chat::router())
        .merge(notifications::router())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Fully configured application with middleware and state
pub fn build_app(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    let uploads = ServeDir::new(&state.config.upload_dir);
    let cors = cors_layer(&state.config.cors_origins);

    build_router(&state)
        .nest_service("/uploads", uploads)
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, XRequestId))
}
