//! Request ID handling.
//!
//! # Responsibilities
//! - Generate a request ID for inbound requests that lack one
//! - Echo it on the response
//! - Carry it through the dispatch chain so outbound calls reuse it
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A task-local scope carries the ID; no signature in the call chain changes

use std::future::Future;

use axum::http::{HeaderMap, HeaderName};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Layer that assigns a UUID v4 to requests without an `x-request-id`.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Layer that copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Read the request ID from inbound headers.
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Run `fut` with `id` visible to [`current_request_id`].
pub async fn scope_request_id<F: Future>(id: Option<String>, fut: F) -> F::Output {
    match id {
        Some(id) => REQUEST_ID.scope(id, fut).await,
        None => fut.await,
    }
}

/// The request ID of the inbound call being served, if any.
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}
