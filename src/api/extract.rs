//! Request extractors that reject with the JSON error body.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain text and, for
//! JSON bodies, with 415/422. These wrappers report every rejection as a
//! 400 [`ApiErrorResponse`].

use axum::extract::{FromRequest, FromRequestParts};

use super::error::ApiErrorResponse;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiErrorResponse))]
pub struct ApiJson<T>(pub T);

/// Path parameters.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiErrorResponse))]
pub struct ApiPath<T>(pub T);

/// Query string parameters.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiErrorResponse))]
pub struct ApiQuery<T>(pub T);
