//! Operator identity middleware
//!
//! Authentication proper is an upstream concern (the venue gateway
//! terminates login/JWT); this server only needs the operator identity
//! that privileged requests carry in the `X-Operator` header.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::utils::AppError;

pub const OPERATOR_HEADER: &str = "x-operator";

/// Operator identity attached by [`require_operator`].
#[derive(Debug, Clone)]
pub struct CurrentOperator(pub String);

/// Reject privileged requests that carry no operator identity.
pub async fn require_operator(mut request: Request, next: Next) -> Response {
    let operator = request
        .headers()
        .get(OPERATOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from);

    match operator {
        Some(name) => {
            request.extensions_mut().insert(CurrentOperator(name));
            next.run(request).await
        }
        None => AppError::Unauthorized.into_response(),
    }
}
