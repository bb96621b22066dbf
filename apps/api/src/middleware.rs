use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tessera_core::{AppError, CallerContext, TenantId, UserId};

use crate::error::ApiResult;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";

/// Resolves the caller from the identity headers set by the upstream gateway.
pub async fn require_caller(mut request: Request, next: Next) -> ApiResult<Response> {
    let caller = caller_from_headers(request.headers())?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

fn caller_from_headers(headers: &HeaderMap) -> Result<CallerContext, AppError> {
    let tenant_id = required_uuid_header(headers, TENANT_HEADER)?;
    let user_id = required_uuid_header(headers, USER_HEADER)?;

    Ok(CallerContext::new(
        UserId::from_uuid(user_id),
        TenantId::from_uuid(tenant_id),
    ))
}

fn required_uuid_header(headers: &HeaderMap, name: &str) -> Result<uuid::Uuid, AppError> {
    let value = headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("missing '{name}' header")))?;

    uuid::Uuid::parse_str(value)
        .map_err(|_| AppError::Unauthorized(format!("invalid '{name}' header")))
}
