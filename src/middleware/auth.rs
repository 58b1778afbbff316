// ABOUTME: Bearer token extraction and non-rejecting principal resolution
// ABOUTME: An invalid token yields an anonymous request, not a rejection
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::auth::TokenIssuer;
use crate::tenant::TenantContext;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use uuid::Uuid;

/// Extract the bearer token from the Authorization header
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the principal for a request, if any. Validation failures are
/// logged and produce an anonymous request; the authorization stage rejects
/// later if the operation requires a principal.
pub(super) fn resolve_principal(
    headers: &HeaderMap,
    token_issuer: &TokenIssuer,
    tenant: &TenantContext,
) -> Option<Uuid> {
    let token = bearer_token(headers)?;
    let tenant_id = tenant.tenant_id.unwrap_or_else(TokenIssuer::admin_tenant);

    match token_issuer.validate(token, tenant_id) {
        Ok(claims) => match Uuid::parse_str(&claims.sub) {
            Ok(user_id) => Some(user_id),
            Err(_) => {
                tracing::debug!("Token subject is not a valid user id");
                None
            }
        },
        Err(error) => {
            tracing::debug!(error = %error, "Token validation failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.remove(AUTHORIZATION);
        assert_eq!(bearer_token(&headers), None);
    }
}
