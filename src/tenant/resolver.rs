// ABOUTME: Resolves incoming tenant signals into a TenantContext per surface
// ABOUTME: Query parameter wins over header; each surface constrains what is allowed
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::{ApiSurface, TenantConnectionRegistry, TenantContext};
use crate::constants::tenant_signal;
use crate::errors::AppError;
use uuid::Uuid;

/// Resolves the tenant for a request from its signals
#[derive(Clone)]
pub struct TenantResolver {
    registry: TenantConnectionRegistry,
}

impl TenantResolver {
    #[must_use]
    pub const fn new(registry: TenantConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Resolve the tenant context from the request's signals.
    ///
    /// The `state` query parameter takes precedence over the
    /// `x-tenant-id` header. The administrative surface rejects any tenant
    /// signal; tenant-scoped surfaces require one.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for a malformed or misplaced signal
    /// and a not-found error for an unregistered tenant.
    pub fn resolve(
        &self,
        surface: ApiSurface,
        query_param: Option<&str>,
        header: Option<&str>,
    ) -> Result<TenantContext, AppError> {
        let signal = query_param.filter(|s| !s.is_empty()).or(header);
        let tenant_id = signal
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|_| {
                    AppError::invalid_input(format!("Invalid tenant identifier: {raw}"))
                })
            })
            .transpose()?;

        match (surface, tenant_id) {
            (ApiSurface::Administrative, None) => Ok(TenantContext::administrative()),
            (ApiSurface::Administrative, Some(_)) => Err(AppError::invalid_input(format!(
                "The administrative surface does not accept a tenant signal; remove the '{}' parameter or '{}' header",
                tenant_signal::QUERY_PARAM,
                tenant_signal::HEADER
            ))),
            (ApiSurface::TenantScoped, None) => Err(AppError::invalid_input(format!(
                "A tenant signal is required; send the '{}' parameter or '{}' header",
                tenant_signal::QUERY_PARAM,
                tenant_signal::HEADER
            ))),
            (ApiSurface::TenantScoped, Some(id)) => {
                let connection_string = self.registry.connection_string(id)?;
                Ok(TenantContext::for_tenant(id, connection_string))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use std::collections::HashMap;

    fn resolver_for(tenant: Uuid) -> TenantResolver {
        TenantResolver::new(TenantConnectionRegistry::with_connections(HashMap::from(
            [(tenant, "sqlite::memory:".to_owned())],
        )))
    }

    #[test]
    fn test_query_param_wins_over_header() {
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        let resolver =
            TenantResolver::new(TenantConnectionRegistry::with_connections(HashMap::from([
                (tenant_a, "sqlite:a.db".to_owned()),
                (tenant_b, "sqlite:b.db".to_owned()),
            ])));

        let context = resolver
            .resolve(
                ApiSurface::TenantScoped,
                Some(&tenant_a.to_string()),
                Some(&tenant_b.to_string()),
            )
            .unwrap();
        assert_eq!(context.tenant_id, Some(tenant_a));
        assert_eq!(context.connection_string.as_deref(), Some("sqlite:a.db"));
    }

    #[test]
    fn test_empty_query_param_falls_back_to_header() {
        let tenant = Uuid::new_v4();
        let resolver = resolver_for(tenant);

        let context = resolver
            .resolve(
                ApiSurface::TenantScoped,
                Some(""),
                Some(&tenant.to_string()),
            )
            .unwrap();
        assert_eq!(context.tenant_id, Some(tenant));
    }

    #[test]
    fn test_admin_surface_rejects_tenant_signal() {
        let tenant = Uuid::new_v4();
        let resolver = resolver_for(tenant);

        let error = resolver
            .resolve(
                ApiSurface::Administrative,
                Some(&tenant.to_string()),
                None,
            )
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_tenant_surface_requires_signal() {
        let resolver = resolver_for(Uuid::new_v4());

        let error = resolver
            .resolve(ApiSurface::TenantScoped, None, None)
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_malformed_signal_rejected() {
        let resolver = resolver_for(Uuid::new_v4());

        let error = resolver
            .resolve(ApiSurface::TenantScoped, Some("not-a-uuid"), None)
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_unknown_tenant_not_found() {
        let resolver = resolver_for(Uuid::new_v4());

        let error = resolver
            .resolve(
                ApiSurface::TenantScoped,
                Some(&Uuid::new_v4().to_string()),
                None,
            )
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_admin_surface_without_signal() {
        let resolver = resolver_for(Uuid::new_v4());

        let context = resolver
            .resolve(ApiSurface::Administrative, None, None)
            .unwrap();
        assert_eq!(context, TenantContext::administrative());
    }
}
