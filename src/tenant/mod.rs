// ABOUTME: Tenant context types and re-exports for tenant resolution
// ABOUTME: Administrative and tenant-scoped surfaces carry different contexts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Tenancy
//!
//! Every request is resolved to a [`TenantContext`] before anything else
//! runs. The administrative surface has no tenant; tenant-scoped surfaces
//! must carry exactly one tenant signal (query parameter or header).

mod init;
mod registry;
mod resolver;

pub use init::TenantInitTracker;
pub use registry::TenantConnectionRegistry;
pub use resolver::TenantResolver;

use uuid::Uuid;

/// Which surface a route belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSurface {
    /// Admin routes, served from the default database, no tenant signal allowed
    Administrative,
    /// Tenant routes, served from the tenant's own database
    TenantScoped,
}

/// The tenant a request resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    /// Resolved tenant id; `None` on the administrative surface
    pub tenant_id: Option<Uuid>,
    /// Connection string for the tenant's database; `None` on the
    /// administrative surface
    pub connection_string: Option<String>,
}

impl TenantContext {
    /// Context for the administrative surface
    #[must_use]
    pub const fn administrative() -> Self {
        Self {
            tenant_id: None,
            connection_string: None,
        }
    }

    /// Context for a resolved tenant
    #[must_use]
    pub const fn for_tenant(tenant_id: Uuid, connection_string: String) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            connection_string: Some(connection_string),
        }
    }

    /// Whether this request runs against a tenant database
    #[must_use]
    pub const fn is_tenant_scoped(&self) -> bool {
        self.tenant_id.is_some()
    }
}
