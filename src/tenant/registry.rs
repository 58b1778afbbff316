// ABOUTME: Tenant-to-connection-string registry backed by an environment variable
// ABOUTME: Re-reads the environment per lookup so registrations land without restart
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::AppError;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use uuid::Uuid;

/// Environment variable holding a JSON object of tenant id to connection string
const TENANT_CONNECTIONS_VAR: &str = "TENANT_CONNECTIONS";

/// Maps tenant ids to database connection strings.
///
/// Production reads the `TENANT_CONNECTIONS` environment variable fresh on
/// every lookup, matching a configuration source that can change while the
/// server runs. Tests inject a fixed map.
#[derive(Clone, Default)]
pub struct TenantConnectionRegistry {
    overrides: Option<Arc<HashMap<Uuid, String>>>,
}

impl TenantConnectionRegistry {
    /// Registry reading from the environment on each lookup
    #[must_use]
    pub fn from_env() -> Self {
        Self { overrides: None }
    }

    /// Registry with a fixed set of connections, for tests
    #[must_use]
    pub fn with_connections(connections: HashMap<Uuid, String>) -> Self {
        Self {
            overrides: Some(Arc::new(connections)),
        }
    }

    /// Look up the connection string for a tenant
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unregistered tenant and a
    /// configuration error when the registry source cannot be parsed.
    pub fn connection_string(&self, tenant_id: Uuid) -> Result<String, AppError> {
        if let Some(overrides) = &self.overrides {
            return overrides
                .get(&tenant_id)
                .cloned()
                .ok_or_else(|| AppError::not_found(format!("Tenant {tenant_id}")));
        }

        let raw = env::var(TENANT_CONNECTIONS_VAR).map_err(|_| {
            AppError::config(format!("{TENANT_CONNECTIONS_VAR} is not set"))
        })?;
        let connections: HashMap<Uuid, String> = serde_json::from_str(&raw).map_err(|e| {
            AppError::config(format!("{TENANT_CONNECTIONS_VAR} is not valid JSON: {e}"))
        })?;

        connections
            .get(&tenant_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Tenant {tenant_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_registry_lookup() {
        let tenant = Uuid::new_v4();
        let registry = TenantConnectionRegistry::with_connections(HashMap::from([(
            tenant,
            "sqlite::memory:".to_owned(),
        )]));

        assert_eq!(
            registry.connection_string(tenant).unwrap(),
            "sqlite::memory:"
        );
        assert!(registry.connection_string(Uuid::new_v4()).is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_env_registry_reads_fresh_per_lookup() {
        let tenant = Uuid::new_v4();
        let registry = TenantConnectionRegistry::from_env();

        env::set_var(
            TENANT_CONNECTIONS_VAR,
            format!("{{\"{tenant}\": \"sqlite:tenant.db\"}}"),
        );
        assert_eq!(
            registry.connection_string(tenant).unwrap(),
            "sqlite:tenant.db"
        );

        // A registration added after construction is visible immediately
        let late = Uuid::new_v4();
        env::set_var(
            TENANT_CONNECTIONS_VAR,
            format!("{{\"{tenant}\": \"sqlite:tenant.db\", \"{late}\": \"sqlite:late.db\"}}"),
        );
        assert_eq!(registry.connection_string(late).unwrap(), "sqlite:late.db");

        env::set_var(TENANT_CONNECTIONS_VAR, "not json");
        assert!(registry.connection_string(tenant).is_err());

        env::remove_var(TENANT_CONNECTIONS_VAR);
        assert!(registry.connection_string(tenant).is_err());
    }
}
