// ABOUTME: Application constants for roles, policies, and pipeline limits
// ABOUTME: Seed defaults mirror the values provisioned on first tenant use
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

/// Claim type under which permission policies are stored
pub const PERMISSION_CLAIM: &str = "Permission";

/// Coarse role labels used for the first authorization gate
pub mod roles {
    /// Full administrative access
    pub const ADMIN: &str = "Admin";
    /// Regular user access
    pub const USER: &str = "User";

    /// All roles provisioned by the seed
    #[must_use]
    pub fn all() -> Vec<&'static str> {
        vec![ADMIN, USER]
    }
}

/// Named capability strings attached directly to users as claims
pub mod policies {
    pub const CAN_CREATE: &str = "CanCreate";
    pub const CAN_EDIT: &str = "CanEdit";
    pub const CAN_LIST: &str = "CanList";
    pub const CAN_VIEW: &str = "CanView";
    pub const CAN_DELETE: &str = "CanDelete";

    /// All policies provisioned by the seed
    #[must_use]
    pub fn all() -> Vec<&'static str> {
        vec![CAN_CREATE, CAN_EDIT, CAN_LIST, CAN_VIEW, CAN_DELETE]
    }

    /// Policies granted to accounts created through external login
    #[must_use]
    pub fn external_login_defaults() -> Vec<&'static str> {
        vec![CAN_LIST, CAN_VIEW]
    }
}

/// Pipeline and request limits
pub mod limits {
    /// Operations slower than this log a warning with the resolved username
    pub const SLOW_OPERATION_MS: u128 = 500;
    /// Minimum accepted password length
    pub const MIN_PASSWORD_LEN: usize = 6;
}

/// Request headers and parameters carrying the tenant signal
pub mod tenant_signal {
    /// Header carrying the tenant id
    pub const HEADER: &str = "x-tenant-id";
    /// OAuth `state` query parameter carrying the tenant id
    pub const QUERY_PARAM: &str = "state";
}
