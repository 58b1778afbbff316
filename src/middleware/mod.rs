// ABOUTME: Request middleware: tenant resolution and principal extraction
// ABOUTME: Every route passes through one surface middleware before its handler
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

mod auth;
mod tenant;

pub use auth::bearer_token;
pub use tenant::{administrative, tenant_scoped};
