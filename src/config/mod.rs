// ABOUTME: Configuration management module
// ABOUTME: Environment-driven server configuration with typed sub-configs
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

/// Environment-based configuration management
pub mod environment;

pub use environment::{Environment, JwtConfig, SeedConfig, ServerConfig};
