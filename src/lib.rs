// ABOUTME: Main library entry point for the Atrium multi-tenant business API
// ABOUTME: Provides per-tenant database routing, identity stores, and the operation pipeline
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![deny(unsafe_code)]

//! # Atrium
//!
//! A multi-tenant business API server. Every request is routed to a
//! tenant-specific database and identity store, and every business operation
//! executes through a fixed pipeline of cross-cutting stages (logging,
//! performance timing, error translation, validation, authorization).
//!
//! ## Architecture
//!
//! - **Tenant**: tenant resolution from request state, connection registry,
//!   and first-use schema initialization
//! - **Identity**: per-tenant user/role stores behind one uniform interface
//! - **Auth**: tenant-scoped JWT issuing and validation
//! - **Pipeline**: the ordered behavior chain wrapping every operation
//! - **Operations**: the business leaves (clients, users, login) consumed
//!   through the pipeline

/// Tenant-scoped JWT issuing and validation
pub mod auth;

/// Declarative operation requirements and the authorization evaluator
pub mod authz;

/// Configuration management from environment variables
pub mod config;

/// Application constants: roles, policies, limits
pub mod constants;

/// Shared server resources bundle for dependency injection
pub mod context;

/// Database access over per-tenant `SQLite` pools
pub mod database;

/// The uniform success/error/paginated response envelope
pub mod envelope;

/// Unified error handling with standard error codes and `HTTP` mapping
pub mod errors;

/// Tenant-scoped identity stores and the broker that selects them
pub mod identity;

/// Production logging and structured output
pub mod logging;

/// `HTTP` middleware for tenant resolution and principal extraction
pub mod middleware;

/// Common data models for users and clients
pub mod models;

/// Business operations executed through the pipeline
pub mod operations;

/// Page metadata helpers for paginated envelopes
pub mod pagination;

/// The per-request operation execution pipeline
pub mod pipeline;

/// `HTTP` routes for the administrative and tenant-scoped surfaces
pub mod routes;

/// Multi-tenant resolution, connection registry, and first-use initialization
pub mod tenant;
