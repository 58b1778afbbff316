// ABOUTME: Business operations run through the pipeline
// ABOUTME: Each operation declares its validators and authorization requirements
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

mod auth;
mod clients;
mod users;

pub use auth::{ExternalLoginCallback, LoginUser};
pub use clients::{
    CreateClient, DeactivateClient, DeleteClient, GetClient, ListClients, UpdateClient,
};
pub use users::{CreateUser, DeleteUser, EditUser, GetPolicies, ListUsers};
