//! chirpy - authentication and session service for a short-message platform
//!
//! This crate provides password hashing, access and refresh tokens, and the
//! ownership checks that guard mutating operations, served over HTTP.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod server;
pub mod telemetry;
