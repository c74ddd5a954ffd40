//! Domain models for chirpy
//!
//! This module contains the core domain models used throughout the application.

pub mod chirp;
pub mod token;
pub mod user;
pub mod webhook;

// Re-export commonly used types
pub use chirp::{Chirp, CreateChirpRequest, MAX_CHIRP_LENGTH};
pub use token::{RefreshResponse, RefreshToken};
pub use user::{CredentialsRequest, LoginResponse, User, UserResponse};
pub use webhook::{WebhookData, WebhookEvent, USER_UPGRADED_EVENT};
