//! Shared types for the tubenor client.
//!
//! This crate defines the session/conversation domain types, the wire bodies
//! of the analytics backend contract, and strongly-typed error enums shared
//! across the workspace.

pub mod auth;
pub mod error;
pub mod message;
pub mod wire;

/// Re-export of session identity types.
pub use auth::{AuthState, ChannelInfo};
/// Re-export of all error types.
pub use error::*;
/// Re-export of conversation types.
pub use message::{ConversationTurn, Role};
/// Re-export of backend wire bodies.
pub use wire::{CallbackRequest, CallbackResponse, ErrorBody, LoginResponse, StatusResponse};
