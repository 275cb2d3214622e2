//! Core use-case services (the managers).
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce ownership, membership, and visibility rules.
//! - Keep transport layers decoupled from storage details.

pub mod account_service;
pub mod error;
pub mod friend_service;
pub mod herd_service;
pub mod notification_service;
pub mod notifier;
pub mod reaction_service;
pub mod reflection_service;
