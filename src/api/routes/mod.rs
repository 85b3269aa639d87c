//! API Routes
//!
//! Route handlers organized by functionality.

pub mod analytics;
pub mod auth;
pub mod chat;
pub mod feed;
pub mod health;
