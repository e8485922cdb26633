//! API handlers for the registration back office.
//!
//! Route handlers are grouped by surface: admin auth and sessions, team
//! registration endpoints, aggregate stats, and health.

pub mod auth;
pub mod health;
pub mod stats;
pub mod teams;
