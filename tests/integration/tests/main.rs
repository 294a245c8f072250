//! End-to-End Integration Tests
//!
//! These tests drive the complete sparkyservice router in process, backed
//! by the in-memory user store and a static directory.

mod auth_flows;
mod common;
mod user_admin;
