//! # sparky-core
//!
//! Configuration and audit events shared by the sparkyservice crates.
//!
//! - [`config`] - environment-driven configuration
//! - [`event`] - structured audit events

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod event;

pub use config::{Config, ConfigError, IdentitySettings, MemoryUserSettings, ServerSettings, TokenSettings};
pub use event::{Event, EventBuilder, EventOutcome, EventType};
