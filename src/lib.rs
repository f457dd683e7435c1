//! Pouch - command-line client for a Pouch-compatible container daemon
//!
//! Covers container creation:
//!
//! - Mapping `pouch create` flags onto a container specification
//! - Validating and normalizing flag values before submission
//! - Submitting the specification to the daemon and reporting the result

pub mod client;
pub mod commands;
pub mod config;
pub mod container;
pub mod error;

pub use error::{PouchError, Result};
