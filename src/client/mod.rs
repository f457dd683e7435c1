//! Daemon client
//!
//! The `ContainerApi` trait is the seam between the create command and the
//! daemon; `DaemonClient` implements it over HTTP.

mod api;
mod transport;

pub use api::{ContainerApi, CreateResult, CREATE_PATH};
pub use transport::{DaemonClient, Endpoint};
