//! Daemon API surface used by the CLI

use crate::container::ContainerSpec;
use crate::error::Result;
use serde::{Deserialize, Deserializer};
use std::future::Future;

/// Path of the create endpoint
pub const CREATE_PATH: &str = "/containers/create";

/// Reply to a successful create
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateResult {
    /// Container ID assigned by the daemon
    pub id: String,
    /// Resolved container name; empty when the daemon did not report one
    #[serde(default)]
    pub name: String,
    /// Non-fatal diagnostics, in daemon order
    #[serde(default, deserialize_with = "nullable_list")]
    pub warnings: Vec<String>,
}

/// Daemons built on the Docker API send `"Warnings": null` when empty
fn nullable_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Container operations offered by the daemon
pub trait ContainerApi {
    /// Submit one creation request. `name` is empty to let the daemon pick
    /// one. Exactly one exchange; never retried.
    fn create_container(
        &self,
        spec: ContainerSpec,
        name: &str,
    ) -> impl Future<Output = Result<CreateResult>> + Send;
}
