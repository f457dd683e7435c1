//! `pouch create`

use crate::client::{ContainerApi, CreateResult};
use crate::container::{build_spec, CreateFlags};
use crate::error::{PouchError, Result};
use std::io::Write;
use tracing::{debug, info, warn};

/// Build the spec from `flags` and `args`, submit it once, and report the
/// outcome on `out`.
///
/// Input errors are returned before the daemon is contacted, and a client
/// configuration error from `api` is returned as is. Any other failure is
/// wrapped as `failed to create container: ...` and nothing is written.
pub async fn run_create<A, W>(
    api: &A,
    flags: &CreateFlags,
    args: &[String],
    out: &mut W,
) -> Result<CreateResult>
where
    A: ContainerApi,
    W: Write,
{
    let spec = build_spec(flags, args)?;

    let mut result = api
        .create_container(spec, &flags.name)
        .await
        .map_err(|e| {
            if e.is_input_error() {
                e
            } else {
                PouchError::CreateContainer(Box::new(e))
            }
        })?;

    if result.name.is_empty() {
        result.name = flags.name.clone();
    }

    if let Err(e) = print_result(&result, out) {
        warn!(
            id = %result.id,
            name = %result.name,
            error = %e,
            "container created but result could not be written"
        );
        return Err(e);
    }
    info!(id = %result.id, name = %result.name, "container created");
    Ok(result)
}

/// Warnings first, one per line, then the ID line
pub fn print_result<W: Write>(result: &CreateResult, out: &mut W) -> Result<()> {
    for warning in &result.warnings {
        debug!(%warning, "daemon warning");
        writeln!(out, "WARNING: {}", warning)?;
    }
    writeln!(out, "container ID: {}, name: {}", result.id, result.name)?;
    out.flush()?;
    Ok(())
}
