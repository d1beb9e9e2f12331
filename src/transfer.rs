//! Bulk file transfer via the external `globus` CLI
//!
//! Raw iCESM archives live on NCAR Campaign Storage and are staged to local
//! scratch with Globus. This module shells out to the `globus` CLI behind a
//! narrow fetch interface; authentication (`globus login`) and retries are
//! the CLI's business. A failed invocation surfaces as a transfer error.

use crate::errors::{PaleovarError, Result};
use std::process::Command;

/// Display name and owner used to look up a Globus endpoint ID.
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub display_name: String,
    pub owner_id: String,
}

impl EndpointSpec {
    pub fn new(display_name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            owner_id: owner_id.into(),
        }
    }

    /// NCAR Campaign Storage, where iCESM time-series archives live.
    pub fn ncar_campaign() -> Self {
        Self::new("NCAR Campaign Storage", "ncar@globusid.org")
    }
}

/// Resolve an endpoint display name to its Globus endpoint ID.
pub fn resolve_endpoint(spec: &EndpointSpec) -> Result<String> {
    let output = Command::new("globus")
        .args([
            "endpoint",
            "search",
            &spec.display_name,
            "--filter-owner-id",
            &spec.owner_id,
            "--jq",
            "DATA[0].id",
            "--format",
            "UNIX",
        ])
        .output()?;

    if !output.status.success() {
        return Err(PaleovarError::TransferError(format!(
            "endpoint search for '{}' failed: {}",
            spec.display_name,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if id.is_empty() || id == "None" {
        return Err(PaleovarError::TransferError(format!(
            "could not resolve endpoint '{}' owned by '{}'",
            spec.display_name, spec.owner_id
        )));
    }
    Ok(id)
}

/// Submit a recursive directory transfer from `from_dir` on the remote
/// endpoint to `to_dir` on the local endpoint.
///
/// Sync level `mtime` makes re-runs cheap: files already staged with a
/// matching modification time are skipped by Globus.
pub fn fetch(
    remote: &EndpointSpec,
    local: &EndpointSpec,
    from_dir: &str,
    to_dir: &str,
) -> Result<()> {
    let remote_id = resolve_endpoint(remote)?;
    let local_id = resolve_endpoint(local)?;

    println!("🚀 Submitting transfer {} -> {}", from_dir, to_dir);
    let status = Command::new("globus")
        .args([
            "transfer",
            "--recursive",
            "--sync-level",
            "mtime",
            &format!("{}:{}", remote_id, from_dir),
            &format!("{}:{}", local_id, to_dir),
            "--jq",
            "task_id",
            "--format",
            "UNIX",
        ])
        .status()?;

    if !status.success() {
        return Err(PaleovarError::TransferError(format!(
            "globus transfer exited with status {}",
            status
        )));
    }
    Ok(())
}
