//! Portal registry. Loads all portal definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/portal/portals/` is baked into the binary
//! at compile time via [`include_str!`]. Definitions kept outside the binary
//! can be loaded with [`load_portal_file`].

use std::path::Path;

use crate::PortalError;
use crate::portal_def::{PortalDefinition, parse_portal_toml};

/// TOML configs embedded at compile time.
const PORTAL_TOMLS: &[(&str, &str)] = &[
    (
        "delhi_high_court",
        include_str!("../portals/delhi_high_court.toml"),
    ),
    (
        "delhi_high_court_main",
        include_str!("../portals/delhi_high_court_main.toml"),
    ),
];

/// Total number of configured portals (used in tests).
#[cfg(test)]
const EXPECTED_PORTAL_COUNT: usize = 2;

/// Returns all configured portal definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_portals() -> Vec<PortalDefinition> {
    PORTAL_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_portal_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up an embedded portal by id.
///
/// # Errors
///
/// Returns [`PortalError::UnknownPortal`] if no embedded portal has that id.
pub fn portal_by_id(id: &str) -> Result<PortalDefinition, PortalError> {
    all_portals()
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| PortalError::UnknownPortal(id.to_owned()))
}

/// Loads a portal definition from a TOML file on disk.
///
/// # Errors
///
/// Returns [`PortalError::Io`] if the file cannot be read, or
/// [`PortalError::Config`] if it is not a valid definition.
pub async fn load_portal_file(path: &Path) -> Result<PortalDefinition, PortalError> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_portal_toml(&contents)
        .map_err(|e| PortalError::Config(format!("{}: {e}", path.display())))
}
