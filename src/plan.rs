//! Update planning for a single hook's declared dependencies.

use crate::edit::{LocatedPin, PinEdit};
use crate::resolver::{ResolveError, VersionSource};
use crate::yaml::HookConfig;

/// The exact-pin separator. Dependency strings without it are inert.
pub const PIN_SEPARATOR: &str = "==";

/// Splits `name==version` at the FIRST separator.
///
/// Returns `None` for strings that are not exact pins; those are never
/// candidates for editing.
pub fn split_pin(value: &str) -> Option<(&str, &str)> {
    value.split_once(PIN_SEPARATOR)
}

/// Plans edits for one hook.
///
/// Each pinned dependency whose resolved version differs from the pinned one
/// produces a [`PinEdit`] at the pin's recorded location; up-to-date pins
/// and non-pins produce nothing. Resolution failures propagate: a pin whose
/// package cannot be resolved aborts the run rather than being silently kept
/// stale.
pub fn plan_hook(
    hook: &HookConfig,
    versions: &dyn VersionSource,
) -> Result<Vec<PinEdit>, ResolveError> {
    let mut edits = Vec::new();
    for dependency in &hook.additional_dependencies {
        if let Some(edit) = plan_pin(dependency, versions)? {
            edits.push(edit);
        }
    }
    Ok(edits)
}

fn plan_pin(
    pin: &LocatedPin,
    versions: &dyn VersionSource,
) -> Result<Option<PinEdit>, ResolveError> {
    let Some((name, old_version)) = split_pin(&pin.value) else {
        return Ok(None);
    };

    let new_version = versions.lookup(name)?;
    if new_version == old_version {
        return Ok(None);
    }

    Ok(Some(PinEdit {
        old: pin.clone(),
        new_value: format!("{name}{PIN_SEPARATOR}{new_version}"),
    }))
}
