//! Versioned alias resolution
//!
//! A logical index name such as `metadata` can be served through an alias
//! pointing at a concrete, versioned index (`metadata_v1`, `metadata_v2`, ...).
//! Given the current index listing, [`resolve_alias_target`] decides which
//! concrete index the alias should point at, or that a first version has to
//! be created. [`latest_version`] is the version scan on its own, for callers
//! that have already ruled out versioned and concrete names.

use tracing::debug;

/// Marker separating a logical name from its version number
pub const VERSION_MARKER: &str = "_v";

/// Outcome of resolving a logical name against the cluster's indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasResolution {
    /// The name is itself a concrete index; nothing to do
    Concrete,
    /// The name already carries a version marker and is never aliased
    Disabled,
    /// The alias should point at `target`, created first if `needs_create`
    Target { target: String, needs_create: bool },
}

/// Versioned index an alias should point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    pub target: String,
    /// No version exists yet; `target` is the first one to create
    pub needs_create: bool,
}

impl From<AliasTarget> for AliasResolution {
    fn from(t: AliasTarget) -> Self {
        AliasResolution::Target {
            target: t.target,
            needs_create: t.needs_create,
        }
    }
}

/// Whether a name carries the version marker anywhere
pub fn is_versioned(name: &str) -> bool {
    name.contains(VERSION_MARKER)
}

/// Concrete index name for a given version
pub fn versioned_name(logical: &str, version: u32) -> String {
    format!("{}{}{}", logical, VERSION_MARKER, version)
}

/// Parse the version suffix of `index` relative to `logical`
///
/// Returns `None` when the index does not belong to `logical` at all, and
/// `Some(-1)` when it has the prefix but the suffix is not a number.
pub fn parse_version(logical: &str, index: &str) -> Option<i64> {
    let suffix = index
        .strip_prefix(logical)?
        .strip_prefix(VERSION_MARKER)?;
    match suffix.parse::<u32>() {
        Ok(version) => Some(i64::from(version)),
        Err(_) => {
            debug!(index = %index, "Ignoring index with malformed version suffix");
            Some(-1)
        }
    }
}

/// Pick the alias target for `logical` from the listed indices
pub fn resolve_alias_target<I, S>(logical: &str, existing: I) -> AliasResolution
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if is_versioned(logical) {
        return AliasResolution::Disabled;
    }

    let names: Vec<String> = existing
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    if names.iter().any(|n| n == logical) {
        return AliasResolution::Concrete;
    }
    latest_version(logical, names).into()
}

/// Highest-numbered `<logical>_v<N>` in the listing, or `<logical>_v1` to create
///
/// Names are compared in sorted order and the last of equal versions wins,
/// so the result does not depend on listing order.
pub fn latest_version<I, S>(logical: &str, existing: I) -> AliasTarget
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = existing
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    names.sort();

    let mut best: Option<(i64, String)> = None;
    for name in names {
        let Some(version) = parse_version(logical, &name) else {
            continue;
        };
        // Malformed suffixes never win
        if version < 0 {
            continue;
        }
        if best.as_ref().map_or(true, |(v, _)| version >= *v) {
            best = Some((version, name));
        }
    }

    match best {
        Some((_, target)) => AliasTarget {
            target,
            needs_create: false,
        },
        None => AliasTarget {
            target: versioned_name(logical, 1),
            needs_create: true,
        },
    }
}
