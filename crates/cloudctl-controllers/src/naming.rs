//! Deterministic names for derived objects.
//!
//! A child name is `<prefix>-<hash>` where the prefix is the sanitized
//! `<parent name>-<role>` cut to fit the bound, and the hash is the FNV-1a
//! 32-bit hash of `<kind>/<namespace>/<name>#<role>` as 8 lowercase hex
//! digits. Two different (parent, role) pairs can share a prefix after
//! truncation but not a canonical encoding, so the hash keeps them apart.

use cloudctl_core::ObjectKey;

/// Bound on object names (DNS label).
pub const MAX_NAME_LEN: usize = 63;

/// Bound on cloud project identifiers.
pub const MAX_PROJECT_ID_LEN: usize = 30;

const HASH_LEN: usize = 8;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

pub fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

pub fn canonical(parent: &ObjectKey, role: &str) -> String {
    format!("{}#{role}", parent)
}

/// Child object name bounded to [`MAX_NAME_LEN`].
pub fn child_name(parent: &ObjectKey, role: &str) -> String {
    child_name_bounded(parent, role, MAX_NAME_LEN)
}

/// Cloud project identifier bounded to [`MAX_PROJECT_ID_LEN`].
pub fn project_id(parent: &ObjectKey, role: &str) -> String {
    child_name_bounded(parent, role, MAX_PROJECT_ID_LEN)
}

pub fn child_name_bounded(parent: &ObjectKey, role: &str, max_len: usize) -> String {
    let hash = fnv1a32(canonical(parent, role).as_bytes());
    let budget = max_len.saturating_sub(HASH_LEN + 1);

    let mut prefix = sanitize(&format!("{}-{role}", parent.name));
    prefix.truncate(budget);
    let prefix = prefix.trim_end_matches('-');

    if prefix.is_empty() {
        format!("{hash:08x}")
    } else {
        format!("{prefix}-{hash:08x}")
    }
}

/// Lowercase alphanumerics, with every other run of characters collapsed to
/// a single `-` and no leading `-`.
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out
}

/// Role tags used by the controllers.
pub mod roles {
    pub const CLAIMS_APPLICATION: &str = "claims";
    pub const NONPROD: &str = "nonprod";
    pub const PROD: &str = "prod";

    pub fn permission(principal: &str) -> String {
        format!("iamp:{principal}")
    }

    pub fn elevated(principal: &str) -> String {
        format!("elevated:{principal}")
    }

    pub fn claim(claim: &str) -> String {
        format!("claim:{claim}")
    }
}
