use std::collections::HashMap;

use crate::config::DEFAULT_OWNER_ID;

/// Metadata keys that name an owner, highest priority first.
/// S3 exposes `x-amz-meta-userid` as `userid`.
pub const OWNER_METADATA_KEYS: [&str; 3] = ["userid", "user", "owner"];

/// Picks the partition owner for an ingested object
#[derive(Debug, Clone)]
pub struct OwnerResolver {
    default_owner: String,
}

impl Default for OwnerResolver {
    fn default() -> Self {
        Self::new(DEFAULT_OWNER_ID)
    }
}

impl OwnerResolver {
    pub fn new<S: Into<String>>(default_owner: S) -> Self {
        Self {
            default_owner: default_owner.into(),
        }
    }

    pub fn default_owner(&self) -> &str {
        &self.default_owner
    }

    /// First non-empty value among [`OWNER_METADATA_KEYS`], else the default.
    pub fn resolve(&self, metadata: &HashMap<String, String>) -> String {
        OWNER_METADATA_KEYS
            .iter()
            .find_map(|wanted| lookup(metadata, wanted))
            .unwrap_or_else(|| self.default_owner.clone())
    }
}

/// Exact-case key first, then any other casing; blank values never win.
fn lookup(metadata: &HashMap<String, String>, wanted: &str) -> Option<String> {
    let exact = metadata.get(wanted).map(|value| value.trim());
    exact
        .into_iter()
        .chain(
            metadata
                .iter()
                .filter(|(key, _)| key.as_str() != wanted && key.eq_ignore_ascii_case(wanted))
                .map(|(_, value)| value.trim()),
        )
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
