//! Cache configuration.
//!
//! Controls how the normalized store keys records. Typenames listed as
//! embedded are never normalized by identity and are stored under their
//! parent field instead.

use serde::Deserialize;

const DEFAULT_EMBEDDED_TYPENAMES: &[&str] = &["PaginatedPosts"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Typenames stored without identity.
    pub embedded_typenames: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            embedded_typenames: DEFAULT_EMBEDDED_TYPENAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl CacheConfig {
    pub fn embedding(typenames: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            embedded_typenames: typenames.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_embedded(&self, typename: &str) -> bool {
        self.embedded_typenames.iter().any(|name| name == typename)
    }
}
