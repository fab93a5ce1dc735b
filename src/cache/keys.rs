//! Cache key definitions.
//!
//! `EntityKey` identifies a normalized record, `FieldKey` identifies one field
//! invocation on a record, and `DependencyKey` is what reads depend on and
//! writes touch.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

/// Key of the root query record.
pub const ROOT_QUERY: &str = "Query";
/// Key of the root mutation record. Root mutation fields are never stored.
pub const ROOT_MUTATION: &str = "Mutation";

/// Field arguments, kept sorted by name so serialization is canonical.
pub type Arguments = BTreeMap<String, Value>;

/// Identifies one normalized record: `Typename:id`, a root key, or an
/// embedded `parent.field` key for records without identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn query() -> Self {
        Self(ROOT_QUERY.to_string())
    }

    pub fn mutation() -> Self {
        Self(ROOT_MUTATION.to_string())
    }

    /// Key of an entity with stable identity.
    pub fn of(typename: &str, id: impl fmt::Display) -> Self {
        Self(format!("{typename}:{id}"))
    }

    /// Key of a record without identity, stored under its parent field.
    pub fn embedded(parent: &EntityKey, field: &FieldKey) -> Self {
        Self(format!("{}.{}", parent.0, field.as_str()))
    }

    /// Key of the `index`-th record of an embedded list.
    pub fn embedded_item(parent: &EntityKey, field: &FieldKey, index: usize) -> Self {
        Self(format!("{}.{}.{index}", parent.0, field.as_str()))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_QUERY || self.0 == ROOT_MUTATION
    }

    /// Typename encoded in an identity key (`Post` for `Post:7`).
    pub fn typename(&self) -> Option<&str> {
        if self.is_root() {
            return Some(&self.0);
        }
        let (typename, _) = self.0.split_once(':')?;
        typename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
            .then_some(typename)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one invocation of a field: `name` or `name({sorted json args})`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(String);

impl FieldKey {
    pub fn new(field_name: &str, arguments: &Arguments) -> Self {
        if arguments.is_empty() {
            return Self(field_name.to_string());
        }
        Self(format!("{field_name}({})", stringify_arguments(arguments)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical serialization of field arguments.
///
/// `Arguments` is ordered and `serde_json::Map` keeps nested keys sorted, so
/// two argument sets serialize identically exactly when they are equal.
pub fn stringify_arguments(arguments: &Arguments) -> String {
    serde_json::to_string(arguments).unwrap_or_default()
}

/// What a query read depends on and what a write touches.
///
/// Root fields are tracked per field name so that invalidating `posts` does
/// not mark a `me` query stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyKey {
    Entity(EntityKey),
    RootField { root: EntityKey, field_name: String },
}

impl DependencyKey {
    pub fn for_field(entity: &EntityKey, field_name: &str) -> Self {
        if entity.is_root() {
            Self::RootField {
                root: entity.clone(),
                field_name: field_name.to_string(),
            }
        } else {
            Self::Entity(entity.clone())
        }
    }
}

/// Identifies a watched operation.
pub type OperationKey = u64;

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
