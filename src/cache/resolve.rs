//! Read-path resolvers.
//!
//! A resolver replaces the plain stored value of one field while a query is
//! read from the store. It may synthesize records that never exist in the
//! store, such as a paginated view assembled from several invocations.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use super::keys::{Arguments, EntityKey};
use super::store::{Cache, StoredValue};

/// A value produced on the read path.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Value(Value),
    Link(Option<EntityKey>),
    Links(Vec<Option<EntityKey>>),
    /// A record with no identity, read field by field and never stored.
    Record(BTreeMap<String, Resolved>),
}

impl From<StoredValue> for Resolved {
    fn from(value: StoredValue) -> Self {
        match value {
            StoredValue::Scalar(value) => Resolved::Value(value),
            StoredValue::Link(link) => Resolved::Link(link),
            StoredValue::Links(links) => Resolved::Links(links),
        }
    }
}

/// Per-field context handed to a resolver.
#[derive(Debug)]
pub struct ResolveInfo<'a> {
    pub parent_key: &'a EntityKey,
    pub field_name: &'a str,
    /// Set when the returned data is not fully backed by the store, so the
    /// caller still goes to the network.
    pub partial: bool,
}

impl<'a> ResolveInfo<'a> {
    pub fn new(parent_key: &'a EntityKey, field_name: &'a str) -> Self {
        Self {
            parent_key,
            field_name,
            partial: false,
        }
    }
}

pub trait Resolver: Send + Sync {
    /// Resolve one field, or `None` when the store cannot answer it.
    fn resolve(
        &self,
        arguments: &Arguments,
        cache: &dyn Cache,
        info: &mut ResolveInfo<'_>,
    ) -> Option<Resolved>;
}

/// Resolvers keyed by parent typename and field name.
#[derive(Clone, Default)]
pub struct Resolvers {
    by_field: HashMap<(String, String), Arc<dyn Resolver>>,
}

impl Resolvers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        typename: impl Into<String>,
        field_name: impl Into<String>,
        resolver: Arc<dyn Resolver>,
    ) {
        self.by_field
            .insert((typename.into(), field_name.into()), resolver);
    }

    pub fn get(&self, typename: &str, field_name: &str) -> Option<&dyn Resolver> {
        self.by_field
            .get(&(typename.to_string(), field_name.to_string()))
            .map(|resolver| resolver.as_ref())
    }

    pub fn len(&self) -> usize {
        self.by_field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }
}
