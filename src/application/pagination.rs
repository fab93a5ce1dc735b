//! Cursor pagination over per-invocation field storage.
//!
//! The store keeps every page of the post list as its own field invocation
//! (`posts({"cursor":null,"limit":10})`, `posts({"cursor":"..","limit":10})`).
//! The view assembled here concatenates all of them into one logical list,
//! so "load more" appends to what is already on screen.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::{
    Arguments, Cache, EntityKey, FieldKey, ResolveInfo, Resolved, Resolver, StoredValue,
    TYPENAME_FIELD,
};
use crate::config::PaginationSettings;

/// Names of the list field and of the fields on each page record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    pub field: String,
    pub items_field: String,
    pub has_more_field: String,
    pub view_typename: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            field: "posts".to_string(),
            items_field: "posts".to_string(),
            has_more_field: "hasMore".to_string(),
            view_typename: "PaginatedPosts".to_string(),
        }
    }
}

impl From<&PaginationSettings> for PaginationConfig {
    fn from(settings: &PaginationSettings) -> Self {
        Self {
            field: settings.field.clone(),
            items_field: settings.items_field.clone(),
            has_more_field: settings.has_more_field.clone(),
            view_typename: settings.view_typename.clone(),
        }
    }
}

/// The merged list. Never stored; recomputed on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedView {
    pub typename: String,
    pub items: Vec<Option<EntityKey>>,
    pub has_more: bool,
    /// The requested page itself is not in the store.
    pub partial: bool,
}

impl PaginatedView {
    pub fn into_resolved(self, config: &PaginationConfig) -> Resolved {
        let mut record = BTreeMap::new();
        record.insert(
            TYPENAME_FIELD.to_string(),
            Resolved::Value(Value::String(self.typename)),
        );
        record.insert(
            config.items_field.clone(),
            Resolved::Links(self.items),
        );
        record.insert(
            config.has_more_field.clone(),
            Resolved::Value(Value::Bool(self.has_more)),
        );
        Resolved::Record(record)
    }
}

struct Page {
    items: Option<Vec<Option<EntityKey>>>,
    has_more: bool,
}

fn read_page(cache: &dyn Cache, parent: &EntityKey, field_key: &FieldKey, config: &PaginationConfig) -> Page {
    let Some(page_key) = cache
        .resolve(parent, field_key)
        .and_then(|value| value.as_link().cloned())
    else {
        return Page {
            items: None,
            has_more: false,
        };
    };

    let no_arguments = Arguments::new();
    let items = cache
        .resolve(&page_key, &FieldKey::new(&config.items_field, &no_arguments))
        .and_then(|value| value.as_links().map(<[_]>::to_vec));
    let has_more = matches!(
        cache.resolve(&page_key, &FieldKey::new(&config.has_more_field, &no_arguments)),
        Some(StoredValue::Scalar(Value::Bool(true)))
    );
    Page { items, has_more }
}

/// Assemble the paginated view of `field_name` under `parent`.
///
/// Returns `None` when no page of the field is stored at all.
pub fn paginated_view(
    cache: &dyn Cache,
    parent: &EntityKey,
    field_name: &str,
    arguments: &Arguments,
    config: &PaginationConfig,
) -> Option<PaginatedView> {
    let invocations: Vec<_> = cache
        .inspect_fields(parent)
        .into_iter()
        .filter(|info| info.field_name == field_name)
        .collect();
    if invocations.is_empty() {
        return None;
    }

    let current = FieldKey::new(field_name, arguments);
    let partial = read_page(cache, parent, &current, config).items.is_none();

    let mut items = Vec::new();
    let mut has_more = true;
    for invocation in &invocations {
        let page = read_page(cache, parent, &invocation.field_key, config);
        items.extend(page.items.unwrap_or_default());
        has_more &= page.has_more;
    }

    Some(PaginatedView {
        typename: config.view_typename.clone(),
        items,
        has_more,
        partial,
    })
}

/// Read-path resolver for the list field.
#[derive(Debug, Clone, Default)]
pub struct CursorPagination {
    config: PaginationConfig,
}

impl CursorPagination {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }
}

impl Resolver for CursorPagination {
    fn resolve(
        &self,
        arguments: &Arguments,
        cache: &dyn Cache,
        info: &mut ResolveInfo<'_>,
    ) -> Option<Resolved> {
        let Some(view) = paginated_view(
            cache,
            info.parent_key,
            info.field_name,
            arguments,
            &self.config,
        ) else {
            debug!(
                parent = %info.parent_key,
                field = info.field_name,
                "no cached pages"
            );
            return None;
        };

        info.partial = view.partial;
        debug!(
            parent = %info.parent_key,
            field = info.field_name,
            items = view.items.len(),
            has_more = view.has_more,
            partial = view.partial,
            "assembled paginated view"
        );
        Some(view.into_resolved(&self.config))
    }
}
