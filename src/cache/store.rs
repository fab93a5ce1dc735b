//! Normalized record storage.
//!
//! `Cache` is the capability interface the cache policies are written
//! against. `NormalizedStore` is the in-memory implementation: records keyed
//! by entity identity, each holding its field invocations in insertion order.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use super::config::CacheConfig;
use super::document::{Field, Fragment, Operation, OperationKind, SelectionSet, TYPENAME_FIELD};
use super::keys::{Arguments, DependencyKey, EntityKey, FieldKey};
use super::resolve::{ResolveInfo, Resolved, Resolvers};

/// A stored field value.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Scalar(Value),
    Link(Option<EntityKey>),
    Links(Vec<Option<EntityKey>>),
}

impl StoredValue {
    pub fn as_link(&self) -> Option<&EntityKey> {
        match self {
            StoredValue::Link(Some(key)) => Some(key),
            _ => None,
        }
    }

    pub fn as_links(&self) -> Option<&[Option<EntityKey>]> {
        match self {
            StoredValue::Links(links) => Some(links),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            StoredValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        fn link(key: &Option<EntityKey>) -> Value {
            key.as_ref()
                .map_or(Value::Null, |key| Value::String(key.to_string()))
        }
        match self {
            StoredValue::Scalar(value) => value.clone(),
            StoredValue::Link(key) => link(key),
            StoredValue::Links(keys) => Value::Array(keys.iter().map(link).collect()),
        }
    }
}

/// One recorded field invocation of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub field_name: String,
    pub field_key: FieldKey,
    pub arguments: Arguments,
}

/// Primitive operations of a normalized cache.
pub trait Cache {
    /// Stored value of one field invocation.
    fn resolve(&self, entity: &EntityKey, field: &FieldKey) -> Option<StoredValue>;

    /// All field invocations stored on a record, in insertion order.
    fn inspect_fields(&self, entity: &EntityKey) -> Vec<FieldInfo>;

    /// Remove a whole record (`field_name == None`), every invocation of a
    /// field (`arguments == None`), or one invocation.
    fn invalidate(
        &mut self,
        entity: &EntityKey,
        field_name: Option<&str>,
        arguments: Option<&Arguments>,
    );

    /// Read a fragment from one entity; `None` unless every selected field
    /// is present.
    fn read_fragment(&self, fragment: &Fragment, entity: &EntityKey) -> Option<Map<String, Value>>;

    /// Write the fields of `data` selected by the fragment onto one entity,
    /// leaving every other field untouched.
    fn write_fragment(&mut self, fragment: &Fragment, entity: &EntityKey, data: &Map<String, Value>);

    /// Read a query, pass the data (or `None` on a miss) to `updater` and
    /// write back whatever it returns.
    fn update_query(
        &mut self,
        query: &Operation,
        updater: &mut dyn FnMut(Option<Value>) -> Option<Value>,
    );
}

/// Result of reading an operation from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// Fully answered from the store.
    Complete(Value),
    /// Answered, but a resolver flagged missing data.
    Partial(Value),
    Miss,
}

impl ReadOutcome {
    pub fn data(&self) -> Option<&Value> {
        match self {
            ReadOutcome::Complete(data) | ReadOutcome::Partial(data) => Some(data),
            ReadOutcome::Miss => None,
        }
    }

    pub fn into_data(self) -> Option<Value> {
        match self {
            ReadOutcome::Complete(data) | ReadOutcome::Partial(data) => Some(data),
            ReadOutcome::Miss => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadOutcome::Complete(_) => "hit",
            ReadOutcome::Partial(_) => "partial",
            ReadOutcome::Miss => "miss",
        }
    }
}

#[derive(Debug)]
pub struct ReadResult {
    pub outcome: ReadOutcome,
    pub dependencies: HashSet<DependencyKey>,
}

#[derive(Debug, Clone)]
struct FieldEntry {
    field_name: String,
    arguments: Arguments,
    value: StoredValue,
}

#[derive(Debug, Clone, Default)]
struct Record {
    fields: IndexMap<FieldKey, FieldEntry>,
}

struct ReadContext<'a> {
    resolvers: Option<&'a Resolvers>,
    partial: bool,
    dependencies: HashSet<DependencyKey>,
}

impl<'a> ReadContext<'a> {
    fn new(resolvers: Option<&'a Resolvers>) -> Self {
        Self {
            resolvers,
            partial: false,
            dependencies: HashSet::new(),
        }
    }
}

/// In-memory normalized store.
#[derive(Debug, Clone)]
pub struct NormalizedStore {
    embedded_typenames: HashSet<String>,
    records: IndexMap<EntityKey, Record>,
    touched: HashSet<DependencyKey>,
}

impl NormalizedStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            embedded_typenames: config.embedded_typenames.iter().cloned().collect(),
            records: IndexMap::new(),
            touched: HashSet::new(),
        }
    }

    pub fn contains(&self, entity: &EntityKey) -> bool {
        self.records.contains_key(entity)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drain the dependencies touched by writes and invalidations since the
    /// last call.
    pub fn take_touched(&mut self) -> HashSet<DependencyKey> {
        std::mem::take(&mut self.touched)
    }

    /// Normalize an operation result into the store.
    ///
    /// Query root fields are stored on `Query`; mutation root fields are not
    /// stored, but the entities they return are.
    pub fn write_operation(&mut self, operation: &Operation, data: &Value) {
        let Some(data) = data.as_object() else {
            return;
        };
        match operation.kind {
            OperationKind::Query => {
                self.write_selection(&EntityKey::query(), &operation.selection, data);
            }
            OperationKind::Mutation => {
                for field in operation.selection.iter() {
                    match (&field.selection, data.get(&field.name)) {
                        (Some(selection), Some(value)) => self.write_payload(selection, value),
                        _ => continue,
                    }
                }
            }
        }
    }

    /// Read a query through the registered resolvers.
    pub fn read_operation(&self, operation: &Operation, resolvers: &Resolvers) -> ReadResult {
        self.read_with(operation, Some(resolvers))
    }

    /// Export every record as JSON, keyed by entity and field key.
    pub fn snapshot(&self) -> Value {
        let records = self
            .records
            .iter()
            .map(|(key, record)| {
                let fields = record
                    .fields
                    .iter()
                    .map(|(field_key, entry)| (field_key.to_string(), entry.value.to_json()))
                    .collect::<Map<_, _>>();
                (key.to_string(), Value::Object(fields))
            })
            .collect::<Map<_, _>>();
        Value::Object(records)
    }

    fn read_with(&self, operation: &Operation, resolvers: Option<&Resolvers>) -> ReadResult {
        let mut ctx = ReadContext::new(resolvers);
        let root = match operation.kind {
            OperationKind::Query => EntityKey::query(),
            OperationKind::Mutation => EntityKey::mutation(),
        };
        let data = self.read_selection(&root, &operation.selection, &mut ctx);
        let outcome = match data {
            Some(data) if ctx.partial => ReadOutcome::Partial(Value::Object(data)),
            Some(data) => ReadOutcome::Complete(Value::Object(data)),
            None => ReadOutcome::Miss,
        };
        ReadResult {
            outcome,
            dependencies: ctx.dependencies,
        }
    }

    fn typename_of(&self, entity: &EntityKey) -> Option<String> {
        let stored = self
            .records
            .get(entity)
            .and_then(|record| record.fields.get(&FieldKey::new(TYPENAME_FIELD, &Arguments::new())))
            .and_then(|entry| entry.value.as_scalar())
            .and_then(Value::as_str);
        stored
            .or_else(|| entity.typename())
            .map(ToString::to_string)
    }

    fn key_of(&self, object: &Map<String, Value>) -> Option<EntityKey> {
        let typename = object.get(TYPENAME_FIELD)?.as_str()?;
        if self.embedded_typenames.contains(typename) {
            return None;
        }
        match object.get("id").or_else(|| object.get("_id"))? {
            Value::String(id) => Some(EntityKey::of(typename, id)),
            Value::Number(id) => Some(EntityKey::of(typename, id)),
            _ => None,
        }
    }

    fn write_selection(
        &mut self,
        entity: &EntityKey,
        selection: &SelectionSet,
        data: &Map<String, Value>,
    ) {
        for field in selection.iter() {
            let Some(value) = data.get(&field.name) else {
                continue;
            };
            let stored = self.normalize_field(entity, field, value);
            self.set_field(entity, field, stored);
        }
    }

    fn normalize_field(&mut self, parent: &EntityKey, field: &Field, value: &Value) -> StoredValue {
        let Some(selection) = &field.selection else {
            return StoredValue::Scalar(value.clone());
        };
        let field_key = field.key();
        match value {
            Value::Null => StoredValue::Link(None),
            Value::Array(items) => StoredValue::Links(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.normalize_object(item, selection, || {
                            EntityKey::embedded_item(parent, &field_key, index)
                        })
                    })
                    .collect(),
            ),
            Value::Object(_) => StoredValue::Link(self.normalize_object(value, selection, || {
                EntityKey::embedded(parent, &field_key)
            })),
            other => StoredValue::Scalar(other.clone()),
        }
    }

    fn normalize_object(
        &mut self,
        value: &Value,
        selection: &SelectionSet,
        embedded_key: impl FnOnce() -> EntityKey,
    ) -> Option<EntityKey> {
        let object = value.as_object()?;
        let key = self.key_of(object).unwrap_or_else(embedded_key);
        self.write_selection(&key, selection, object);
        Some(key)
    }

    /// Store the keyed entities inside a mutation payload. Objects without
    /// identity are walked but never become records.
    fn write_payload(&mut self, selection: &SelectionSet, value: &Value) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.write_payload(selection, item);
                }
            }
            Value::Object(object) => match self.key_of(object) {
                Some(key) => self.write_selection(&key, selection, object),
                None => {
                    for field in selection.iter() {
                        match (&field.selection, object.get(&field.name)) {
                            (Some(nested), Some(value)) => self.write_payload(nested, value),
                            _ => continue,
                        }
                    }
                }
            },
            _ => {}
        }
    }

    fn set_field(&mut self, entity: &EntityKey, field: &Field, value: StoredValue) {
        let record = self.records.entry(entity.clone()).or_default();
        let field_key = field.key();
        if let Some(existing) = record.fields.get_mut(&field_key) {
            if existing.value == value {
                return;
            }
            existing.value = value;
        } else {
            record.fields.insert(
                field_key,
                FieldEntry {
                    field_name: field.name.clone(),
                    arguments: field.arguments.clone(),
                    value,
                },
            );
        }
        self.touched
            .insert(DependencyKey::for_field(entity, &field.name));
    }

    fn read_selection(
        &self,
        entity: &EntityKey,
        selection: &SelectionSet,
        ctx: &mut ReadContext<'_>,
    ) -> Option<Map<String, Value>> {
        let typename = self.typename_of(entity);
        let mut data = Map::new();
        for field in selection.iter() {
            ctx.dependencies
                .insert(DependencyKey::for_field(entity, &field.name));

            if field.is_typename() {
                data.insert(field.name.clone(), Value::String(typename.clone()?));
                continue;
            }

            let resolver = ctx
                .resolvers
                .zip(typename.as_deref())
                .and_then(|(resolvers, typename)| resolvers.get(typename, &field.name));
            let resolved = match resolver {
                Some(resolver) => {
                    let mut info = ResolveInfo::new(entity, &field.name);
                    let resolved = resolver.resolve(&field.arguments, self, &mut info);
                    if info.partial {
                        ctx.partial = true;
                    }
                    resolved
                }
                None => self.resolve(entity, &field.key()).map(Resolved::from),
            };

            let value = self.complete_value(resolved?, field, ctx)?;
            data.insert(field.name.clone(), value);
        }
        Some(data)
    }

    fn complete_value(
        &self,
        resolved: Resolved,
        field: &Field,
        ctx: &mut ReadContext<'_>,
    ) -> Option<Value> {
        let Some(selection) = &field.selection else {
            return match resolved {
                Resolved::Value(value) => Some(value),
                _ => None,
            };
        };
        match resolved {
            Resolved::Value(Value::Null) | Resolved::Link(None) => Some(Value::Null),
            Resolved::Value(_) => None,
            Resolved::Link(Some(key)) => self
                .read_entity(&key, selection, ctx)
                .map(Value::Object),
            Resolved::Links(keys) => {
                let mut items = Vec::with_capacity(keys.len());
                for key in keys {
                    let Some(key) = key else {
                        items.push(Value::Null);
                        continue;
                    };
                    if !self.records.contains_key(&key) {
                        // Evicted entities drop out of lists instead of
                        // failing the whole read.
                        ctx.dependencies.insert(DependencyKey::Entity(key));
                        continue;
                    }
                    items.push(Value::Object(self.read_entity(&key, selection, ctx)?));
                }
                Some(Value::Array(items))
            }
            Resolved::Record(fields) => {
                let mut data = Map::new();
                for sub in selection.iter() {
                    let value = fields.get(&sub.name)?.clone();
                    data.insert(sub.name.clone(), self.complete_value(value, sub, ctx)?);
                }
                Some(Value::Object(data))
            }
        }
    }

    fn read_entity(
        &self,
        entity: &EntityKey,
        selection: &SelectionSet,
        ctx: &mut ReadContext<'_>,
    ) -> Option<Map<String, Value>> {
        if !self.records.contains_key(entity) {
            ctx.dependencies
                .insert(DependencyKey::Entity(entity.clone()));
            return None;
        }
        self.read_selection(entity, selection, ctx)
    }
}

impl Cache for NormalizedStore {
    fn resolve(&self, entity: &EntityKey, field: &FieldKey) -> Option<StoredValue> {
        self.records
            .get(entity)?
            .fields
            .get(field)
            .map(|entry| entry.value.clone())
    }

    fn inspect_fields(&self, entity: &EntityKey) -> Vec<FieldInfo> {
        self.records
            .get(entity)
            .map(|record| {
                record
                    .fields
                    .iter()
                    .map(|(field_key, entry)| FieldInfo {
                        field_name: entry.field_name.clone(),
                        field_key: field_key.clone(),
                        arguments: entry.arguments.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn invalidate(
        &mut self,
        entity: &EntityKey,
        field_name: Option<&str>,
        arguments: Option<&Arguments>,
    ) {
        let Some(field_name) = field_name else {
            if let Some(record) = self.records.shift_remove(entity) {
                debug!(entity = %entity, "evicted record");
                for entry in record.fields.values() {
                    self.touched
                        .insert(DependencyKey::for_field(entity, &entry.field_name));
                }
                self.touched
                    .insert(DependencyKey::Entity(entity.clone()));
            }
            return;
        };

        let Some(record) = self.records.get_mut(entity) else {
            return;
        };
        let removed = match arguments {
            Some(arguments) => record
                .fields
                .shift_remove(&FieldKey::new(field_name, arguments))
                .is_some(),
            None => {
                let before = record.fields.len();
                record
                    .fields
                    .retain(|_, entry| entry.field_name != field_name);
                record.fields.len() != before
            }
        };
        if removed {
            debug!(entity = %entity, field = field_name, "invalidated field");
            self.touched
                .insert(DependencyKey::for_field(entity, field_name));
        }
    }

    fn read_fragment(&self, fragment: &Fragment, entity: &EntityKey) -> Option<Map<String, Value>> {
        let mut ctx = ReadContext::new(None);
        self.read_entity(entity, &fragment.selection, &mut ctx)
    }

    fn write_fragment(&mut self, fragment: &Fragment, entity: &EntityKey, data: &Map<String, Value>) {
        self.write_selection(entity, &fragment.selection, data);
    }

    fn update_query(
        &mut self,
        query: &Operation,
        updater: &mut dyn FnMut(Option<Value>) -> Option<Value>,
    ) {
        let current = self.read_with(query, None).outcome.into_data();
        if let Some(next) = updater(current) {
            self.write_operation(query, &next);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store() -> NormalizedStore {
        NormalizedStore::new(&CacheConfig::default())
    }

    fn user_fields() -> Vec<Field> {
        vec![
            Field::scalar(TYPENAME_FIELD),
            Field::scalar("id"),
            Field::scalar("username"),
        ]
    }

    fn me_query() -> Operation {
        Operation::query("Me", [Field::object("me", user_fields())])
    }

    fn login_mutation(username: &str, password: &str) -> Operation {
        Operation::mutation(
            "Login",
            [Field::object(
                "login",
                [
                    Field::object("errors", [Field::scalar("field"), Field::scalar("message")]),
                    Field::object("user", user_fields()),
                ],
            )
            .arg("usernameOrEmail", username)
            .arg("password", password)],
        )
    }

    fn post_query(id: i64) -> Operation {
        Operation::query(
            "Post",
            [Field::object(
                "post",
                [
                    Field::scalar(TYPENAME_FIELD),
                    Field::scalar("id"),
                    Field::scalar("title"),
                    Field::scalar("points"),
                    Field::object("creator", user_fields()),
                ],
            )
            .arg("id", id)],
        )
    }

    fn post_data(id: i64, title: &str) -> Value {
        json!({
            "post": {
                "__typename": "Post",
                "id": id,
                "title": title,
                "points": 0,
                "creator": { "__typename": "User", "id": 1, "username": "ann" }
            }
        })
    }

    #[test]
    fn write_then_read_normalizes_entities() {
        let mut store = store();
        store.write_operation(&post_query(7), &post_data(7, "hello"));

        assert!(store.contains(&EntityKey::of("Post", 7)));
        assert!(store.contains(&EntityKey::of("User", 1)));

        let link = store
            .resolve(&EntityKey::query(), &post_query(7).selection.fields[0].key())
            .expect("root link");
        assert_eq!(link.as_link(), Some(&EntityKey::of("Post", 7)));

        let read = store.read_operation(&post_query(7), &Resolvers::new());
        assert_eq!(read.outcome, ReadOutcome::Complete(post_data(7, "hello")));
        assert!(read
            .dependencies
            .contains(&DependencyKey::Entity(EntityKey::of("User", 1))));
    }

    #[test]
    fn shared_entities_are_updated_in_place() {
        let mut store = store();
        store.write_operation(&post_query(7), &post_data(7, "hello"));
        store.write_operation(&post_query(8), &post_data(8, "other"));

        let mut renamed = post_data(8, "other");
        renamed["post"]["creator"]["username"] = json!("annie");
        store.write_operation(&post_query(8), &renamed);

        let read = store
            .read_operation(&post_query(7), &Resolvers::new())
            .outcome
            .into_data()
            .expect("post 7");
        assert_eq!(read["post"]["creator"]["username"], "annie");
    }

    #[test]
    fn missing_field_is_a_miss() {
        let mut store = store();
        store.write_operation(&me_query(), &json!({ "me": { "__typename": "User", "id": 1 } }));

        let read = store.read_operation(&me_query(), &Resolvers::new());
        assert_eq!(read.outcome, ReadOutcome::Miss);
    }

    #[test]
    fn inspect_fields_keeps_insertion_order() {
        let mut store = store();
        store.write_operation(&post_query(9), &post_data(9, "b"));
        store.write_operation(&post_query(3), &post_data(3, "a"));
        store.write_operation(&post_query(9), &post_data(9, "b2"));

        let keys: Vec<String> = store
            .inspect_fields(&EntityKey::query())
            .into_iter()
            .map(|info| info.field_key.to_string())
            .collect();
        assert_eq!(keys, vec![r#"post({"id":9})"#, r#"post({"id":3})"#]);
    }

    #[test]
    fn invalidate_single_invocation_and_all_invocations() {
        let mut store = store();
        store.write_operation(&post_query(1), &post_data(1, "a"));
        store.write_operation(&post_query(2), &post_data(2, "b"));
        store.take_touched();

        let mut arguments = Arguments::new();
        arguments.insert("id".to_string(), json!(1));
        store.invalidate(&EntityKey::query(), Some("post"), Some(&arguments));
        assert_eq!(store.inspect_fields(&EntityKey::query()).len(), 1);

        store.invalidate(&EntityKey::query(), Some("post"), None);
        assert!(store.inspect_fields(&EntityKey::query()).is_empty());

        let touched = store.take_touched();
        assert!(touched.contains(&DependencyKey::for_field(&EntityKey::query(), "post")));
    }

    #[test]
    fn evicting_an_entity_removes_it() {
        let mut store = store();
        store.write_operation(&post_query(1), &post_data(1, "a"));
        store.take_touched();

        store.invalidate(&EntityKey::of("Post", 1), None, None);

        assert!(!store.contains(&EntityKey::of("Post", 1)));
        assert!(store
            .take_touched()
            .contains(&DependencyKey::Entity(EntityKey::of("Post", 1))));
        assert_eq!(
            store.read_operation(&post_query(1), &Resolvers::new()).outcome,
            ReadOutcome::Miss
        );
    }

    #[test]
    fn fragments_read_and_write_only_selected_fields() {
        let mut store = store();
        store.write_operation(&post_query(1), &post_data(1, "a"));
        let post = EntityKey::of("Post", 1);

        let fragment = Fragment::new("PostPoints", "Post", [Field::scalar("points")]);
        let data = store.read_fragment(&fragment, &post).expect("fragment");
        assert_eq!(data["points"], 0);

        let mut update = Map::new();
        update.insert("points".to_string(), json!(5));
        update.insert("title".to_string(), json!("ignored"));
        store.write_fragment(&fragment, &post, &update);

        let read = store
            .read_operation(&post_query(1), &Resolvers::new())
            .outcome
            .into_data()
            .expect("post");
        assert_eq!(read["post"]["points"], 5);
        assert_eq!(read["post"]["title"], "a");

        let missing = Fragment::new("PostVote", "Post", [Field::scalar("voteStatus")]);
        assert!(store.read_fragment(&missing, &post).is_none());
        assert!(store
            .read_fragment(&fragment, &EntityKey::of("Post", 99))
            .is_none());
    }

    #[test]
    fn update_query_writes_updater_result() {
        let mut store = store();
        store.update_query(&me_query(), &mut |current| {
            assert!(current.is_none());
            Some(json!({ "me": null }))
        });
        assert_eq!(
            store.read_operation(&me_query(), &Resolvers::new()).outcome,
            ReadOutcome::Complete(json!({ "me": null }))
        );

        store.update_query(&me_query(), &mut |_| {
            Some(json!({ "me": { "__typename": "User", "id": 2, "username": "bo" } }))
        });
        let data = store
            .read_operation(&me_query(), &Resolvers::new())
            .outcome
            .into_data()
            .expect("me");
        assert_eq!(data["me"]["username"], "bo");

        store.take_touched();
        store.update_query(&me_query(), &mut |current| current);
        assert!(store.take_touched().is_empty());
    }

    #[test]
    fn mutation_root_fields_are_not_stored() {
        let mut store = store();
        let mutation = Operation::mutation(
            "CreatePost",
            [Field::object(
                "createPost",
                [Field::scalar(TYPENAME_FIELD), Field::scalar("id"), Field::scalar("title")],
            )],
        );
        store.write_operation(
            &mutation,
            &json!({ "createPost": { "__typename": "Post", "id": 4, "title": "new" } }),
        );

        assert!(store.contains(&EntityKey::of("Post", 4)));
        assert!(!store.contains(&EntityKey::mutation()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn login_payloads_leave_only_the_user_record() {
        let mut store = store();
        let payload = json!({
            "login": {
                "errors": null,
                "user": { "__typename": "User", "id": 1, "username": "ann" }
            }
        });
        for attempt in 0..3 {
            store.write_operation(&login_mutation("ann", &format!("hunter{attempt}")), &payload);
        }

        assert_eq!(store.len(), 1);
        assert!(store.contains(&EntityKey::of("User", 1)));
        let snapshot = store.snapshot().to_string();
        assert!(!snapshot.contains("hunter"));
    }

    #[test]
    fn failed_login_payload_stores_nothing() {
        let mut store = store();
        store.write_operation(
            &login_mutation("ann", "wrong"),
            &json!({
                "login": {
                    "errors": [{ "field": "password", "message": "incorrect password" }],
                    "user": null
                }
            }),
        );
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_lists_links_as_keys() {
        let mut store = store();
        store.write_operation(&me_query(), &json!({ "me": { "__typename": "User", "id": 1, "username": "ann" } }));
        let snapshot = store.snapshot();
        assert_eq!(snapshot["Query"]["me"], "User:1");
        assert_eq!(snapshot["User:1"]["username"], "ann");
    }
}
