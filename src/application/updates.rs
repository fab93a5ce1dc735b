//! Post-mutation cache updates.
//!
//! Each mutation kind maps to one handler that patches the normalized store
//! after the mutation result has been written. Handlers run once per
//! completed mutation, never retry, and turn every decode problem into a
//! logged no-op.

use std::time::Instant;

use forum_api_types::{DeletePostArgs, POST_TYPENAME, UserResponse, VoteArgs};
use metrics::{counter, histogram};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use crate::cache::{Arguments, Cache, EntityKey};
use crate::domain::types::{VoteValue, points_after_vote, recorded_vote};

use super::documents::{me_query, post_vote_fragment, post_vote_write_fragment};
use super::error::UpdateError;
use super::pagination::PaginationConfig;

const METRIC_INVALIDATION_TOTAL: &str = "forum_cache_invalidation_total";
const METRIC_UPDATE_MS: &str = "forum_cache_update_ms";

/// Mutations with a cache policy. Anything else is only normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Login,
    Register,
    ChangePassword,
    Logout,
    CreatePost,
    DeletePost,
    Vote,
}

impl MutationKind {
    pub const ALL: [MutationKind; 7] = [
        MutationKind::Login,
        MutationKind::Register,
        MutationKind::ChangePassword,
        MutationKind::Logout,
        MutationKind::CreatePost,
        MutationKind::DeletePost,
        MutationKind::Vote,
    ];

    pub fn from_field(field_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.field_name() == field_name)
    }

    pub fn field_name(self) -> &'static str {
        match self {
            MutationKind::Login => "login",
            MutationKind::Register => "register",
            MutationKind::ChangePassword => "changePassword",
            MutationKind::Logout => "logout",
            MutationKind::CreatePost => "createPost",
            MutationKind::DeletePost => "deletePost",
            MutationKind::Vote => "vote",
        }
    }
}

/// Dispatches completed mutations to their cache handlers.
#[derive(Debug, Clone)]
pub struct MutationUpdater {
    posts_field: String,
}

impl Default for MutationUpdater {
    fn default() -> Self {
        Self::new(&PaginationConfig::default())
    }
}

impl MutationUpdater {
    pub fn new(pagination: &PaginationConfig) -> Self {
        Self {
            posts_field: pagination.field.clone(),
        }
    }

    /// Run the handler for `kind` against the store.
    ///
    /// `payload` is the mutation field's result and `arguments` its bound
    /// arguments.
    #[instrument(skip(self, payload, arguments, cache), fields(mutation = kind.field_name()))]
    pub fn apply(
        &self,
        kind: MutationKind,
        payload: &Value,
        arguments: &Arguments,
        cache: &mut dyn Cache,
    ) {
        let started_at = Instant::now();
        let outcome = match kind {
            MutationKind::Login => {
                let outcome = update_session(kind, payload, cache);
                self.invalidate_all_posts(cache);
                outcome
            }
            MutationKind::Register | MutationKind::ChangePassword => {
                update_session(kind, payload, cache)
            }
            MutationKind::Logout => {
                clear_session(cache);
                Ok(())
            }
            MutationKind::CreatePost => {
                self.invalidate_all_posts(cache);
                Ok(())
            }
            MutationKind::DeletePost => evict_post(arguments, cache),
            MutationKind::Vote => apply_vote(arguments, cache),
        };

        if let Err(error) = outcome {
            warn!(
                mutation = kind.field_name(),
                error = %error,
                "Skipped cache update"
            );
        }

        histogram!(METRIC_UPDATE_MS, "mutation" => kind.field_name())
            .record(started_at.elapsed().as_secs_f64() * 1000.0);
    }

    /// Drop every cached page of the post list so the next read refetches.
    fn invalidate_all_posts(&self, cache: &mut dyn Cache) {
        let root = EntityKey::query();
        let pages: Vec<_> = cache
            .inspect_fields(&root)
            .into_iter()
            .filter(|info| info.field_name == self.posts_field)
            .collect();

        for page in &pages {
            cache.invalidate(&root, Some(&page.field_name), Some(&page.arguments));
        }

        info!(pages = pages.len(), "Invalidated post list");
        counter!(METRIC_INVALIDATION_TOTAL, "kind" => "posts_list").increment(1);
    }
}

fn decode_arguments<T: DeserializeOwned>(
    kind: MutationKind,
    arguments: &Arguments,
) -> Result<T, UpdateError> {
    let object: Map<String, Value> = arguments
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    serde_json::from_value(Value::Object(object))
        .map_err(|source| UpdateError::arguments(kind.field_name(), source))
}

fn update_session(
    kind: MutationKind,
    payload: &Value,
    cache: &mut dyn Cache,
) -> Result<(), UpdateError> {
    let response: UserResponse = serde_json::from_value(payload.clone())
        .map_err(|source| UpdateError::payload(kind.field_name(), source))?;

    let Some(user) = response.authenticated_user() else {
        debug!(mutation = kind.field_name(), "Session unchanged");
        return Ok(());
    };

    let me = json!({
        "me": {
            "__typename": user.typename,
            "id": user.id,
            "username": user.username,
        }
    });
    cache.update_query(&me_query(), &mut |_| Some(me.clone()));
    info!(user_id = user.id, mutation = kind.field_name(), "Session updated");
    Ok(())
}

fn clear_session(cache: &mut dyn Cache) {
    cache.update_query(&me_query(), &mut |_| Some(json!({ "me": null })));
    info!("Session cleared");
}

fn evict_post(arguments: &Arguments, cache: &mut dyn Cache) -> Result<(), UpdateError> {
    let args: DeletePostArgs = decode_arguments(MutationKind::DeletePost, arguments)?;
    let post = EntityKey::of(POST_TYPENAME, args.id);
    cache.invalidate(&post, None, None);

    info!(entity = %post, "Evicted post");
    counter!(METRIC_INVALIDATION_TOTAL, "kind" => "entity").increment(1);
    Ok(())
}

fn apply_vote(arguments: &Arguments, cache: &mut dyn Cache) -> Result<(), UpdateError> {
    const MUTATION: &str = "vote";

    let args: VoteArgs = decode_arguments(MutationKind::Vote, arguments)?;
    let vote = VoteValue::try_from(args.value)?;
    let post = EntityKey::of(POST_TYPENAME, args.post_id);

    let Some(cached) = cache.read_fragment(&post_vote_fragment(), &post) else {
        debug!(entity = %post, "Post not cached, vote not applied");
        return Ok(());
    };

    let points = cached
        .get("points")
        .and_then(Value::as_i64)
        .ok_or_else(|| UpdateError::cached(MUTATION, "points is not an integer"))?;
    let status = match cached.get("voteStatus") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_i64()
                .ok_or_else(|| UpdateError::cached(MUTATION, "voteStatus is not an integer"))?,
        ),
    };

    let Some(points) = points_after_vote(points, recorded_vote(status)?, vote) else {
        debug!(entity = %post, "Repeated or overflowing vote ignored");
        return Ok(());
    };

    let mut update = Map::new();
    update.insert("points".to_string(), Value::from(points));
    update.insert("voteStatus".to_string(), Value::from(vote.as_i64()));
    cache.write_fragment(&post_vote_write_fragment(), &post, &update);

    info!(entity = %post, points, vote = vote.as_i64(), "Applied vote");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::documents::{post_query, posts_query};
    use crate::cache::{CacheConfig, NormalizedStore, ReadOutcome, Resolvers};

    fn args(value: Value) -> Arguments {
        value
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn store_with_post(points: i64, vote_status: Value) -> NormalizedStore {
        let mut store = NormalizedStore::new(&CacheConfig::default());
        store.write_operation(
            &post_query(7),
            &json!({
                "post": {
                    "__typename": "Post",
                    "id": 7,
                    "createdAt": "1",
                    "updatedAt": "1",
                    "title": "hello",
                    "textSnippet": "hello",
                    "text": "hello world",
                    "points": points,
                    "voteStatus": vote_status,
                    "creator": { "__typename": "User", "id": 1, "username": "ann" }
                }
            }),
        );
        store
    }

    fn vote_state(store: &NormalizedStore) -> (i64, Value) {
        let data = store
            .read_fragment(&post_vote_fragment(), &EntityKey::of("Post", 7))
            .expect("post cached");
        (data["points"].as_i64().expect("points"), data["voteStatus"].clone())
    }

    fn me(store: &NormalizedStore) -> ReadOutcome {
        store.read_operation(&me_query(), &Resolvers::new()).outcome
    }

    fn vote(updater: &MutationUpdater, store: &mut NormalizedStore, value: i64) {
        updater.apply(
            MutationKind::Vote,
            &json!(true),
            &args(json!({ "postId": 7, "value": value })),
            store,
        );
    }

    #[test]
    fn from_field_covers_every_kind() {
        for kind in MutationKind::ALL {
            assert_eq!(MutationKind::from_field(kind.field_name()), Some(kind));
        }
        assert_eq!(MutationKind::from_field("updatePost"), None);
    }

    #[test]
    fn vote_is_idempotent() {
        let updater = MutationUpdater::default();
        let mut store = store_with_post(10, Value::Null);

        vote(&updater, &mut store, 1);
        assert_eq!(vote_state(&store), (11, json!(1)));

        vote(&updater, &mut store, 1);
        assert_eq!(vote_state(&store), (11, json!(1)));
    }

    #[test]
    fn vote_reversal_moves_by_two() {
        let updater = MutationUpdater::default();
        let mut store = store_with_post(10, Value::Null);

        vote(&updater, &mut store, 1);
        vote(&updater, &mut store, -1);
        assert_eq!(vote_state(&store), (9, json!(-1)));
    }

    #[test]
    fn vote_on_uncached_post_is_noop() {
        let updater = MutationUpdater::default();
        let mut store = NormalizedStore::new(&CacheConfig::default());
        vote(&updater, &mut store, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn vote_with_invalid_value_is_skipped() {
        let updater = MutationUpdater::default();
        let mut store = store_with_post(10, Value::Null);
        vote(&updater, &mut store, 3);
        assert_eq!(vote_state(&store), (10, Value::Null));
    }

    #[test]
    fn vote_leaves_other_fields_untouched() {
        let updater = MutationUpdater::default();
        let mut store = store_with_post(10, json!(0));
        vote(&updater, &mut store, -1);

        let data = store
            .read_operation(&post_query(7), &Resolvers::new())
            .outcome
            .into_data()
            .expect("post");
        assert_eq!(data["post"]["points"], 9);
        assert_eq!(data["post"]["title"], "hello");
    }

    #[test]
    fn login_success_sets_session() {
        let updater = MutationUpdater::default();
        let mut store = NormalizedStore::new(&CacheConfig::default());
        updater.apply(
            MutationKind::Login,
            &json!({ "errors": null, "user": { "__typename": "User", "id": 4, "username": "dee" } }),
            &Arguments::new(),
            &mut store,
        );

        let ReadOutcome::Complete(data) = me(&store) else {
            panic!("me should be cached");
        };
        assert_eq!(data["me"]["id"], 4);
        assert_eq!(data["me"]["username"], "dee");
    }

    #[test]
    fn failed_login_keeps_session() {
        let updater = MutationUpdater::default();
        let mut store = NormalizedStore::new(&CacheConfig::default());
        updater.apply(
            MutationKind::Login,
            &json!({ "errors": null, "user": { "__typename": "User", "id": 4, "username": "dee" } }),
            &Arguments::new(),
            &mut store,
        );
        updater.apply(
            MutationKind::Login,
            &json!({
                "errors": [{ "field": "password", "message": "incorrect password" }],
                "user": null
            }),
            &Arguments::new(),
            &mut store,
        );

        assert_eq!(
            me(&store),
            ReadOutcome::Complete(json!({
                "me": { "__typename": "User", "id": 4, "username": "dee" }
            }))
        );
    }

    #[test]
    fn logout_clears_session() {
        let updater = MutationUpdater::default();
        let mut store = NormalizedStore::new(&CacheConfig::default());
        updater.apply(
            MutationKind::Register,
            &json!({ "user": { "id": 2, "username": "bo" } }),
            &Arguments::new(),
            &mut store,
        );
        updater.apply(
            MutationKind::Logout,
            &json!(true),
            &Arguments::new(),
            &mut store,
        );

        assert_eq!(me(&store), ReadOutcome::Complete(json!({ "me": null })));
    }

    #[test]
    fn create_post_invalidates_every_page() {
        let updater = MutationUpdater::default();
        let mut store = NormalizedStore::new(&CacheConfig::default());
        let page = json!({
            "posts": { "__typename": "PaginatedPosts", "hasMore": true, "posts": [] }
        });
        store.write_operation(&posts_query(10, None), &page);
        store.write_operation(&posts_query(10, Some("5")), &page);
        store.write_operation(&me_query(), &json!({ "me": null }));

        updater.apply(
            MutationKind::CreatePost,
            &json!({ "__typename": "Post", "id": 9 }),
            &Arguments::new(),
            &mut store,
        );

        let remaining: Vec<String> = store
            .inspect_fields(&EntityKey::query())
            .into_iter()
            .map(|info| info.field_name)
            .collect();
        assert_eq!(remaining, ["me"]);
    }

    #[test]
    fn delete_post_evicts_entity() {
        let updater = MutationUpdater::default();
        let mut store = store_with_post(1, Value::Null);
        updater.apply(
            MutationKind::DeletePost,
            &json!(true),
            &args(json!({ "id": 7 })),
            &mut store,
        );
        assert!(!store.contains(&EntityKey::of("Post", 7)));
    }

    #[test]
    fn delete_post_with_malformed_arguments_is_noop() {
        let updater = MutationUpdater::default();
        let mut store = store_with_post(1, Value::Null);
        updater.apply(
            MutationKind::DeletePost,
            &json!(true),
            &args(json!({ "id": "seven" })),
            &mut store,
        );
        assert!(store.contains(&EntityKey::of("Post", 7)));
    }
}
