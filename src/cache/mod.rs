//! Normalized GraphQL cache.
//!
//! - **Store**: entity records keyed by `Typename:id`, each field invocation
//!   keyed by its canonical arguments
//! - **Resolvers**: read-path hooks that may synthesize records
//! - **Registry**: which watched operations depend on which records
//!
//! ## Configuration
//!
//! ```toml
//! [pagination]
//! view_typename = "PaginatedPosts"
//! ```

mod config;
mod document;
mod keys;
mod lock;
mod registry;
mod resolve;
mod store;

pub use config::CacheConfig;
pub use document::{Field, Fragment, Operation, OperationKind, SelectionSet, TYPENAME_FIELD};
pub use keys::{
    Arguments, DependencyKey, EntityKey, FieldKey, OperationKey, ROOT_MUTATION, ROOT_QUERY,
    hash_value, stringify_arguments,
};
pub(crate) use lock::mutex_lock;
pub use registry::OperationRegistry;
pub use resolve::{ResolveInfo, Resolved, Resolver, Resolvers};
pub use store::{Cache, FieldInfo, NormalizedStore, ReadOutcome, ReadResult, StoredValue};
