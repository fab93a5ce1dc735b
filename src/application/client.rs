//! Cache-first GraphQL client.
//!
//! Wires the normalized store, the read-path resolvers, the mutation
//! updater and the session guard around an external transport.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use crate::cache::{
    CacheConfig, DependencyKey, NormalizedStore, Operation, OperationKey, OperationKind,
    OperationRegistry, ReadOutcome, Resolvers, mutex_lock,
};
use crate::config::{GuardSettings, Settings};

use super::error::ClientError;
use super::guard::{ExecutionContext, GuardVerdict, Navigator, SessionGuard, fetch_options};
use super::pagination::{CursorPagination, PaginationConfig};
use super::transport::{OperationError, OperationRequest, OperationResult, Transport};
use super::updates::{MutationKind, MutationUpdater};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";

const METRIC_READ_TOTAL: &str = "forum_cache_read_total";
const SOURCE: &str = "application::client";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub guard: GuardSettings,
    pub pagination: PaginationConfig,
}

impl ClientConfig {
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint).map_err(|source| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        Ok(Self {
            endpoint,
            guard: GuardSettings::default(),
            pagination: PaginationConfig::default(),
        })
    }
}

impl From<&Settings> for ClientConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            endpoint: settings.client.endpoint.clone(),
            guard: settings.guard.clone(),
            pagination: PaginationConfig::from(&settings.pagination),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct ClientResponse {
    pub source: ResultSource,
    pub data: Option<Value>,
    pub error: Option<OperationError>,
    pub verdict: GuardVerdict,
    /// Watched queries whose cached results changed because of this
    /// operation. Re-executing them is up to the caller.
    pub stale: Vec<Operation>,
}

impl ClientResponse {
    fn cached(data: Value) -> Self {
        Self {
            source: ResultSource::Cache,
            data: Some(data),
            error: None,
            verdict: GuardVerdict::Passed,
            stale: Vec::new(),
        }
    }
}

pub struct Client {
    endpoint: Url,
    context: ExecutionContext,
    transport: Arc<dyn Transport>,
    guard: SessionGuard,
    updater: MutationUpdater,
    resolvers: Resolvers,
    store: Mutex<NormalizedStore>,
    registry: OperationRegistry,
    watched: Mutex<HashMap<OperationKey, Operation>>,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        context: ExecutionContext,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let mut resolvers = Resolvers::new();
        resolvers.register(
            "Query",
            config.pagination.field.clone(),
            Arc::new(CursorPagination::new(config.pagination.clone())),
        );
        let store = NormalizedStore::new(&CacheConfig::embedding([config
            .pagination
            .view_typename
            .clone()]));

        Self {
            endpoint: config.endpoint,
            context,
            transport,
            guard: SessionGuard::new(&config.guard, navigator),
            updater: MutationUpdater::new(&config.pagination),
            resolvers,
            store: Mutex::new(store),
            registry: OperationRegistry::new(),
            watched: Mutex::new(HashMap::new()),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run a query cache-first.
    ///
    /// Complete reads are answered from the store. Partial reads and misses
    /// go to the network; the result is written and read back through the
    /// resolvers, so a new page comes back merged with the cached ones.
    #[instrument(skip(self, operation), fields(operation = %operation.name))]
    pub async fn query(&self, operation: &Operation) -> ClientResponse {
        let key = operation.key();
        let cached = {
            let store = mutex_lock(&self.store, SOURCE, "query.read");
            let read = store.read_operation(operation, &self.resolvers);
            counter!(METRIC_READ_TOTAL, "outcome" => read.outcome.label()).increment(1);
            debug!(outcome = read.outcome.label(), "Cache read");
            match read.outcome {
                ReadOutcome::Complete(data) => {
                    self.watch(key, operation, read.dependencies);
                    return ClientResponse::cached(data);
                }
                ReadOutcome::Partial(data) => Some(data),
                ReadOutcome::Miss => None,
            }
        };

        let (result, verdict) = self.execute(operation).await;

        let (data, dependencies, touched) = {
            let mut store = mutex_lock(&self.store, SOURCE, "query.write");
            if let Some(data) = &result.data {
                store.write_operation(operation, data);
            }
            let read = store.read_operation(operation, &self.resolvers);
            (read.outcome.into_data(), read.dependencies, store.take_touched())
        };

        let stale = self.stale_operations(&touched, Some(key));
        self.release_missing(&stale);
        if data.is_some() {
            self.watch(key, operation, dependencies);
        }

        let source = if result.data.is_some() {
            ResultSource::Network
        } else {
            ResultSource::Cache
        };
        ClientResponse {
            source,
            data: data.or(result.data).or(cached),
            error: result.error,
            verdict,
            stale,
        }
    }

    /// Run a mutation and apply its cache policy.
    ///
    /// The result is normalized into the store first, then each root field
    /// with a policy runs its handler. A failed mutation runs no handler.
    #[instrument(skip(self, operation), fields(operation = %operation.name))]
    pub async fn mutate(&self, operation: &Operation) -> ClientResponse {
        let (result, verdict) = self.execute(operation).await;

        let touched = {
            let mut store = mutex_lock(&self.store, SOURCE, "mutate");
            if let Some(data) = &result.data {
                store.write_operation(operation, data);
                if !result.is_failure() {
                    for field in operation.selection.iter() {
                        let (Some(kind), Some(payload)) =
                            (MutationKind::from_field(&field.name), data.get(&field.name))
                        else {
                            continue;
                        };
                        self.updater
                            .apply(kind, payload, &field.arguments, &mut *store);
                    }
                }
            }
            store.take_touched()
        };

        let stale = self.stale_operations(&touched, None);
        self.release_missing(&stale);
        info!(stale = stale.len(), "Mutation applied");

        ClientResponse {
            source: ResultSource::Network,
            data: result.data,
            error: result.error,
            verdict,
            stale,
        }
    }

    /// Dispatch by operation kind.
    pub async fn execute_operation(&self, operation: &Operation) -> ClientResponse {
        match operation.kind {
            OperationKind::Query => self.query(operation).await,
            OperationKind::Mutation => self.mutate(operation).await,
        }
    }

    /// Re-execute stale queries cache-first.
    pub async fn refetch(&self, stale: &[Operation]) -> Vec<ClientResponse> {
        let mut responses = Vec::with_capacity(stale.len());
        for operation in stale {
            responses.push(self.query(operation).await);
        }
        responses
    }

    /// Read a query from the store only.
    pub fn read(&self, operation: &Operation) -> ReadOutcome {
        mutex_lock(&self.store, SOURCE, "read")
            .read_operation(operation, &self.resolvers)
            .outcome
    }

    /// Stop tracking a query.
    ///
    /// Queries whose data was invalidated are released automatically; a
    /// query that still reads from the store stays watched until the caller
    /// unwatches it.
    pub fn unwatch(&self, operation: &Operation) {
        self.forget(&operation.key());
    }

    pub fn watched_count(&self) -> usize {
        mutex_lock(&self.watched, SOURCE, "watched_count").len()
    }

    /// JSON dump of every stored record.
    pub fn snapshot(&self) -> Value {
        mutex_lock(&self.store, SOURCE, "snapshot").snapshot()
    }

    async fn execute(&self, operation: &Operation) -> (OperationResult, GuardVerdict) {
        let request = OperationRequest::new(
            operation.clone(),
            self.endpoint.clone(),
            fetch_options(&self.context),
        );
        let observed = request.clone();
        debug!(request_id = %request.id, "Sending operation");
        let result = self.transport.execute(request).await;
        let verdict = self.guard.observe(&observed, &result);
        (result, verdict)
    }

    fn watch(&self, key: OperationKey, operation: &Operation, dependencies: HashSet<DependencyKey>) {
        self.registry.register(key, dependencies);
        mutex_lock(&self.watched, SOURCE, "watch")
            .entry(key)
            .or_insert_with(|| operation.clone());
    }

    fn forget(&self, key: &OperationKey) {
        self.registry.unregister(key);
        mutex_lock(&self.watched, SOURCE, "forget").remove(key);
    }

    /// Release stale queries that now read nothing. They are still reported
    /// as stale, and a refetch watches them again.
    fn release_missing(&self, stale: &[Operation]) {
        let missing: Vec<OperationKey> = {
            let store = mutex_lock(&self.store, SOURCE, "release_missing");
            stale
                .iter()
                .filter(|operation| {
                    matches!(
                        store.read_operation(operation, &self.resolvers).outcome,
                        ReadOutcome::Miss
                    )
                })
                .map(|operation| operation.key())
                .collect()
        };
        for key in &missing {
            self.forget(key);
        }
        if !missing.is_empty() {
            debug!(released = missing.len(), "Released invalidated queries");
        }
    }

    fn stale_operations(
        &self,
        touched: &HashSet<DependencyKey>,
        exclude: Option<OperationKey>,
    ) -> Vec<Operation> {
        if touched.is_empty() {
            return Vec::new();
        }
        let keys = self.registry.operations_for(touched);
        let watched = mutex_lock(&self.watched, SOURCE, "stale_operations");
        let mut stale: Vec<Operation> = keys
            .into_iter()
            .filter(|key| Some(*key) != exclude)
            .filter_map(|key| watched.get(&key).cloned())
            .collect();
        stale.sort_by(|a, b| a.name.cmp(&b.name));
        stale
    }
}
