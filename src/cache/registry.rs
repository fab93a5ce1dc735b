//! Bidirectional dependency registry.
//!
//! Tracks which watched operations read which dependencies, so a write or an
//! invalidation can name the operations whose results went stale.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::keys::{DependencyKey, OperationKey};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

/// Tracks dependency → operations and operation → dependencies mappings.
pub struct OperationRegistry {
    dependency_to_ops: RwLock<HashMap<DependencyKey, HashSet<OperationKey>>>,
    op_to_dependencies: RwLock<HashMap<OperationKey, HashSet<DependencyKey>>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self {
            dependency_to_ops: RwLock::new(HashMap::new()),
            op_to_dependencies: RwLock::new(HashMap::new()),
        }
    }

    /// Register an operation with the dependencies of its latest read.
    ///
    /// Dependencies of a previous read of the same operation are replaced.
    pub fn register(&self, operation: OperationKey, dependencies: HashSet<DependencyKey>) {
        self.unregister(&operation);

        let mut d2o = rw_write(&self.dependency_to_ops, SOURCE, "register");
        let mut o2d = rw_write(&self.op_to_dependencies, SOURCE, "register");

        for dependency in &dependencies {
            d2o.entry(dependency.clone()).or_default().insert(operation);
        }
        o2d.insert(operation, dependencies);
    }

    /// Operations that depend on any of the given keys.
    pub fn operations_for<'a>(
        &self,
        dependencies: impl IntoIterator<Item = &'a DependencyKey>,
    ) -> HashSet<OperationKey> {
        let d2o = rw_read(&self.dependency_to_ops, SOURCE, "operations_for");
        dependencies
            .into_iter()
            .filter_map(|dependency| d2o.get(dependency))
            .flat_map(|ops| ops.iter().copied())
            .collect()
    }

    pub fn dependencies_for(&self, operation: &OperationKey) -> HashSet<DependencyKey> {
        rw_read(&self.op_to_dependencies, SOURCE, "dependencies_for")
            .get(operation)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove an operation and clean up its dependency mappings.
    pub fn unregister(&self, operation: &OperationKey) {
        let mut d2o = rw_write(&self.dependency_to_ops, SOURCE, "unregister");
        let mut o2d = rw_write(&self.op_to_dependencies, SOURCE, "unregister");

        if let Some(dependencies) = o2d.remove(operation) {
            for dependency in dependencies {
                if let Some(ops) = d2o.get_mut(&dependency) {
                    ops.remove(operation);
                    if ops.is_empty() {
                        d2o.remove(&dependency);
                    }
                }
            }
        }
    }

    pub fn clear(&self) {
        rw_write(&self.dependency_to_ops, SOURCE, "clear").clear();
        rw_write(&self.op_to_dependencies, SOURCE, "clear").clear();
    }

    /// Number of tracked dependencies.
    pub fn dependency_count(&self) -> usize {
        rw_read(&self.dependency_to_ops, SOURCE, "dependency_count").len()
    }

    /// Number of tracked operations.
    pub fn operation_count(&self) -> usize {
        rw_read(&self.op_to_dependencies, SOURCE, "operation_count").len()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
