// The cache itself. Four independent concurrent maps, mutated by whichever
// watch callback thread gets there first - there is no single writer here,
// so every map value is replaced whole rather than mutated in place, and
// readers see a value entirely before or entirely after a write.
//
// The one spot where that isn't enough on its own is appending a node to a
// reverse-index list: two writers can both load the old list, both append,
// and one append silently wins. NodeIndex closes that hole with an
// optimistic compare-and-swap loop over SkipMap::compare_insert.

use crossbeam_skiplist::{SkipMap, SkipSet};
use k8s_openapi::api::core::v1::{Endpoints, Pod};
use kube::ResourceExt;
use tracing::{debug, trace};

use crate::key::ObjectKey;
use crate::refs::PodRefs;

/// A reverse index from an object key to the nodes that depend on it.
#[derive(Debug, Default)]
struct NodeIndex(SkipMap<ObjectKey, Vec<String>>);

impl NodeIndex {
    /// Append `node` to the list for `key` if it isn't already present.
    ///
    /// Publishes with `compare_insert` conditioned on the list still being
    /// the one we read, and reloads and retries on conflict, so a
    /// concurrent insert to the same key is never lost. An absent key
    /// inserts unconditionally; a racing first writer shows up in the
    /// returned entry and sends us around the loop again.
    fn insert(&self, key: &ObjectKey, node: &str) {
        loop {
            let current = match self.0.get(key) {
                Some(entry) => entry.value().clone(),
                None => Vec::new(),
            };
            if current.iter().any(|n| n == node) {
                return;
            }

            let mut next = current.clone();
            next.push(node.to_string());

            let entry = self
                .0
                .compare_insert(key.clone(), next, |stored| stored == &current);
            if entry.value().iter().any(|n| n == node) {
                return;
            }
        }
    }

    /// The current node list for `key`, as an owned snapshot. Empty if the
    /// key is absent.
    fn nodes(&self, key: &ObjectKey) -> Vec<String> {
        self.0
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn remove(&self, key: &ObjectKey) {
        self.0.remove(key);
    }
}

/// A cache of where cluster workloads live.
///
/// Tracks which nodes are edge nodes, which nodes run pods that depend on
/// each config map and secret, and the last seen snapshot of every
/// endpoints object. One instance is built empty at controller start and
/// shared by reference with every event handler; all methods take `&self`
/// and are safe to call from any thread.
///
/// The four maps are independent. There is no cross-map transaction: a
/// reader may observe the config-map index updated for a pod before the
/// secret index is, though a single [add_or_update_pod][Self::add_or_update_pod]
/// call always attempts both.
#[derive(Debug, Default)]
pub struct LocationCache {
    edge_nodes: SkipSet<String>,
    config_map_nodes: NodeIndex,
    secret_nodes: NodeIndex,
    endpoints: SkipMap<ObjectKey, Endpoints>,
}

impl LocationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every config map and secret `pod` depends on as needed on the
    /// pod's node. Idempotent: re-adding the same pod is a no-op beyond the
    /// lookup cost.
    ///
    /// A pod that hasn't been scheduled yet carries no node name and is
    /// skipped entirely, so the indices never hold an empty node entry.
    pub fn add_or_update_pod(&self, pod: &Pod) {
        let Some(spec) = &pod.spec else {
            return;
        };
        let node = spec.node_name.as_deref().unwrap_or_default();
        if node.is_empty() {
            debug!(pod = %ObjectKey::from_resource(pod), "pod has no assigned node, skipping");
            return;
        }

        let namespace = pod.namespace().unwrap_or_default();
        let refs = PodRefs::from_spec(spec);

        for name in &refs.config_maps {
            self.config_map_nodes
                .insert(&ObjectKey::new(namespace.clone(), name.clone()), node);
        }
        for name in &refs.secrets {
            self.secret_nodes
                .insert(&ObjectKey::new(namespace.clone(), name.clone()), node);
        }
    }

    /// All nodes currently running at least one pod that depends on the
    /// config map. Empty if none are known.
    pub fn config_map_nodes(&self, namespace: &str, name: &str) -> Vec<String> {
        self.config_map_nodes.nodes(&ObjectKey::new(namespace, name))
    }

    /// All nodes currently running at least one pod that depends on the
    /// secret. Empty if none are known.
    pub fn secret_nodes(&self, namespace: &str, name: &str) -> Vec<String> {
        self.secret_nodes.nodes(&ObjectKey::new(namespace, name))
    }

    /// Drop a config map's entry, however many nodes reference it.
    pub fn delete_config_map(&self, namespace: &str, name: &str) {
        let key = ObjectKey::new(namespace, name);
        trace!(%key, "delete config map");
        self.config_map_nodes.remove(&key);
    }

    /// Drop a secret's entry, however many nodes reference it.
    pub fn delete_secret(&self, namespace: &str, name: &str) {
        let key = ObjectKey::new(namespace, name);
        trace!(%key, "delete secret");
        self.secret_nodes.remove(&key);
    }

    /// Mark a node as an edge node. Idempotent.
    pub fn update_edge_node(&self, name: &str) {
        self.edge_nodes.insert(name.to_string());
    }

    /// Whether `name` is a known edge node.
    pub fn is_edge_node(&self, name: &str) -> bool {
        self.edge_nodes.contains(name)
    }

    /// Forget a node. Unknown names are a silent no-op.
    pub fn delete_node(&self, name: &str) {
        self.edge_nodes.remove(name);
    }

    /// A snapshot of all current edge node names, in arbitrary order.
    pub fn edge_nodes(&self) -> Vec<String> {
        self.edge_nodes
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Store the latest snapshot of an endpoints object, unconditionally
    /// overwriting any prior one. The cache takes ownership, so later
    /// changes to the caller's copy can't reach the stored snapshot.
    pub fn add_or_update_endpoints(&self, endpoints: Endpoints) {
        let key = ObjectKey::from_resource(&endpoints);
        trace!(%key, "store endpoints");
        self.endpoints.insert(key, endpoints);
    }

    /// Drop the stored snapshot for an endpoints object.
    pub fn delete_endpoints(&self, endpoints: &Endpoints) {
        self.endpoints.remove(&ObjectKey::from_resource(endpoints));
    }

    /// A snapshot of every stored endpoints object, in whatever order the
    /// map yields them. Not stable across calls.
    pub fn all_endpoints(&self) -> Vec<Endpoints> {
        self.endpoints
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Whether `new` differs from the stored snapshot in a way worth
    /// propagating downstream.
    ///
    /// Resource version and generation move on every write, and
    /// annotations carry orchestration bookkeeping, so those three fields
    /// are masked before comparing. Anything else in the metadata, or any
    /// change to the address subsets, counts as an update. A key never
    /// stored before is always an update, so first-seen objects are not
    /// skipped. The stored snapshot is never mutated by the check.
    pub fn is_endpoints_updated(&self, new: &Endpoints) -> bool {
        let key = ObjectKey::from_resource(new);
        let Some(entry) = self.endpoints.get(&key) else {
            return true;
        };
        let stored = entry.value();

        let mut masked = stored.metadata.clone();
        masked.resource_version = new.metadata.resource_version.clone();
        masked.generation = new.metadata.generation;
        masked.annotations = new.metadata.annotations.clone();

        let updated = masked != new.metadata || stored.subsets != new.subsets;
        if updated {
            debug!(%key, "endpoints changed");
        }
        updated
    }
}
