//! A process-local cache of where cluster workloads live.
//!
//! An edge controller watches pods, nodes, config maps, secrets, and
//! endpoints through the Kubernetes API, and has to answer the same two
//! questions on every event: which edge nodes care about this object, and
//! is this change worth telling them about? Re-listing the workload set
//! every time is far too slow, so the controller keeps this cache and
//! updates it from its watch callbacks.
//!
//! [LocationCache] holds four independent concurrent maps: the edge node
//! set, a config-map and a secret reverse index built by scanning pod
//! specs, and the last seen snapshot of every endpoints object. All
//! methods take `&self`; event handlers running on different threads share
//! one instance by reference.

mod cache;
mod key;
mod refs;

pub use cache::LocationCache;
pub use key::{InvalidObjectKey, ObjectKey};
pub use refs::PodRefs;
