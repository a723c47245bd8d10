//! Resource cache (spec §4.4): a per-task read-through cache of API server
//! listings keyed by `(kind, namespace-or-empty)`. Populated once via a
//! batch prefetch before status sync, then served from memory so the
//! parallel sync fan-out (spec §5) never blocks on more remote calls than
//! the number of distinct `(kind, namespace)` keys in play.

use std::collections::{HashMap, HashSet};

use crate::discovery::{ApiReader, ObservedObject};
use crate::error::Result;

/// `(kind, namespace-or-empty)`; the empty string stands in for "no
/// namespace", i.e. a cluster-scoped listing.
pub type CacheKey = (String, String);

/// Per-task listing cache. Immutable after construction apart from the
/// prefetch map that was used to build it; every key is list-once,
/// read-many, so reads never take a lock once prefetch has completed.
pub struct ResourceCache {
    entries: HashMap<CacheKey, Vec<ObservedObject>>,
}

impl ResourceCache {
    /// Performs one list call per distinct `(kind, namespace)` key across
    /// `keys`, plus one additional call per kind named in
    /// `prefetch_kinds_on_sync` for each namespace already being fetched
    /// (e.g. `CronJob` prefetches `Pod`, spec §4.4).
    pub async fn prefetch(
        reader: &dyn ApiReader,
        keys: impl IntoIterator<Item = CacheKey>,
        prefetch_kinds_on_sync: &HashMap<String, Vec<String>>,
    ) -> Result<Self> {
        let mut wanted: HashSet<CacheKey> = keys.into_iter().collect();

        let namespaces: HashSet<String> = wanted.iter().map(|(_, ns)| ns.clone()).collect();
        for (kind, _) in wanted.clone() {
            if let Some(extra_kinds) = prefetch_kinds_on_sync.get(&kind) {
                for extra in extra_kinds {
                    for ns in &namespaces {
                        wanted.insert((extra.clone(), ns.clone()));
                    }
                }
            }
        }

        let mut entries = HashMap::with_capacity(wanted.len());
        for (kind, namespace) in wanted {
            let ns_arg = if namespace.is_empty() {
                None
            } else {
                Some(namespace.as_str())
            };
            let objects = reader.list(&kind, ns_arg).await?;
            entries.insert((kind, namespace), objects);
        }

        Ok(Self { entries })
    }

    /// Looks up a single object by kind/namespace/name from the already
    /// prefetched listing. Returns `None` if the object was not present in
    /// the last prefetch (e.g. it hasn't been created yet).
    pub fn get(&self, kind: &str, namespace: &str, name: &str) -> Option<&ObservedObject> {
        self.entries
            .get(&(kind.to_string(), namespace.to_string()))?
            .iter()
            .find(|o| o.name == name)
    }

    /// All objects of `kind` in `namespace` from the last prefetch.
    pub fn list(&self, kind: &str, namespace: &str) -> &[ObservedObject] {
        self.entries
            .get(&(kind.to_string(), namespace.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
