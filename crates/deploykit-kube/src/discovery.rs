//! Cluster discovery (spec §4.2): a one-shot query for the set of
//! cluster-scoped kinds known to the API server, plus the list of CRDs. The
//! `ApiReader` trait is also the resource cache's one remote-call boundary
//! (spec §4.4): `list` backs both discovery's own bookkeeping and the
//! cache's per-key prefetch.

use std::collections::HashSet;

use async_trait::async_trait;
use kube::discovery::Scope;
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::error::Result;

/// A single object as observed on the cluster, trimmed to what status
/// predicates need: identity plus the raw status/spec document.
#[derive(Debug, Clone)]
pub struct ObservedObject {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub raw: Value,
}

/// A CustomResourceDefinition as discovered, enough to classify the kinds
/// it introduces and to locate its schema for validation.
#[derive(Debug, Clone)]
pub struct Crd {
    pub name: String,
    pub group: String,
    pub kind: String,
    pub scope: CrdScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrdScope {
    Cluster,
    Namespaced,
}

/// The remote read boundary: lists by `(kind, namespace)` and the two
/// discovery endpoints. Implementations must be safe to share across the
/// parallel sync workers (spec §5) — no interior mutation of shared state
/// beyond the one-shot discovery memoization.
#[async_trait]
pub trait ApiReader: Send + Sync {
    async fn list(&self, kind: &str, namespace: Option<&str>) -> Result<Vec<ObservedObject>>;
    async fn global_resource_kinds(&self) -> Result<HashSet<String>>;
    async fn crds(&self) -> Result<Vec<Crd>>;
}

/// Production reader backed by `kube::Client` + `kube::discovery::Discovery`
/// (spec SPEC_FULL §4.2, §6). Discovery results are fetched once and
/// memoized behind a `once_cell::sync::OnceCell`, as the rest of the
/// workspace does for one-shot cluster metadata.
pub struct KubeApiReader {
    client: kube::Client,
    discovery: OnceCell<kube::discovery::Discovery>,
}

impl KubeApiReader {
    pub fn new(client: kube::Client) -> Self {
        Self {
            client,
            discovery: OnceCell::new(),
        }
    }

    async fn discovery(&self) -> Result<&kube::discovery::Discovery> {
        if let Some(d) = self.discovery.get() {
            return Ok(d);
        }
        let discovery = kube::discovery::Discovery::new(self.client.clone())
            .run()
            .await?;
        Ok(self.discovery.get_or_init(|| discovery))
    }
}

#[async_trait]
impl ApiReader for KubeApiReader {
    async fn list(&self, kind: &str, namespace: Option<&str>) -> Result<Vec<ObservedObject>> {
        use kube::api::{Api, DynamicObject, ListParams};

        let discovery = self.discovery().await?;
        let Some((api_resource, caps)) = discovery.groups().find_map(|group| {
            group
                .resources_by_stability()
                .into_iter()
                .find(|(ar, _)| ar.kind == kind)
        }) else {
            return Ok(Vec::new());
        };

        let api: Api<DynamicObject> = match (caps.scope, namespace) {
            (Scope::Namespaced, Some(ns)) => {
                Api::namespaced_with(self.client.clone(), ns, &api_resource)
            }
            _ => Api::all_with(self.client.clone(), &api_resource),
        };

        let objects = api.list(&ListParams::default()).await?;
        Ok(objects
            .items
            .into_iter()
            .map(|obj| {
                let raw = serde_json::to_value(&obj).unwrap_or(Value::Null);
                ObservedObject {
                    kind: kind.to_string(),
                    name: obj.metadata.name.unwrap_or_default(),
                    namespace: obj.metadata.namespace,
                    raw,
                }
            })
            .collect())
    }

    async fn global_resource_kinds(&self) -> Result<HashSet<String>> {
        let discovery = self.discovery().await?;
        let mut kinds = HashSet::new();
        for group in discovery.groups() {
            for (ar, caps) in group.resources_by_stability() {
                if caps.scope == Scope::Cluster {
                    kinds.insert(ar.kind.clone());
                }
            }
        }
        Ok(kinds)
    }

    async fn crds(&self) -> Result<Vec<Crd>> {
        use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition as K8sCrd;
        use kube::api::{Api, ListParams};

        let api: Api<K8sCrd> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|crd| {
                let name = crd.metadata.name?;
                let spec = crd.spec;
                let scope = if spec.scope == "Cluster" {
                    CrdScope::Cluster
                } else {
                    CrdScope::Namespaced
                };
                Some(Crd {
                    name,
                    group: spec.group,
                    kind: spec.names.kind,
                    scope,
                })
            })
            .collect())
    }
}
