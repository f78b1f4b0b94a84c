//! Search-set bundles.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bundle<R> {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default = "Vec::new")]
    pub entry: Vec<BundleEntry<R>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry<R> {
    #[serde(default)]
    pub full_url: Option<String>,
    pub resource: R,
}

impl<R> Bundle<R> {
    pub fn resources(&self) -> impl Iterator<Item = &R> {
        self.entry.iter().map(|e| &e.resource)
    }

    pub fn into_resources(self) -> Vec<R> {
        self.entry.into_iter().map(|e| e.resource).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}
