// ── Collections ──
//
// One `Collection` per resource type: a list endpoint plus the Identity
// Index built from its last digest. Population is lazy and memoized; the
// index is only ever replaced wholesale (digest) or dropped (clear_cache).
//
// Cache-mutating calls take `&mut self`. A collection is not meant to be
// shared between tasks without the caller providing its own locking.

mod index;
mod item;
mod xform;

pub use index::{IdentityIndex, IndexMethod};
pub use item::Item;
pub use xform::{MultiTransformer, ValueTransformer};

use std::time::Duration;

use tracing::debug;

use crate::api::Api;
use crate::error::Error;
use crate::poll::{FixedPoll, POLL_INTERVAL};
use crate::record::Record;
use crate::registry::ResourceSpec;

/// Where a collection's records live. Shared (by clone) with every
/// [`Item`] handed out, so items can issue their own calls.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub(crate) api: Api,
    pub(crate) spec: ResourceSpec,
    pub(crate) url: String,
}

/// A server-side list resource with a lazily built name/ID index.
#[derive(Debug, Clone)]
pub struct Collection {
    endpoint: Endpoint,
    /// `None` until the first successful digest, and after `clear_cache`.
    index: Option<IdentityIndex>,
}

impl Collection {
    /// Collection rooted at `{api}/{spec.uri}`.
    pub fn new(api: Api, spec: ResourceSpec) -> Self {
        let url = format!("{}/{}", api.url(), spec.uri);
        Self::at(api, spec, url)
    }

    /// Collection rooted below a parent item, `{parent_url}/{spec.uri}`.
    pub fn nested(api: Api, spec: ResourceSpec, parent_url: &str) -> Self {
        let url = format!("{}/{}", parent_url.trim_end_matches('/'), spec.uri);
        Self::at(api, spec, url)
    }

    fn at(api: Api, spec: ResourceSpec, url: String) -> Self {
        Self {
            endpoint: Endpoint { api, spec, url },
            index: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.endpoint.url
    }

    pub fn spec(&self) -> &ResourceSpec {
        &self.endpoint.spec
    }

    pub fn api(&self) -> &Api {
        &self.endpoint.api
    }

    /// Whether a digest result is currently held.
    pub fn is_cached(&self) -> bool {
        self.index.is_some()
    }

    // ── Cache ────────────────────────────────────────────────────────

    /// Fetch the full list and rebuild the index.
    ///
    /// The previous index is dropped first, so a failed fetch leaves the
    /// collection un-digested rather than holding a stale snapshot.
    pub async fn digest(&mut self) -> Result<&IdentityIndex, Error> {
        self.index = None;

        let Endpoint { api, spec, url } = &self.endpoint;
        let body = api
            .get(url, &format!("unable to list {}", spec.uri))
            .await?;
        let records = api.unwrap_list(body)?;
        let index = IdentityIndex::build(records, spec)?;

        debug!(uri = %spec.uri, count = index.len(), "collection digested");
        Ok(self.index.insert(index))
    }

    /// The cached index, digesting first if there is none.
    pub async fn cache(&mut self) -> Result<&IdentityIndex, Error> {
        if self.index.is_none() {
            self.digest().await?;
        }
        Ok(self.index.get_or_insert_with(IdentityIndex::default))
    }

    /// Forget the cached index; the next lookup re-digests.
    pub fn clear_cache(&mut self) {
        if self.index.take().is_some() {
            debug!(uri = %self.endpoint.spec.uri, "collection cache cleared");
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Display names in server list order.
    pub async fn names(&mut self) -> Result<&[String], Error> {
        Ok(self.cache().await?.names())
    }

    pub async fn contains(&mut self, name: &str) -> Result<bool, Error> {
        Ok(self.cache().await?.contains(name))
    }

    /// Item handle for `name`. Unknown names yield an absent item
    /// (`exists() == false`) that can be created.
    pub async fn get(&mut self, name: &str) -> Result<Item, Error> {
        let record = self
            .cache()
            .await?
            .by_name(name)
            .cloned()
            .unwrap_or_default();
        Ok(Item::new(self.endpoint.clone(), name, record))
    }

    /// Look up a record by key. `method` is the field name of one of the
    /// two indices, e.g. `"display_name"` or `"id"`.
    pub async fn find(&mut self, key: &str, method: &str) -> Result<Option<&Record>, Error> {
        let method = self.endpoint.spec.index_method(method)?;
        self.find_by(key, method).await
    }

    pub async fn find_by(
        &mut self,
        key: &str,
        method: IndexMethod,
    ) -> Result<Option<&Record>, Error> {
        Ok(self.cache().await?.find(key, method))
    }

    /// Items for every cached name, in list order. The iterator is
    /// `Clone`, so it can be walked more than once.
    pub async fn items(&mut self) -> Result<Items<'_>, Error> {
        if self.index.is_none() {
            self.digest().await?;
        }
        let Self { endpoint, index } = self;
        Ok(Items {
            endpoint,
            index: index.get_or_insert_with(IdentityIndex::default),
            pos: 0,
        })
    }

    /// Re-digest at a fixed 1s interval until `name` is listed or
    /// `timeout` passes. Failed fetches while waiting are not fatal.
    pub async fn await_listed(&mut self, name: &str, timeout: Duration) -> bool {
        let poll = FixedPoll::new(timeout, POLL_INTERVAL);
        loop {
            match self.digest().await {
                Ok(index) if index.contains(name) => return true,
                Ok(_) => debug!(name, "not listed yet"),
                Err(e) => debug!(name, error = %e, "digest failed while waiting"),
            }
            if !poll.tick().await {
                return false;
            }
        }
    }

    /// A name <-> ID transformer using this collection's fields.
    pub fn transformer(&self) -> ValueTransformer {
        ValueTransformer::new(self.endpoint.spec.clone())
    }
}

/// Iterator over the items of a digested collection.
#[derive(Debug, Clone)]
pub struct Items<'a> {
    endpoint: &'a Endpoint,
    index: &'a IdentityIndex,
    pos: usize,
}

impl Iterator for Items<'_> {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        let name = self.index.names().get(self.pos)?;
        self.pos += 1;
        let record = self.index.by_name(name).cloned().unwrap_or_default();
        Some(Item::new(self.endpoint.clone(), name, record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.index.names().len().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Items<'_> {}
