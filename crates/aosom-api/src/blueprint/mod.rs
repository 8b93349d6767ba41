// ── Blueprints ──
//
// A blueprint is an item of the `blueprints` collection with extra
// endpoints: its full contents (build errors, cabling), slot parameters,
// and nested virtual networks.

mod cabling;
mod slots;

pub use cabling::Cabling;
pub use slots::{SlotParam, SlotParams};

use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::collection::{Collection, Item};
use crate::error::Error;
use crate::poll::{FixedPoll, POLL_INTERVAL};
use crate::record::{Record, into_record};
use crate::registry::ResourceSpec;

/// Blueprint item with build-status, parameter and cabling access.
#[derive(Debug, Clone)]
pub struct Blueprint {
    item: Item,
}

impl Blueprint {
    pub fn new(item: Item) -> Self {
        Self { item }
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    pub fn into_item(self) -> Item {
        self.item
    }

    pub fn name(&self) -> &str {
        self.item.name()
    }

    pub fn exists(&self) -> bool {
        self.item.exists()
    }

    fn url(&self) -> Result<&str, Error> {
        self.item.url().ok_or_else(|| Error::NotExists {
            name: self.item.name().to_owned(),
        })
    }

    /// The full blueprint document, always fetched fresh.
    pub async fn contents(&self) -> Result<Record, Error> {
        let body = self
            .item
            .api()
            .get(self.url()?, "unable to get blueprint contents")
            .await?;
        into_record(body)
    }

    /// The `errors` section of the contents, or `None` when there are no
    /// build errors.
    pub async fn build_errors(&self) -> Result<Option<Value>, Error> {
        let mut contents = self.contents().await?;
        Ok(contents.remove("errors").filter(|errors| !is_empty(errors)))
    }

    /// Poll the build status at a fixed 1s interval until it reports no
    /// errors or `timeout` passes.
    ///
    /// Never fails: a timeout, or a request that keeps failing, is `false`.
    pub async fn await_build_ready(&self, timeout: Duration) -> bool {
        let poll = FixedPoll::new(timeout, POLL_INTERVAL);
        loop {
            match self.build_errors().await {
                Ok(None) => return true,
                Ok(Some(errors)) => debug!(blueprint = %self.name(), %errors, "build not ready"),
                Err(e) => debug!(blueprint = %self.name(), error = %e, "build status unavailable"),
            }
            if !poll.tick().await {
                return false;
            }
        }
    }

    /// Create the blueprint from a design template.
    ///
    /// Returns once the server accepted the create; pair with
    /// [`Collection::await_listed`] to wait for it to be listed.
    pub async fn create(&mut self, template_id: &str, reference_arch: &str) -> Result<(), Error> {
        let value = json!({
            "display_name": self.item.name(),
            "template_id": template_id,
            "reference_architecture": reference_arch,
        });
        self.item.create(into_record(value)?).await
    }

    pub async fn delete(&mut self) -> Result<(), Error> {
        self.item.delete().await
    }

    /// Digest the blueprint's slot parameters.
    pub async fn params(&self) -> Result<SlotParams, Error> {
        SlotParams::fetch(self.item.api().clone(), self.url()?).await
    }

    /// Virtual networks defined within this blueprint.
    pub fn virtual_networks(&self) -> Result<Collection, Error> {
        Ok(Collection::nested(
            self.item.api().clone(),
            ResourceSpec::virtual_networks(),
            self.url()?,
        ))
    }

    /// Cabling view over the current contents.
    pub async fn cabling(&self) -> Result<Cabling, Error> {
        Cabling::from_contents(&self.contents().await?)
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}
