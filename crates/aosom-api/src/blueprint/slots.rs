use serde_json::{Value, json};
use tracing::debug;

use crate::api::Api;
use crate::collection::IdentityIndex;
use crate::error::Error;
use crate::record::Record;
use crate::registry::ResourceSpec;

/// Slots are identified by `name` only.
fn slot_spec() -> ResourceSpec {
    ResourceSpec::new("slots", "name", "name")
}

/// The slot parameters of one blueprint, digested from `{bp}/slots`.
#[derive(Debug, Clone)]
pub struct SlotParams {
    api: Api,
    url: String,
    index: IdentityIndex,
}

impl SlotParams {
    pub(crate) async fn fetch(api: Api, blueprint_url: &str) -> Result<Self, Error> {
        let url = format!("{blueprint_url}/slots");
        let mut params = Self {
            api,
            url,
            index: IdentityIndex::default(),
        };
        params.refresh().await?;
        Ok(params)
    }

    /// Re-read the slot list.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let body = self.api.get(&self.url, "error fetching slots").await?;
        let records = self.api.unwrap_list(body)?;
        self.index = IdentityIndex::build(records, &slot_spec())?;
        debug!(url = %self.url, count = self.index.len(), "slots digested");
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        self.index.names()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    /// Handle for slot `name`. Unlike collection items, an unknown slot
    /// is an error: slots are defined by the blueprint, never created.
    pub fn get(&self, name: &str) -> Result<SlotParam, Error> {
        let info = self.index.by_name(name).ok_or_else(|| Error::Access {
            key: name.to_owned(),
            method: "name".into(),
        })?;
        Ok(SlotParam {
            api: self.api.clone(),
            name: name.to_owned(),
            url: format!("{}/{name}", self.url),
            info: info.clone(),
            value: None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SlotParam> + '_ {
        self.names().iter().filter_map(|name| self.get(name).ok())
    }
}

/// One blueprint parameter slot.
#[derive(Debug, Clone)]
pub struct SlotParam {
    api: Api,
    name: String,
    url: String,
    info: Record,
    value: Option<Value>,
}

impl SlotParam {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `{bp}/slots/{name}`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The slot descriptor from the slot list.
    pub fn info(&self) -> &Record {
        &self.info
    }

    /// The cached value, reading it first if there is none.
    pub async fn value(&mut self) -> Result<&Value, Error> {
        if self.value.is_none() {
            self.read().await?;
        }
        Ok(self.value.get_or_insert(Value::Null))
    }

    pub async fn read(&mut self) -> Result<&Value, Error> {
        let body = self
            .api
            .get(&self.url, &format!("unable to get value on slot: {}", self.name))
            .await?;
        Ok(self.value.insert(body))
    }

    pub async fn write(&mut self, value: Value) -> Result<(), Error> {
        self.api
            .put(&self.url, &value, &format!("unable to write slot: {}", self.name))
            .await?;
        debug!(slot = %self.name, "slot written");
        self.value = Some(value);
        Ok(())
    }

    /// Reset the slot by writing an empty object.
    pub async fn clear(&mut self) -> Result<(), Error> {
        self.write(json!({})).await
    }
}
