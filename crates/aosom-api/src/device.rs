// ── Devices ──
//
// Managed systems (`/api/systems`), named by their `device_key`, and the
// default approved-device pool that admits them into service.

use std::collections::BTreeSet;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::api::Api;
use crate::collection::Item;
use crate::error::Error;
use crate::poll::{FixedPoll, POLL_INTERVAL};
use crate::record::{Record, into_record, key_of};

/// Management state of a device waiting for approval.
pub const QUARANTINED: &str = "OOS-QUARANTINED";

/// How long an approved-pool update keeps retrying its PUT.
const POOL_UPDATE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

/// A managed device.
#[derive(Debug, Clone)]
pub struct Device {
    item: Item,
}

impl Device {
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

    pub fn device_key(&self) -> &str {
        self.item.name()
    }

    fn url(&self) -> Result<&str, Error> {
        self.item.url().ok_or_else(|| Error::NotExists {
            name: self.item.name().to_owned(),
        })
    }

    /// Management state, e.g. `IS-ACTIVE` or `OOS-QUARANTINED`.
    pub fn state(&self) -> Option<&str> {
        self.item
            .value()
            .get("status")
            .and_then(|status| status.get("state"))
            .and_then(Value::as_str)
    }

    /// Telemetry services the device offers. The record is read first if
    /// it does not list them yet.
    pub async fn services(&mut self) -> Result<Vec<String>, Error> {
        if !self.item.value().contains_key("services") {
            self.item.read().await?;
        }
        Ok(self
            .item
            .value()
            .get("services")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(key_of).collect())
            .unwrap_or_default())
    }

    /// Items of one telemetry service, `GET {device}/{service}`.
    pub async fn service(&self, service: &str) -> Result<Value, Error> {
        let url = format!("{}/{service}", self.url()?);
        let mut body = self
            .item
            .api()
            .get(&url, &format!("unable to retrieve service={service}"))
            .await?;
        match body.get_mut("items") {
            Some(items) => Ok(items.take()),
            None => Err(Error::shape("service response has no 'items'", &body)),
        }
    }

    /// Fresh `user_config` of the device.
    pub async fn user_config(&mut self) -> Result<Option<Value>, Error> {
        Ok(self.item.read().await?.get("user_config").cloned())
    }

    pub async fn set_user_config(&self, value: Value) -> Result<(), Error> {
        self.item
            .api()
            .put(
                self.url()?,
                &json!({ "user_config": value }),
                "unable to set user_config",
            )
            .await?;
        Ok(())
    }

    /// Admit a quarantined device: set its user config to the normal
    /// admin state and add it to the approved pool.
    ///
    /// Returns `false` without doing anything when the device is not
    /// quarantined.
    pub async fn approve(&self, location: Option<&str>, pool: &ApprovedPool) -> Result<bool, Error> {
        if self.state() != Some(QUARANTINED) {
            return Ok(false);
        }

        let id = self.item.id().ok_or_else(|| Error::NotExists {
            name: self.item.name().to_owned(),
        })?;
        let model = self
            .item
            .value()
            .get("facts")
            .and_then(|facts| facts.get("aos_hcl_model"))
            .cloned()
            .ok_or_else(|| {
                Error::shape(
                    "device facts have no aos_hcl_model",
                    &Value::Object(self.item.value().clone()),
                )
            })?;

        self.set_user_config(json!({
            "admin_state": "normal",
            "aos_hcl_model": model,
            "location": location.unwrap_or_default(),
        }))
        .await?;
        pool.update(&[id]).await?;

        info!(device = %self.device_key(), "device approved");
        Ok(true)
    }

    pub async fn is_approved(&self, pool: &ApprovedPool) -> Result<bool, Error> {
        match self.item.id() {
            Some(id) => Ok(pool.ids().await?.contains(&id)),
            None => Ok(false),
        }
    }
}

/// The default device pool, `resources/device-pools/default_pool`.
#[derive(Debug, Clone)]
pub struct ApprovedPool {
    api: Api,
    url: String,
}

impl ApprovedPool {
    pub fn new(api: Api) -> Self {
        let url = format!("{}/resources/device-pools/default_pool", api.url());
        Self { api, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn get(&self) -> Result<Record, Error> {
        let body = self
            .api
            .get(&self.url, "unable to get approved device pool")
            .await?;
        into_record(body)
    }

    pub async fn devices(&self) -> Result<Vec<Value>, Error> {
        let mut pool = self.get().await?;
        match pool.remove("devices") {
            Some(Value::Array(devices)) => Ok(devices),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(Error::shape("pool 'devices' is not an array", &other)),
        }
    }

    pub async fn ids(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .devices()
            .await?
            .iter()
            .filter_map(|device| device.get("id").and_then(key_of))
            .collect())
    }

    /// Add `ids` to the pool.
    ///
    /// The pool is replaced with a PUT, so the current members are sent
    /// along with the new ones. Returns `false` when every ID was already
    /// a member. The PUT is retried at a fixed 1s interval for up to 3s.
    pub async fn update(&self, ids: &[String]) -> Result<bool, Error> {
        let mut devices = self.devices().await?;
        let mut have: BTreeSet<String> = devices
            .iter()
            .filter_map(|device| device.get("id").and_then(key_of))
            .collect();

        let mut added = 0_usize;
        for id in ids {
            if have.insert(id.clone()) {
                devices.push(json!({ "id": id }));
                added += 1;
            }
        }
        if added == 0 {
            debug!("approved pool already has every device");
            return Ok(false);
        }

        let body = json!({
            "display_name": "Default Pool",
            "devices": devices,
        });
        let poll = FixedPoll::new(POOL_UPDATE_TIMEOUT, POLL_INTERVAL);
        loop {
            match self
                .api
                .put(&self.url, &body, "unable to update approved list")
                .await
            {
                Ok(_) => {
                    info!(added, "approved pool updated");
                    return Ok(true);
                }
                Err(e) => {
                    debug!(error = %e, "approved pool update failed");
                    if !poll.tick().await {
                        return Err(e);
                    }
                }
            }
        }
    }
}
