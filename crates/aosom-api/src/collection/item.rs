use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info, warn};

use super::Endpoint;
use crate::api::Api;
use crate::error::Error;
use crate::record::{Record, into_record, key_of};

/// One record of a collection, bound to a caller-supplied name.
///
/// An item whose record is empty or lacks the ID field is *absent*: it has
/// no URL and can only be created. Once the ID is known the item URL
/// `{collection}/{id}` is computed and kept for the item's lifetime.
#[derive(Debug, Clone)]
pub struct Item {
    endpoint: Endpoint,
    name: String,
    record: Record,
    url: OnceLock<String>,
}

impl Item {
    pub(crate) fn new(endpoint: Endpoint, name: &str, record: Record) -> Self {
        Self {
            endpoint,
            name: name.to_owned(),
            record,
            url: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The server-assigned ID, if the record carries one.
    pub fn id(&self) -> Option<String> {
        self.record.get(&self.endpoint.spec.unique_id).and_then(key_of)
    }

    pub fn exists(&self) -> bool {
        !self.record.is_empty() && self.id().is_some()
    }

    /// `{collection-url}/{id}`, or `None` while the item is absent.
    pub fn url(&self) -> Option<&str> {
        if let Some(url) = self.url.get() {
            return Some(url.as_str());
        }
        let id = self.id()?;
        Some(
            self.url
                .get_or_init(|| format!("{}/{id}", self.endpoint.url))
                .as_str(),
        )
    }

    pub fn value(&self) -> &Record {
        &self.record
    }

    /// Local edits; nothing is sent until `write`/`replace`.
    pub fn value_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    pub fn api(&self) -> &Api {
        &self.endpoint.api
    }

    /// URL of the owning collection.
    pub fn collection_url(&self) -> &str {
        &self.endpoint.url
    }

    fn require_url(&self) -> Result<String, Error> {
        self.url().map(str::to_owned).ok_or_else(|| Error::NotExists {
            name: self.name.clone(),
        })
    }

    // ── Remote operations ────────────────────────────────────────────

    /// Fetch the record from the server, replacing the local copy.
    pub async fn read(&mut self) -> Result<&Record, Error> {
        let url = self.require_url()?;
        let body = self
            .endpoint
            .api
            .get(&url, &format!("unable to get item name: {}", self.name))
            .await?;
        self.record = into_record(body)?;
        Ok(&self.record)
    }

    /// POST the local record to the collection, creating it.
    ///
    /// Only the ID field is adopted from the response; the rest of the
    /// record stays as sent.
    pub async fn write(&mut self) -> Result<(), Error> {
        if self.exists() {
            return Err(Error::AlreadyExists {
                name: self.name.clone(),
            });
        }

        let Endpoint { api, spec, url } = &self.endpoint;
        let body = api
            .post(url, &self.record, &format!("unable to write: {}", self.name))
            .await?;

        let id = match body.get(&spec.unique_id) {
            Some(id) if key_of(id).is_some() => id.clone(),
            _ => {
                warn!(uri = %spec.uri, name = %self.name, "create accepted without an id");
                return Err(Error::CreatedWithoutId {
                    name: self.name.clone(),
                    body: body.to_string(),
                });
            }
        };

        info!(uri = %spec.uri, name = %self.name, id = %id, "item created");
        self.record.insert(spec.unique_id.clone(), id);
        Ok(())
    }

    /// Create the item from `value`. Fails with `AlreadyExists` when the
    /// item already has an ID. When the request fails the previous local
    /// record is restored; when the server accepted it without returning
    /// an ID, `value` is kept and `CreatedWithoutId` is returned.
    pub async fn create(&mut self, value: Record) -> Result<(), Error> {
        if self.exists() {
            return Err(Error::AlreadyExists {
                name: self.name.clone(),
            });
        }

        let previous = std::mem::replace(&mut self.record, value);
        match self.write().await {
            Ok(()) => Ok(()),
            Err(e @ Error::CreatedWithoutId { .. }) => Err(e),
            Err(e) => {
                self.record = previous;
                Err(e)
            }
        }
    }

    /// PUT `value` as the full record. The existing ID is kept.
    pub async fn replace(&mut self, mut value: Record) -> Result<(), Error> {
        let url = self.require_url()?;
        self.endpoint
            .api
            .put(&url, &value, &format!("unable to replace item: {}", self.name))
            .await?;

        let field = &self.endpoint.spec.unique_id;
        if let Some(id) = self.record.remove(field) {
            value.insert(field.clone(), id);
        }
        self.record = value;
        debug!(name = %self.name, "item replaced");
        Ok(())
    }

    /// DELETE the item on the server.
    ///
    /// On success the item is absent again: the ID field is dropped from
    /// the local record and the cached URL is forgotten. The owning
    /// collection's index is not touched.
    pub async fn delete(&mut self) -> Result<(), Error> {
        let url = self.require_url()?;
        self.endpoint
            .api
            .delete(&url, &format!("unable to delete item ({})", self.name))
            .await?;

        self.record.remove(&self.endpoint.spec.unique_id);
        self.url.take();
        info!(name = %self.name, "item deleted");
        Ok(())
    }

    // ── Local files ──────────────────────────────────────────────────

    /// Write the record as JSON to `<dir>/<filename>.json`.
    ///
    /// `dir` defaults to the working directory and `filename` to the item
    /// name. Returns the path written.
    pub fn jsonfile_save(
        &self,
        dir: Option<&Path>,
        filename: Option<&str>,
        indent: usize,
    ) -> Result<PathBuf, Error> {
        let path = dir
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{}.json", filename.unwrap_or(&self.name)));

        let indent = " ".repeat(indent);
        let file = std::fs::File::create(&path)?;
        let mut ser = serde_json::Serializer::with_formatter(
            BufWriter::new(file),
            PrettyFormatter::with_indent(indent.as_bytes()),
        );
        self.record.serialize(&mut ser)?;
        ser.into_inner().flush()?;

        debug!(path = %path.display(), "item saved");
        Ok(path)
    }

    /// Replace the local record with the JSON object in `path`.
    pub fn jsonfile_load(&mut self, path: &Path) -> Result<(), Error> {
        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        self.record = into_record(value)?;
        self.url.take();
        Ok(())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = serde_json::json!({
            "name": self.name,
            "id": self.id(),
            "value": self.record,
        });
        let text = serde_json::to_string_pretty(&view).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
