// ── Reference transformers ──
//
// Records refer to other resources by ID on the wire and by name in
// human-facing data. A transformer rewrites such fields in one direction
// using a collection's Identity Index as the lookup table. Unresolvable
// references are errors, never dropped or nulled.

use std::collections::BTreeMap;

use serde_json::Value;

use super::{IdentityIndex, IndexMethod};
use crate::error::Error;
use crate::record::{Record, key_of};
use crate::registry::{ResourceKind, ResourceSpec};
use crate::session::Session;

/// Single-collection name <-> ID rewriter.
///
/// Reading (`xf_in`) looks references up by ID and yields display names;
/// writing (`xf_out`) goes the other way. Either direction can be pointed
/// at other fields with [`ValueTransformer::reading`] / [`ValueTransformer::writing`].
///
/// A field may hold one reference, a list of them, or a mapping. In a
/// mapping only the values are references; keys such as role names pass
/// through untouched.
#[derive(Debug, Clone)]
pub struct ValueTransformer {
    spec: ResourceSpec,
    read_given: IndexMethod,
    read_item: String,
    write_given: IndexMethod,
    write_item: String,
}

impl ValueTransformer {
    pub fn new(spec: ResourceSpec) -> Self {
        Self {
            read_given: IndexMethod::Id,
            read_item: spec.display_name.clone(),
            write_given: IndexMethod::Name,
            write_item: spec.unique_id.clone(),
            spec,
        }
    }

    /// On read, look up by `given` and substitute the record's `item` field.
    #[must_use]
    pub fn reading(mut self, given: IndexMethod, item: impl Into<String>) -> Self {
        self.read_given = given;
        self.read_item = item.into();
        self
    }

    /// On write, look up by `given` and substitute the record's `item` field.
    #[must_use]
    pub fn writing(mut self, given: IndexMethod, item: impl Into<String>) -> Self {
        self.write_given = given;
        self.write_item = item.into();
        self
    }

    /// Server form -> caller form (by default ID -> name).
    pub fn xf_in(&self, index: &IdentityIndex, value: &Record) -> Result<Record, Error> {
        self.rewrite(index, value, self.read_given, &self.read_item)
    }

    /// Caller form -> server form (by default name -> ID).
    pub fn xf_out(&self, index: &IdentityIndex, value: &Record) -> Result<Record, Error> {
        self.rewrite(index, value, self.write_given, &self.write_item)
    }

    fn rewrite(
        &self,
        index: &IdentityIndex,
        value: &Record,
        given: IndexMethod,
        item: &str,
    ) -> Result<Record, Error> {
        let lookup = |reference: &Value| -> Result<Value, Error> {
            let found = key_of(reference)
                .and_then(|key| index.find(&key, given))
                .and_then(|record| record.get(item));
            found.cloned().ok_or_else(|| Error::Access {
                key: key_of(reference).unwrap_or_else(|| reference.to_string()),
                method: self.spec.field(given).to_owned(),
            })
        };

        value
            .iter()
            .map(|(field, reference)| -> Result<(String, Value), Error> {
                let rewritten = match reference {
                    Value::Array(refs) => {
                        Value::Array(refs.iter().map(&lookup).collect::<Result<_, _>>()?)
                    }
                    Value::Object(refs) => Value::Object(
                        refs.iter()
                            .map(|(k, v)| -> Result<(String, Value), Error> {
                                Ok((k.clone(), lookup(v)?))
                            })
                            .collect::<Result<_, Error>>()?,
                    ),
                    scalar => lookup(scalar)?,
                };
                Ok((field.clone(), rewritten))
            })
            .collect()
    }
}

/// Field-keyed bundle of transformers, each against its own collection.
///
/// ```ignore
/// let xf = MultiTransformer::new([
///     ("asn_pool", ResourceKind::AsnPools),
///     ("ip_pool", ResourceKind::IpPools),
/// ]);
/// let wire = xf.xf_out(&mut session, &named).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultiTransformer {
    xfs: BTreeMap<String, (ResourceKind, ValueTransformer)>,
}

impl MultiTransformer {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, ResourceKind)>,
        S: Into<String>,
    {
        let xfs = fields
            .into_iter()
            .map(|(field, kind)| (field.into(), (kind, ValueTransformer::new(kind.spec()))))
            .collect();
        Self { xfs }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.xfs.keys().map(String::as_str)
    }

    pub async fn xf_in(&self, session: &mut Session, values: &Record) -> Result<Record, Error> {
        self.apply(session, values, ValueTransformer::xf_in).await
    }

    pub async fn xf_out(&self, session: &mut Session, values: &Record) -> Result<Record, Error> {
        self.apply(session, values, ValueTransformer::xf_out).await
    }

    /// Each field is transformed on its own and the results merged flat.
    async fn apply(
        &self,
        session: &mut Session,
        values: &Record,
        xf: fn(&ValueTransformer, &IdentityIndex, &Record) -> Result<Record, Error>,
    ) -> Result<Record, Error> {
        let mut merged = Record::new();
        for (field, value) in values {
            let (kind, transformer) = self.xfs.get(field).ok_or_else(|| Error::Access {
                key: field.clone(),
                method: "field".into(),
            })?;

            let index = session.collection(*kind)?.cache().await?;
            let mut single = Record::new();
            single.insert(field.clone(), value.clone());
            merged.extend(xf(transformer, index, &single)?);
        }
        Ok(merged)
    }
}
