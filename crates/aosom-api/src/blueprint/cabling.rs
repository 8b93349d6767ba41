use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::Error;
use crate::record::Record;

/// Physical links of a blueprint, from `contents.system.links`.
///
/// Each link carries a `display_name` such as `spine1<->leaf1[1]`, a
/// `role`, and two `endpoints` with the node `id` and `interface`.
#[derive(Debug, Clone)]
pub struct Cabling {
    links: Vec<Record>,
}

impl Cabling {
    pub fn from_contents(contents: &Record) -> Result<Self, Error> {
        let links = contents
            .get("system")
            .and_then(|system| system.get("links"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::shape(
                    "blueprint contents have no system.links",
                    &Value::Object(contents.clone()),
                )
            })?;

        let links = links
            .iter()
            .filter_map(|link| link.as_object().cloned())
            .collect();
        Ok(Self { links })
    }

    pub fn links(&self) -> &[Record] {
        &self.links
    }

    pub fn names(&self) -> Vec<&str> {
        self.links.iter().filter_map(|l| text(l, "display_name")).collect()
    }

    pub fn roles(&self) -> BTreeSet<&str> {
        self.links.iter().filter_map(|l| text(l, "role")).collect()
    }

    pub fn find_by_role(&self, role: &str) -> Vec<&Record> {
        self.links
            .iter()
            .filter(|l| text(l, "role") == Some(role))
            .collect()
    }

    /// Links with an endpoint on `node`.
    pub fn find_by_node(&self, node: &str) -> Vec<&Record> {
        self.links.iter().filter(|l| touches(l, node)).collect()
    }

    /// Links between `a` and `b`.
    pub fn find_by_nodepair(&self, a: &str, b: &str) -> Vec<&Record> {
        self.links
            .iter()
            .filter(|l| touches(l, a) && touches(l, b))
            .collect()
    }

    /// The far-side endpoints of every link touching `node`.
    pub fn peer_endpoints(&self, node: &str) -> Vec<&Value> {
        self.find_by_node(node)
            .into_iter()
            .flat_map(|l| endpoints(l).iter())
            .filter(|e| e.get("id").and_then(Value::as_str) != Some(node))
            .collect()
    }

    /// One row per link: `[name, left node, left intf, right node, right intf]`.
    ///
    /// Node order follows the link name (`left<->right[n]`); the interface
    /// of each endpoint is placed after its node.
    pub fn flat_list(&self) -> Result<Vec<Vec<String>>, Error> {
        self.links.iter().map(flat_row).collect()
    }
}

fn flat_row(link: &Record) -> Result<Vec<String>, Error> {
    let name = text(link, "display_name").unwrap_or_default();
    let (left, right) = name.split_once("<->").unwrap_or((name, ""));
    let right = right.split_once('[').map_or(right, |(node, _)| node);

    let mut row = vec![name.to_owned(), left.to_owned(), right.to_owned()];
    for end in endpoints(link) {
        let id = end.get("id").and_then(Value::as_str).unwrap_or_default();
        let interface = end.get("interface").and_then(Value::as_str).unwrap_or_default();
        let pos = row.iter().position(|cell| cell == id).ok_or_else(|| {
            Error::shape(
                format!("link '{name}' endpoint '{id}' is not named in the link"),
                &Value::Object(link.clone()),
            )
        })?;
        row.insert(pos + 1, interface.to_owned());
    }
    Ok(row)
}

fn text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

fn endpoints(link: &Record) -> &[Value] {
    link.get("endpoints")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
}

fn touches(link: &Record, node: &str) -> bool {
    endpoints(link)
        .iter()
        .any(|e| e.get("id").and_then(Value::as_str) == Some(node))
}
