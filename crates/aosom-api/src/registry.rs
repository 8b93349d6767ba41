//! Resource registry: which list endpoint serves which resource type, and
//! which record fields carry the display name and the unique ID.
//!
//! The table is static. Looking up a name that is not in it fails with
//! [`Error::UnknownResource`].

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::collection::IndexMethod;
use crate::error::Error;

/// Per-resource-type configuration handed to a [`Collection`](crate::Collection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Path below the API root (or below a parent item for nested
    /// collections), e.g. `resources/ip-pools`.
    pub uri: String,
    /// Record field holding the user-assigned name.
    pub display_name: String,
    /// Record field holding the server-assigned ID.
    pub unique_id: String,
}

impl ResourceSpec {
    pub fn new(
        uri: impl Into<String>,
        display_name: impl Into<String>,
        unique_id: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            display_name: display_name.into(),
            unique_id: unique_id.into(),
        }
    }

    /// Spec with the common `display_name` / `id` field pair.
    pub fn named(uri: impl Into<String>) -> Self {
        Self::new(uri, "display_name", "id")
    }

    /// Virtual networks live below a blueprint, not the API root.
    pub fn virtual_networks() -> Self {
        Self::named("virtual-networks")
    }

    /// Field name backing an index.
    pub fn field(&self, method: IndexMethod) -> &str {
        match method {
            IndexMethod::Name => &self.display_name,
            IndexMethod::Id => &self.unique_id,
        }
    }

    /// Resolve a find-method given as a field name to an index.
    ///
    /// When both fields are the same (e.g. alerts, which have no human
    /// name) the name index is used; both indices are identical then.
    pub fn index_method(&self, method: &str) -> Result<IndexMethod, Error> {
        if method == self.display_name {
            Ok(IndexMethod::Name)
        } else if method == self.unique_id {
            Ok(IndexMethod::Id)
        } else {
            Err(Error::UnknownIndex {
                method: method.to_owned(),
            })
        }
    }
}

/// Session-level resource types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString, IntoStaticStr,
)]
pub enum ResourceKind {
    #[strum(to_string = "Alerts", serialize = "alerts")]
    Alerts,
    #[strum(to_string = "AsnPools", serialize = "asn_pools")]
    AsnPools,
    #[strum(to_string = "Blueprints", serialize = "blueprints")]
    Blueprints,
    #[strum(to_string = "DesignTemplates", serialize = "design_templates")]
    DesignTemplates,
    #[strum(to_string = "Devices", serialize = "devices")]
    Devices,
    #[strum(to_string = "ExternalRouters", serialize = "ext_rtrs", serialize = "external_routers")]
    ExternalRouters,
    #[strum(to_string = "IpPools", serialize = "ip_pools")]
    IpPools,
    #[strum(to_string = "LogicalDevices", serialize = "logical_devices")]
    LogicalDevices,
    #[strum(to_string = "LogicalDeviceMaps", serialize = "logical_device_maps")]
    LogicalDeviceMaps,
    #[strum(to_string = "RackTypes", serialize = "rack_types", serialize = "design_racktypes")]
    RackTypes,
}

impl ResourceKind {
    /// Look up a resource type by registry name (`IpPools`) or module
    /// alias (`ip_pools`).
    pub fn lookup(name: &str) -> Result<Self, Error> {
        name.parse().map_err(|_| Error::UnknownResource {
            name: name.to_owned(),
        })
    }

    /// Every registered resource type, in registry order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    pub fn spec(self) -> ResourceSpec {
        match self {
            // alerts have no human readable unique name
            Self::Alerts => ResourceSpec::new("alerts", "id", "id"),
            Self::AsnPools => ResourceSpec::named("resources/asn-pools"),
            Self::Blueprints => ResourceSpec::named("blueprints"),
            Self::DesignTemplates => ResourceSpec::named("design/templates"),
            Self::Devices => ResourceSpec::new("systems", "device_key", "id"),
            Self::ExternalRouters => ResourceSpec::named("resources/external-routers"),
            Self::IpPools => ResourceSpec::named("resources/ip-pools"),
            Self::LogicalDevices => ResourceSpec::named("design/logical-devices"),
            Self::LogicalDeviceMaps => ResourceSpec::named("design/logical-device-maps"),
            Self::RackTypes => ResourceSpec::named("design/rack-types"),
        }
    }
}
