// aosom-api: Async Rust client for the AOS fabric controller REST API
//
// Every network call is an `async fn` awaited by the caller; nothing in
// the crate spawns tasks or issues requests in parallel.

pub mod api;
pub mod blueprint;
pub mod collection;
pub mod device;
pub mod error;
pub mod registry;
pub mod session;
pub mod transport;
pub mod version;

mod poll;
mod record;

pub use api::{Api, AuthHeader};
pub use blueprint::{Blueprint, Cabling, SlotParam, SlotParams};
pub use collection::{
    Collection, IdentityIndex, IndexMethod, Item, Items, MultiTransformer, ValueTransformer,
};
pub use device::{ApprovedPool, Device};
pub use error::{Error, ErrorResponse};
pub use poll::POLL_INTERVAL;
pub use record::Record;
pub use registry::{ResourceKind, ResourceSpec};
pub use session::{Session, SessionConfig};
pub use transport::{DEFAULT_PORT, TransportConfig};
pub use version::ApiVersion;
