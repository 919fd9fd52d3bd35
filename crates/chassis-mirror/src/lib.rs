//! chassis-mirror - local mirror of provisioned networks and ports
//!
//! The mirror store is the durable record of provisioning intent: network
//! and port records are written here before any switch is touched, and are
//! removed again when the device-side mutation fails. Create operations are
//! idempotent by existence, delete operations idempotent by absence, so the
//! provisioning driver can replay either phase without double-applying.

mod error;
mod records;
mod store;

pub use error::{StoreError, StoreResult};
pub use records::{NetworkRecord, NetworkType, PortRecord, UnsupportedNetworkType};
pub use store::{MemoryMirrorStore, MirrorStore};
