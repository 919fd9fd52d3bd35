//! Mirror store trait and in-memory backend.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::StoreResult;
use crate::records::{NetworkRecord, PortRecord};

/// Transactional store of provisioned networks and ports.
///
/// The store is the single shared mutable resource of the provisioning
/// core. Mutations for one logical ID serialize against each other while
/// disjoint IDs proceed independently.
///
/// # Contract
///
/// - `create_*` is idempotent by existence: if a record with the same ID
///   already exists it is returned unchanged and the new fields are
///   discarded (upsert-read, not upsert-write).
/// - `delete_*` is idempotent by absence: deleting a missing ID returns
///   `None`, never an error.
/// - Lookups distinguish "absent" (`Ok(None)`) from backend failure
///   (`Err`); callers branch on absence without treating it as failure.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Records a network, or returns the existing record for the same ID.
    async fn create_network(&self, network: NetworkRecord) -> StoreResult<NetworkRecord>;

    /// Looks up a network by logical ID.
    async fn get_network(&self, id: &str) -> StoreResult<Option<NetworkRecord>>;

    /// Removes a network, returning the deleted record if it existed.
    async fn delete_network(&self, id: &str) -> StoreResult<Option<NetworkRecord>>;

    /// Lists all networks. Diagnostic/replay use, not on the hot path.
    async fn get_networks(&self) -> StoreResult<Vec<NetworkRecord>>;

    /// Records a port, or returns the existing record for the same ID.
    async fn create_port(&self, port: PortRecord) -> StoreResult<PortRecord>;

    /// Looks up a port by logical ID.
    async fn get_port(&self, id: &str) -> StoreResult<Option<PortRecord>>;

    /// Removes a port, returning the deleted record if it existed.
    async fn delete_port(&self, id: &str) -> StoreResult<Option<PortRecord>>;

    /// Lists ports, optionally restricted to one owning network.
    async fn get_ports(&self, network_id: Option<&str>) -> StoreResult<Vec<PortRecord>>;
}

/// In-memory mirror store backend.
///
/// Records live in sharded maps keyed by logical ID; the entry API makes
/// each read-check-write a single atomic unit per key, so concurrent
/// creates for the same ID cannot double-insert while disjoint IDs never
/// block each other.
#[derive(Debug, Default)]
pub struct MemoryMirrorStore {
    networks: DashMap<String, NetworkRecord>,
    ports: DashMap<String, PortRecord>,
}

impl MemoryMirrorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of network records.
    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    /// Returns the number of port records.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}

#[async_trait]
impl MirrorStore for MemoryMirrorStore {
    async fn create_network(&self, network: NetworkRecord) -> StoreResult<NetworkRecord> {
        let entry = self
            .networks
            .entry(network.id.clone())
            .or_insert_with(|| {
                debug!("Recorded network {}", network.id);
                network
            });
        Ok(entry.value().clone())
    }

    async fn get_network(&self, id: &str) -> StoreResult<Option<NetworkRecord>> {
        Ok(self.networks.get(id).map(|r| r.value().clone()))
    }

    async fn delete_network(&self, id: &str) -> StoreResult<Option<NetworkRecord>> {
        let removed = self.networks.remove(id).map(|(_, record)| record);
        if removed.is_some() {
            debug!("Removed network {}", id);
        }
        Ok(removed)
    }

    async fn get_networks(&self) -> StoreResult<Vec<NetworkRecord>> {
        Ok(self.networks.iter().map(|r| r.value().clone()).collect())
    }

    async fn create_port(&self, port: PortRecord) -> StoreResult<PortRecord> {
        let entry = self.ports.entry(port.id.clone()).or_insert_with(|| {
            debug!("Recorded port {}", port.id);
            port
        });
        Ok(entry.value().clone())
    }

    async fn get_port(&self, id: &str) -> StoreResult<Option<PortRecord>> {
        Ok(self.ports.get(id).map(|r| r.value().clone()))
    }

    async fn delete_port(&self, id: &str) -> StoreResult<Option<PortRecord>> {
        let removed = self.ports.remove(id).map(|(_, record)| record);
        if removed.is_some() {
            debug!("Removed port {}", id);
        }
        Ok(removed)
    }

    async fn get_ports(&self, network_id: Option<&str>) -> StoreResult<Vec<PortRecord>> {
        Ok(self
            .ports
            .iter()
            .filter(|r| network_id.is_none_or(|id| r.value().network_id == id))
            .map(|r| r.value().clone())
            .collect())
    }
}
