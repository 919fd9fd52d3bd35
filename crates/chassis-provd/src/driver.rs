//! ProvisioningDriver - the precommit/postcommit orchestrator.
//!
//! Each lifecycle operation runs in two phases. Precommit is the
//! durability boundary: it validates the request and records intent in
//! the mirror store inside the caller's transaction, touching no device.
//! Postcommit is the fallible boundary: it re-reads the durable record
//! (never caller state, so a replay after a crash sees the same input)
//! and issues device mutations switch by switch. When a device call on a
//! create path fails, the just-written record is deleted again as
//! compensation and the failure surfaces to the caller; device state on
//! switches updated before the failing one is left in place.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use chassis_client::{ChassisClient, ClientConfig, ClientError, RestClient};
use chassis_mirror::{MirrorStore, NetworkRecord, NetworkType, PortRecord};

use crate::config::DriverConfig;
use crate::context::{NetworkContext, PortContext, SubnetContext};
use crate::error::{DriverError, DriverResult};
use crate::resolver::{HostAttachment, HostResolver};

/// One configured switch with its device client.
struct SwitchBinding {
    address: String,
    client: Arc<dyn ChassisClient>,
}

/// Two-phase VLAN provisioning driver for a fleet of chassis switches.
///
/// Constructed once with the full switch configuration; clients are built
/// per switch at construction time and held for the driver's lifetime.
/// The driver itself is stateless between calls - the mirror store is the
/// only state it consults - so one instance may serve concurrent
/// lifecycle events.
pub struct ProvisioningDriver {
    switches: Vec<SwitchBinding>,
    resolver: HostResolver,
    store: Arc<dyn MirrorStore>,
}

impl std::fmt::Debug for ProvisioningDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningDriver")
            .field(
                "switches",
                &self
                    .switches
                    .iter()
                    .map(|binding| binding.address.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl ProvisioningDriver {
    /// Creates a driver with a REST client per configured switch.
    ///
    /// Fails when any switch requests an unsupported API version; there
    /// is no automatic downgrade, the switch is refused at startup.
    pub fn new(config: DriverConfig, store: Arc<dyn MirrorStore>) -> DriverResult<Self> {
        let mut clients: Vec<(String, Arc<dyn ChassisClient>)> =
            Vec::with_capacity(config.switches.len());
        for switch in &config.switches {
            let client_config = ClientConfig::new(
                &switch.address,
                &switch.username,
                &switch.password,
                &switch.api_version,
            );
            let client = RestClient::new(&client_config)
                .map_err(|err| DriverError::device(&switch.address, err))?;
            clients.push((switch.address.clone(), Arc::new(client)));
        }
        Self::with_clients(config, store, clients)
    }

    /// Creates a driver with caller-supplied device clients, keyed by
    /// switch address. This is the seam for alternate device-family
    /// adapters and for tests.
    pub fn with_clients(
        config: DriverConfig,
        store: Arc<dyn MirrorStore>,
        clients: Vec<(String, Arc<dyn ChassisClient>)>,
    ) -> DriverResult<Self> {
        config.log_duplicate_hosts();

        let mut switches = Vec::with_capacity(config.switches.len());
        for switch in &config.switches {
            let client = clients
                .iter()
                .find(|(address, _)| *address == switch.address)
                .map(|(_, client)| Arc::clone(client))
                .ok_or_else(|| {
                    DriverError::config(format!("no client supplied for switch {}", switch.address))
                })?;
            switches.push(SwitchBinding {
                address: switch.address.clone(),
                client,
            });
        }

        Ok(Self {
            switches,
            resolver: HostResolver::new(&config),
            store,
        })
    }

    /// Returns the configured switch addresses in iteration order.
    pub fn switch_addresses(&self) -> Vec<&str> {
        self.switches.iter().map(|b| b.address.as_str()).collect()
    }

    fn binding_for(&self, address: &str) -> DriverResult<&SwitchBinding> {
        self.switches
            .iter()
            .find(|b| b.address == address)
            .ok_or_else(|| DriverError::config(format!("no client for switch {address}")))
    }

    // --- network lifecycle -------------------------------------------------

    /// Validates the network and records it in the mirror store.
    #[instrument(skip(self, context), fields(network_id = %context.id))]
    pub async fn create_network_precommit(&self, context: &NetworkContext) -> DriverResult<()> {
        debug!("create_network_precommit called");

        let segment = match context.segments.as_slice() {
            [segment] => segment,
            [] => {
                return Err(DriverError::validation(format!(
                    "network {} has no provider segment",
                    context.id
                )))
            }
            _ => {
                return Err(DriverError::validation(format!(
                    "network {} has multiple segments, only one segment per network is supported",
                    context.id
                )))
            }
        };

        let network_type: NetworkType = segment
            .network_type
            .parse()
            .map_err(|err: chassis_mirror::UnsupportedNetworkType| {
                DriverError::validation(err.to_string())
            })?;

        if segment.segmentation_id.is_empty() {
            return Err(DriverError::validation(format!(
                "network {} has no vlan id",
                context.id
            )));
        }

        self.store
            .create_network(NetworkRecord::new(
                &context.id,
                &segment.segmentation_id,
                &segment.id,
                network_type,
                &context.tenant_id,
            ))
            .await?;

        info!(
            "create network (precommit): {} of network type = {} with vlan = {} for tenant {}",
            context.id, network_type, segment.segmentation_id, context.tenant_id
        );
        Ok(())
    }

    /// Registers the network's VLAN segment on every configured switch.
    ///
    /// Reads the network back from the mirror store rather than trusting
    /// the context, so the phase can be replayed from the store alone.
    #[instrument(skip(self, context), fields(network_id = %context.id))]
    pub async fn create_network_postcommit(&self, context: &NetworkContext) -> DriverResult<()> {
        debug!("create_network_postcommit called");

        let network = self
            .store
            .get_network(&context.id)
            .await?
            .ok_or_else(|| DriverError::network_not_found(&context.id))?;

        if network.vlan.is_empty() {
            return Err(DriverError::validation(format!(
                "network {} has no vlan id",
                network.id
            )));
        }

        for binding in &self.switches {
            if let Err(err) = self.register_segment(binding, &network.vlan).await {
                error!(
                    "Failed to add segment {} on switch {}: {}",
                    network.vlan, binding.address, err
                );
                self.compensate_network(&network.id).await;
                return Err(DriverError::device(&binding.address, err));
            }
            info!(
                "created network (postcommit): {} with vlan = {} for tenant {} on switch {}",
                network.id, network.vlan, network.tenant_id, binding.address
            );
        }
        Ok(())
    }

    /// Removes the network record from the mirror store.
    #[instrument(skip(self, context), fields(network_id = %context.id))]
    pub async fn delete_network_precommit(&self, context: &NetworkContext) -> DriverResult<()> {
        debug!("delete_network_precommit called");

        self.store.delete_network(&context.id).await?;

        info!(
            "delete network (precommit): {} for tenant {}",
            context.id, context.tenant_id
        );
        Ok(())
    }

    /// Unregisters the network's VLAN segment from every configured switch.
    ///
    /// The local record is already gone, so a device failure surfaces
    /// without further compensation.
    #[instrument(skip(self, context), fields(network_id = %context.id))]
    pub async fn delete_network_postcommit(&self, context: &NetworkContext) -> DriverResult<()> {
        debug!("delete_network_postcommit called");

        let vlan = context.segmentation_id.as_deref().ok_or_else(|| {
            DriverError::validation(format!("network {} has no vlan id", context.id))
        })?;

        for binding in &self.switches {
            if let Err(err) = self.unregister_segment(binding, vlan).await {
                error!(
                    "Failed to remove segment {} on switch {}: {}",
                    vlan, binding.address, err
                );
                return Err(DriverError::device(&binding.address, err));
            }
            info!(
                "delete network (postcommit): {} with vlan = {} for tenant {} on switch {}",
                context.id, vlan, context.tenant_id, binding.address
            );
        }
        Ok(())
    }

    /// Defined no-op, kept for interface completeness.
    pub async fn update_network_precommit(&self, _context: &NetworkContext) -> DriverResult<()> {
        debug!("update_network_precommit called");
        Ok(())
    }

    /// Defined no-op, kept for interface completeness.
    pub async fn update_network_postcommit(&self, _context: &NetworkContext) -> DriverResult<()> {
        debug!("update_network_postcommit called");
        Ok(())
    }

    // --- port lifecycle ----------------------------------------------------

    /// Resolves the owning network and records the port with its vlan.
    ///
    /// The vlan is denormalized into the port record here and never
    /// updated afterwards.
    #[instrument(skip(self, context), fields(port_id = %context.id))]
    pub async fn create_port_precommit(&self, context: &PortContext) -> DriverResult<()> {
        debug!("create_port_precommit called");

        let network = self
            .store
            .get_network(&context.network_id)
            .await?
            .ok_or_else(|| DriverError::network_not_found(&context.network_id))?;

        self.store
            .create_port(PortRecord::new(
                &context.id,
                &context.network_id,
                &network.vlan,
                &context.tenant_id,
            ))
            .await?;

        info!(
            "create port (precommit): {} on network {} with vlan = {} for tenant {}",
            context.id, context.network_id, network.vlan, context.tenant_id
        );
        Ok(())
    }

    /// Tags the port's VLAN on the attached switch.
    ///
    /// Every uplink interface on the switch is tagged, then the server's
    /// NICs (all of them unless the host map restricts the set). A host
    /// with no switch attachment is a silent no-op.
    #[instrument(skip(self, context), fields(port_id = %context.id))]
    pub async fn create_port_postcommit(&self, context: &PortContext) -> DriverResult<()> {
        debug!("create_port_postcommit called");

        let network = self
            .store
            .get_network(&context.network_id)
            .await?
            .ok_or_else(|| DriverError::network_not_found(&context.network_id))?;

        let Some(attachment) = self.resolver.resolve(&context.host_id) else {
            debug!(
                "Host '{}' has no switch attachment, nothing to configure for port {}",
                context.host_id, context.id
            );
            return Ok(());
        };

        let binding = self.binding_for(&attachment.switch_address)?;
        if let Err(err) = self
            .apply_port_tagging(binding, &attachment, &network.vlan)
            .await
        {
            error!(
                "Failed to tag vlan {} for port {} on switch {}: {}",
                network.vlan, context.id, binding.address, err
            );
            self.compensate_port(&context.id).await;
            return Err(DriverError::device(&binding.address, err));
        }

        info!(
            "created port (postcommit): port_id={} network_id={} tenant_id={} switch={} server={}",
            context.id, context.network_id, context.tenant_id,
            attachment.switch_address, attachment.server_id
        );
        Ok(())
    }

    /// Removes the port record from the mirror store.
    #[instrument(skip(self, context), fields(port_id = %context.id))]
    pub async fn delete_port_precommit(&self, context: &PortContext) -> DriverResult<()> {
        debug!("delete_port_precommit called");

        self.store.delete_port(&context.id).await?;

        info!("delete port (precommit): {}", context.id);
        Ok(())
    }

    /// Untags the port's VLAN on the attached switch.
    ///
    /// The owning network must still be in the mirror store - without it
    /// there is no way to determine which vlan to untag. No compensation
    /// on device failure; the local record is already gone.
    #[instrument(skip(self, context), fields(port_id = %context.id))]
    pub async fn delete_port_postcommit(&self, context: &PortContext) -> DriverResult<()> {
        debug!("delete_port_postcommit called");

        let network = match self.store.get_network(&context.network_id).await? {
            Some(network) => network,
            None => {
                error!(
                    "Network {} missing from mirror store, cannot determine vlan to untag for port {}",
                    context.network_id, context.id
                );
                return Err(DriverError::network_not_found(&context.network_id));
            }
        };

        let Some(attachment) = self.resolver.resolve(&context.host_id) else {
            debug!(
                "Host '{}' has no switch attachment, nothing to unconfigure for port {}",
                context.host_id, context.id
            );
            return Ok(());
        };

        let binding = self.binding_for(&attachment.switch_address)?;
        if let Err(err) = self
            .clear_port_tagging(binding, &attachment, &network.vlan)
            .await
        {
            error!(
                "Failed to untag vlan {} for port {} on switch {}: {}",
                network.vlan, context.id, binding.address, err
            );
            return Err(DriverError::device(&binding.address, err));
        }

        info!(
            "delete port (postcommit): port_id={} network_id={} tenant_id={} switch={} server={}",
            context.id, context.network_id, context.tenant_id,
            attachment.switch_address, attachment.server_id
        );
        Ok(())
    }

    /// Defined no-op, kept for interface completeness.
    pub async fn update_port_precommit(&self, _context: &PortContext) -> DriverResult<()> {
        debug!("update_port_precommit called");
        Ok(())
    }

    /// Defined no-op, kept for interface completeness.
    pub async fn update_port_postcommit(&self, _context: &PortContext) -> DriverResult<()> {
        debug!("update_port_postcommit called");
        Ok(())
    }

    // --- subnet lifecycle (defined no-ops) ---------------------------------

    /// Defined no-op, kept for interface completeness.
    pub async fn create_subnet_precommit(&self, _context: &SubnetContext) -> DriverResult<()> {
        debug!("create_subnet_precommit called");
        Ok(())
    }

    /// Defined no-op, kept for interface completeness.
    pub async fn create_subnet_postcommit(&self, _context: &SubnetContext) -> DriverResult<()> {
        debug!("create_subnet_postcommit called");
        Ok(())
    }

    /// Defined no-op, kept for interface completeness.
    pub async fn update_subnet_precommit(&self, _context: &SubnetContext) -> DriverResult<()> {
        debug!("update_subnet_precommit called");
        Ok(())
    }

    /// Defined no-op, kept for interface completeness.
    pub async fn update_subnet_postcommit(&self, _context: &SubnetContext) -> DriverResult<()> {
        debug!("update_subnet_postcommit called");
        Ok(())
    }

    /// Defined no-op, kept for interface completeness.
    pub async fn delete_subnet_precommit(&self, _context: &SubnetContext) -> DriverResult<()> {
        debug!("delete_subnet_precommit called");
        Ok(())
    }

    /// Defined no-op, kept for interface completeness.
    pub async fn delete_subnet_postcommit(&self, _context: &SubnetContext) -> DriverResult<()> {
        debug!("delete_subnet_postcommit called");
        Ok(())
    }

    // --- device helpers ----------------------------------------------------

    /// Adds a VLAN segment on the first chassis system of one switch.
    async fn register_segment(
        &self,
        binding: &SwitchBinding,
        vlan: &str,
    ) -> Result<(), ClientError> {
        let systems = binding.client.list_systems().await?;
        let system = systems
            .first()
            .ok_or_else(|| ClientError::not_found("system", &binding.address))?;
        binding.client.add_segment(&system.id, vlan).await
    }

    /// Removes a VLAN segment from the first chassis system of one switch.
    async fn unregister_segment(
        &self,
        binding: &SwitchBinding,
        vlan: &str,
    ) -> Result<(), ClientError> {
        let systems = binding.client.list_systems().await?;
        let system = systems
            .first()
            .ok_or_else(|| ClientError::not_found("system", &binding.address))?;
        binding.client.remove_segment(&system.id, vlan).await
    }

    /// Tags a VLAN on every uplink interface, then on the server's NICs.
    async fn apply_port_tagging(
        &self,
        binding: &SwitchBinding,
        attachment: &HostAttachment,
        vlan: &str,
    ) -> Result<(), ClientError> {
        let interfaces = binding.client.list_interfaces().await?;
        for interface in &interfaces {
            binding.client.add_tagged_vlan(&interface.id, vlan).await?;
        }

        let server = binding.client.get_server(&attachment.server_id).await?;
        binding
            .client
            .set_tagged_vlan(&server.id, vlan, &attachment.nics)
            .await
    }

    /// Untags a VLAN from every uplink interface and the server's NICs.
    async fn clear_port_tagging(
        &self,
        binding: &SwitchBinding,
        attachment: &HostAttachment,
        vlan: &str,
    ) -> Result<(), ClientError> {
        let interfaces = binding.client.list_interfaces().await?;
        for interface in &interfaces {
            binding
                .client
                .remove_tagged_vlan(&interface.id, vlan)
                .await?;
        }

        let server = binding.client.get_server(&attachment.server_id).await?;
        binding
            .client
            .unset_tagged_vlan(&server.id, vlan, &attachment.nics)
            .await
    }

    // --- compensation ------------------------------------------------------

    /// Deletes the network record after a failed device mutation. The
    /// device error is what surfaces; a store failure here is only logged.
    async fn compensate_network(&self, id: &str) {
        if let Err(err) = self.store.delete_network(id).await {
            warn!("Compensating delete of network {} failed: {}", id, err);
        }
    }

    /// Deletes the port record after a failed device mutation.
    async fn compensate_port(&self, id: &str) {
        if let Err(err) = self.store.delete_port(id).await {
            warn!("Compensating delete of port {} failed: {}", id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwitchConfig;
    use chassis_mirror::MemoryMirrorStore;
    use chassis_provd_test::MockChassisClient;

    fn single_switch_config() -> DriverConfig {
        DriverConfig::new(vec![SwitchConfig::new("10.0.0.5", "admin", "secret", "2")])
    }

    #[test]
    fn test_new_rejects_unsupported_api_version() {
        let config = DriverConfig::new(vec![SwitchConfig::new("10.0.0.5", "admin", "secret", "9")]);
        let store = Arc::new(MemoryMirrorStore::new());

        let err = ProvisioningDriver::new(config, store).unwrap_err();
        match err {
            DriverError::Device { switch, source } => {
                assert_eq!(switch, "10.0.0.5");
                assert!(matches!(
                    source,
                    ClientError::UnsupportedVersion { .. }
                ));
            }
            other => panic!("expected Device error, got {other:?}"),
        }
    }

    #[test]
    fn test_new_builds_client_per_switch() {
        let config = DriverConfig::new(vec![
            SwitchConfig::new("10.0.0.5", "admin", "secret", "2"),
            SwitchConfig::new("10.0.0.6", "admin", "secret", "2"),
        ]);
        let store = Arc::new(MemoryMirrorStore::new());

        let driver = ProvisioningDriver::new(config, store).unwrap();
        assert_eq!(driver.switch_addresses(), vec!["10.0.0.5", "10.0.0.6"]);
    }

    #[test]
    fn test_with_clients_requires_every_switch() {
        let config = DriverConfig::new(vec![
            SwitchConfig::new("10.0.0.5", "admin", "secret", "2"),
            SwitchConfig::new("10.0.0.6", "admin", "secret", "2"),
        ]);
        let store = Arc::new(MemoryMirrorStore::new());
        let clients: Vec<(String, Arc<dyn ChassisClient>)> = vec![(
            "10.0.0.5".to_string(),
            Arc::new(MockChassisClient::new()),
        )];

        let err = ProvisioningDriver::with_clients(config, store, clients).unwrap_err();
        assert!(matches!(err, DriverError::Config { .. }));
    }

    #[tokio::test]
    async fn test_update_and_subnet_callbacks_touch_nothing() {
        let store = Arc::new(MemoryMirrorStore::new());
        let mock = Arc::new(MockChassisClient::new());
        let clients: Vec<(String, Arc<dyn ChassisClient>)> =
            vec![("10.0.0.5".to_string(), Arc::clone(&mock) as _)];
        let driver =
            ProvisioningDriver::with_clients(single_switch_config(), Arc::clone(&store) as _, clients)
                .unwrap();

        let net = NetworkContext::new("net-1", "t1");
        let port = PortContext::new("p-1", "net-1", "t1", "h-1");
        let subnet = SubnetContext::new("s-1", "net-1", "t1");

        driver.update_network_precommit(&net).await.unwrap();
        driver.update_network_postcommit(&net).await.unwrap();
        driver.update_port_precommit(&port).await.unwrap();
        driver.update_port_postcommit(&port).await.unwrap();
        driver.create_subnet_precommit(&subnet).await.unwrap();
        driver.create_subnet_postcommit(&subnet).await.unwrap();
        driver.update_subnet_precommit(&subnet).await.unwrap();
        driver.update_subnet_postcommit(&subnet).await.unwrap();
        driver.delete_subnet_precommit(&subnet).await.unwrap();
        driver.delete_subnet_postcommit(&subnet).await.unwrap();

        assert!(mock.calls().is_empty());
        assert_eq!(store.network_count(), 0);
        assert_eq!(store.port_count(), 0);
    }
}
