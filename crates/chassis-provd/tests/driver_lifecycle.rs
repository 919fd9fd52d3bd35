//! End-to-end lifecycle tests for the provisioning driver against a
//! recording mock device client.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use chassis_client::ChassisClient;
use chassis_mirror::{MemoryMirrorStore, MirrorStore, NetworkRecord, NetworkType};
use chassis_provd::{
    DriverConfig, DriverError, NetworkContext, PortContext, ProvisioningDriver, SegmentDescriptor,
    SwitchConfig,
};
use chassis_provd_test::{DeviceCall, DeviceOp, MockChassisClient};

struct Harness {
    store: Arc<MemoryMirrorStore>,
    mocks: Vec<Arc<MockChassisClient>>,
    driver: ProvisioningDriver,
}

/// Two switches: `10.0.0.5` maps `h-1 -> srv-7,eth0,eth1`; `10.0.0.6`
/// maps `h-2 -> srv-2` (no NIC restriction).
fn harness() -> Harness {
    let config = DriverConfig::new(vec![
        SwitchConfig::new("10.0.0.5", "admin", "secret", "2").with_host("h-1", "srv-7,eth0,eth1"),
        SwitchConfig::new("10.0.0.6", "admin", "secret", "2").with_host("h-2", "srv-2"),
    ]);

    let mock5 = Arc::new(
        MockChassisClient::new()
            .with_interfaces(&["intf-1", "intf-2"])
            .with_server("srv-7", &["eth0", "eth1", "eth2"]),
    );
    let mock6 = Arc::new(
        MockChassisClient::new()
            .with_interfaces(&["intf-1"])
            .with_server("srv-2", &["eth0"]),
    );

    let store = Arc::new(MemoryMirrorStore::new());
    let clients: Vec<(String, Arc<dyn ChassisClient>)> = vec![
        ("10.0.0.5".to_string(), Arc::clone(&mock5) as _),
        ("10.0.0.6".to_string(), Arc::clone(&mock6) as _),
    ];
    let driver =
        ProvisioningDriver::with_clients(config, Arc::clone(&store) as _, clients).unwrap();

    Harness {
        store,
        mocks: vec![mock5, mock6],
        driver,
    }
}

fn vlan_network(id: &str, vlan: &str) -> NetworkContext {
    NetworkContext::new(id, "t1").with_segment(SegmentDescriptor::vlan(vlan, "seg-1"))
}

#[tokio::test]
async fn create_network_records_then_tags_every_switch() {
    let h = harness();
    let context = vlan_network("net-1", "42");

    h.driver.create_network_precommit(&context).await.unwrap();

    let record = h.store.get_network("net-1").await.unwrap().unwrap();
    assert_eq!(
        record,
        NetworkRecord::new("net-1", "42", "seg-1", NetworkType::Vlan, "t1")
    );
    // Precommit touches no device.
    assert!(h.mocks.iter().all(|m| m.calls().is_empty()));

    h.driver.create_network_postcommit(&context).await.unwrap();

    for mock in &h.mocks {
        assert_eq!(
            mock.calls(),
            vec![
                DeviceCall::ListSystems,
                DeviceCall::AddSegment {
                    system_id: "sys-0".to_string(),
                    vlan_id: "42".to_string(),
                },
            ]
        );
    }
}

#[tokio::test]
async fn create_network_precommit_rejects_unsupported_type() {
    let h = harness();
    let context = NetworkContext::new("net-1", "t1")
        .with_segment(SegmentDescriptor::new("vxlan", "42", "seg-1"));

    let err = h.driver.create_network_precommit(&context).await.unwrap_err();
    assert!(matches!(err, DriverError::Validation { .. }));

    // Nothing was written, nothing to compensate.
    assert!(h.store.get_network("net-1").await.unwrap().is_none());
}

#[tokio::test]
async fn create_network_precommit_requires_exactly_one_segment() {
    let h = harness();

    let none = NetworkContext::new("net-1", "t1");
    assert!(matches!(
        h.driver.create_network_precommit(&none).await.unwrap_err(),
        DriverError::Validation { .. }
    ));

    let two = vlan_network("net-1", "42").with_segment(SegmentDescriptor::vlan("43", "seg-2"));
    assert!(matches!(
        h.driver.create_network_precommit(&two).await.unwrap_err(),
        DriverError::Validation { .. }
    ));

    let empty_vlan = NetworkContext::new("net-1", "t1")
        .with_segment(SegmentDescriptor::vlan("", "seg-1"));
    assert!(matches!(
        h.driver
            .create_network_precommit(&empty_vlan)
            .await
            .unwrap_err(),
        DriverError::Validation { .. }
    ));
}

#[tokio::test]
async fn create_network_precommit_replay_keeps_first_write() {
    let h = harness();

    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();
    // A replay with different attributes is a read-through no-op.
    h.driver
        .create_network_precommit(&vlan_network("net-1", "99"))
        .await
        .unwrap();

    let record = h.store.get_network("net-1").await.unwrap().unwrap();
    assert_eq!(record.vlan, "42");
}

#[tokio::test]
async fn create_network_postcommit_without_record_is_fatal() {
    let h = harness();

    let err = h
        .driver
        .create_network_postcommit(&vlan_network("net-9", "42"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::NetworkNotFound { .. }));
    assert!(h.mocks.iter().all(|m| m.calls().is_empty()));
}

#[tokio::test]
async fn device_failure_compensates_network_record() {
    let h = harness();
    let context = vlan_network("net-1", "42");
    h.mocks[0].set_failure(DeviceOp::AddSegment, true);

    h.driver.create_network_precommit(&context).await.unwrap();
    let err = h.driver.create_network_postcommit(&context).await.unwrap_err();

    match err {
        DriverError::Device { switch, .. } => assert_eq!(switch, "10.0.0.5"),
        other => panic!("expected Device error, got {other:?}"),
    }
    // Compensation removed the record; the second switch was never reached.
    assert!(h.store.get_network("net-1").await.unwrap().is_none());
    assert!(h.mocks[1].calls().is_empty());
}

#[tokio::test]
async fn partial_application_leaves_earlier_switches_tagged() {
    let h = harness();
    let context = vlan_network("net-1", "42");
    h.mocks[1].set_failure(DeviceOp::AddSegment, true);

    h.driver.create_network_precommit(&context).await.unwrap();
    let err = h.driver.create_network_postcommit(&context).await.unwrap_err();
    assert!(matches!(err, DriverError::Device { .. }));

    // The first switch was tagged and stays tagged: compensation reverts
    // only the local record, never already-updated devices.
    assert_eq!(
        h.mocks[0].mutations(),
        vec![DeviceCall::AddSegment {
            system_id: "sys-0".to_string(),
            vlan_id: "42".to_string(),
        }]
    );
    assert!(h.store.get_network("net-1").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_network_removes_record_then_segments() {
    let h = harness();
    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();

    let context = NetworkContext::new("net-1", "t1").with_segmentation_id("42");
    h.driver.delete_network_precommit(&context).await.unwrap();
    assert!(h.store.get_network("net-1").await.unwrap().is_none());

    // Deleting an already-absent network is not an error.
    h.driver.delete_network_precommit(&context).await.unwrap();

    h.driver.delete_network_postcommit(&context).await.unwrap();
    for mock in &h.mocks {
        assert_eq!(
            mock.mutations(),
            vec![DeviceCall::RemoveSegment {
                system_id: "sys-0".to_string(),
                vlan_id: "42".to_string(),
            }]
        );
    }
}

#[tokio::test]
async fn delete_network_postcommit_failure_has_no_compensation() {
    let h = harness();
    h.mocks[0].set_failure(DeviceOp::RemoveSegment, true);

    let context = NetworkContext::new("net-1", "t1").with_segmentation_id("42");
    let err = h.driver.delete_network_postcommit(&context).await.unwrap_err();
    assert!(matches!(err, DriverError::Device { .. }));

    // Processing stopped at the failing switch.
    assert!(h.mocks[1].calls().is_empty());
}

#[tokio::test]
async fn create_port_precommit_denormalizes_network_vlan() {
    let h = harness();

    let missing = PortContext::new("p-1", "net-9", "t1", "h-1");
    assert!(matches!(
        h.driver.create_port_precommit(&missing).await.unwrap_err(),
        DriverError::NetworkNotFound { .. }
    ));

    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();
    h.driver
        .create_port_precommit(&PortContext::new("p-1", "net-1", "t1", "h-1"))
        .await
        .unwrap();

    let port = h.store.get_port("p-1").await.unwrap().unwrap();
    assert_eq!(port.network_id, "net-1");
    assert_eq!(port.vlan_id, "42");
    assert_eq!(port.tenant_id, "t1");
}

#[tokio::test]
async fn port_vlan_is_frozen_at_creation() {
    let h = harness();
    h.driver
        .create_network_precommit(&vlan_network("net-1", "100"))
        .await
        .unwrap();
    h.driver
        .create_port_precommit(&PortContext::new("p-1", "net-1", "t1", "h-1"))
        .await
        .unwrap();

    // Swap the network's vlan directly in the store (vlan updates are not
    // supported through the driver).
    h.store.delete_network("net-1").await.unwrap();
    h.store
        .create_network(NetworkRecord::new(
            "net-1",
            "200",
            "seg-1",
            NetworkType::Vlan,
            "t1",
        ))
        .await
        .unwrap();

    let port = h.store.get_port("p-1").await.unwrap().unwrap();
    assert_eq!(port.vlan_id, "100");
}

#[tokio::test]
async fn create_port_postcommit_tags_interfaces_and_restricted_nics() {
    let h = harness();
    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();
    let context = PortContext::new("p-1", "net-1", "t1", "h-1");
    h.driver.create_port_precommit(&context).await.unwrap();

    h.driver.create_port_postcommit(&context).await.unwrap();

    assert_eq!(
        h.mocks[0].calls(),
        vec![
            DeviceCall::ListInterfaces,
            DeviceCall::AddTaggedVlan {
                interface_id: "intf-1".to_string(),
                vlan_id: "42".to_string(),
            },
            DeviceCall::AddTaggedVlan {
                interface_id: "intf-2".to_string(),
                vlan_id: "42".to_string(),
            },
            DeviceCall::GetServer {
                server_id: "srv-7".to_string(),
            },
            DeviceCall::SetTaggedVlan {
                server_id: "srv-7".to_string(),
                vlan_id: "42".to_string(),
                nics: vec!["eth0".to_string(), "eth1".to_string()],
            },
        ]
    );
    // The port's host hangs off the first switch only.
    assert!(h.mocks[1].calls().is_empty());
}

#[tokio::test]
async fn create_port_postcommit_without_nic_restriction_tags_whole_server() {
    let h = harness();
    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();
    let context = PortContext::new("p-2", "net-1", "t1", "h-2");
    h.driver.create_port_precommit(&context).await.unwrap();

    h.driver.create_port_postcommit(&context).await.unwrap();

    let calls = h.mocks[1].calls();
    assert!(calls.contains(&DeviceCall::SetTaggedVlan {
        server_id: "srv-2".to_string(),
        vlan_id: "42".to_string(),
        nics: vec![],
    }));
}

#[tokio::test]
async fn create_port_postcommit_unknown_host_is_silent_noop() {
    let h = harness();
    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();
    let context = PortContext::new("p-1", "net-1", "t1", "h-404");
    h.driver.create_port_precommit(&context).await.unwrap();

    h.driver.create_port_postcommit(&context).await.unwrap();

    assert!(h.mocks.iter().all(|m| m.calls().is_empty()));
    // The port record survives - nothing failed.
    assert!(h.store.get_port("p-1").await.unwrap().is_some());
}

#[tokio::test]
async fn create_port_postcommit_failure_compensates_port_record() {
    let h = harness();
    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();
    let context = PortContext::new("p-1", "net-1", "t1", "h-1");
    h.driver.create_port_precommit(&context).await.unwrap();

    h.mocks[0].set_failure(DeviceOp::SetTaggedVlan, true);
    let err = h.driver.create_port_postcommit(&context).await.unwrap_err();

    match err {
        DriverError::Device { switch, .. } => assert_eq!(switch, "10.0.0.5"),
        other => panic!("expected Device error, got {other:?}"),
    }
    // The port record is compensated away; the network stays.
    assert!(h.store.get_port("p-1").await.unwrap().is_none());
    assert!(h.store.get_network("net-1").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_port_untags_interfaces_and_server() {
    let h = harness();
    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();
    let context = PortContext::new("p-1", "net-1", "t1", "h-1");
    h.driver.create_port_precommit(&context).await.unwrap();

    h.driver.delete_port_precommit(&context).await.unwrap();
    assert!(h.store.get_port("p-1").await.unwrap().is_none());

    h.driver.delete_port_postcommit(&context).await.unwrap();

    assert_eq!(
        h.mocks[0].mutations(),
        vec![
            DeviceCall::RemoveTaggedVlan {
                interface_id: "intf-1".to_string(),
                vlan_id: "42".to_string(),
            },
            DeviceCall::RemoveTaggedVlan {
                interface_id: "intf-2".to_string(),
                vlan_id: "42".to_string(),
            },
            DeviceCall::UnsetTaggedVlan {
                server_id: "srv-7".to_string(),
                vlan_id: "42".to_string(),
                nics: vec!["eth0".to_string(), "eth1".to_string()],
            },
        ]
    );
}

#[tokio::test]
async fn delete_port_postcommit_needs_network_for_vlan() {
    let h = harness();
    let context = PortContext::new("p-1", "net-1", "t1", "h-1");

    let err = h.driver.delete_port_postcommit(&context).await.unwrap_err();
    assert!(matches!(err, DriverError::NetworkNotFound { .. }));
    assert!(h.mocks.iter().all(|m| m.calls().is_empty()));
}

#[tokio::test]
async fn delete_port_postcommit_unknown_host_is_silent_noop() {
    let h = harness();
    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();

    let context = PortContext::new("p-1", "net-1", "t1", "h-404");
    h.driver.delete_port_postcommit(&context).await.unwrap();

    assert!(h.mocks.iter().all(|m| m.calls().is_empty()));
}

#[tokio::test]
async fn delete_port_postcommit_failure_has_no_compensation() {
    let h = harness();
    h.driver
        .create_network_precommit(&vlan_network("net-1", "42"))
        .await
        .unwrap();
    let context = PortContext::new("p-1", "net-1", "t1", "h-1");
    h.mocks[0].set_failure(DeviceOp::UnsetTaggedVlan, true);

    let err = h.driver.delete_port_postcommit(&context).await.unwrap_err();
    assert!(matches!(err, DriverError::Device { .. }));

    // The network record is untouched by a failed port untag.
    assert!(h.store.get_network("net-1").await.unwrap().is_some());
}
