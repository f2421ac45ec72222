//! Integration tests for VLSR switch control
//!
//! Tests the registry against simulated switches, including:
//! - Vendor detection and variant selection
//! - VLAN reconciliation through the Force10 interface-index table
//! - Raptor row creation
//! - Startup from configuration and preserved local IDs

use std::io::Write;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use vlsr_snmp::Credentials;
use vlsr_switchctrl::{
    encode_handle, LocalId, LocalIdMessage, SlotType, SwitchConfig, SwitchCtrlConfig,
    SwitchCtrlGlobal, Vendor, VendorModel,
};
use vlsr_switchctrl_test::{
    force10_switch, intel_switch, raptor_switch, rfc2674_switch, switch_addr, DeviceVerifier,
    MemoryAgent, PRESERVED_LOCAL_IDS,
};

fn registry(agent: &MemoryAgent) -> SwitchCtrlGlobal {
    SwitchCtrlGlobal::new(
        Arc::new(agent.clone()),
        Credentials::default(),
        VendorModel::AutoDetect,
        None,
    )
}

#[tokio::test]
async fn test_force10_vlans_through_interface_index() {
    let fixture = force10_switch();
    let agent = MemoryAgent::new().with_device(switch_addr(3), fixture.build());
    let mut global = registry(&agent);

    let session = global.get_or_create_session(switch_addr(3)).await.unwrap();
    assert_eq!(session.vendor(), Vendor::Force10E600);
    assert_eq!(session.name(), "VLSR-Force10");

    let vids: Vec<u32> = session.vlans_all().iter().map(|vpm| vpm.vid).collect();
    assert_eq!(vids, vec![1, 10, 20]);
    assert_eq!(session.get_vlan_by_untagged_port(5), 10);
    assert_eq!(session.find_empty_vlan(), 20);

    assert!(session.verify_vlan(10).await);
    assert!(!session.verify_vlan(30).await);
    assert!(session.vlan_has_tagged_port(10).await);
    assert!(!session.vlan_has_tagged_port(1).await);

    assert!(session.move_port_to_vlan_as_tagged(6, 10).await);
    let verifier = DeviceVerifier::new(&agent, switch_addr(3));
    verifier
        .assert_egress(fixture.index_of(10), &[3, 4, 5, 6])
        .unwrap();
    verifier.assert_untagged(fixture.index_of(10), &[5]).unwrap();
    assert_eq!(
        session.get_vlan_list_by_port(6).into_iter().collect::<Vec<_>>(),
        vec![1, 10]
    );
}

#[tokio::test]
async fn test_force10_cannot_create_vlans() {
    let fixture = force10_switch();
    let agent = MemoryAgent::new().with_device(switch_addr(3), fixture.build());
    let mut global = registry(&agent);

    let session = global.get_or_create_session(switch_addr(3)).await.unwrap();
    assert!(!session.create_vlan(30).await);
    assert!(!session.remove_vlan(20).await);

    let verifier = DeviceVerifier::new(&agent, switch_addr(3));
    verifier.assert_vlan_exists(fixture.index_of(20)).unwrap();
    assert!(session.vlans_all().iter().all(|vpm| vpm.vid != 30));
}

#[tokio::test]
async fn test_raptor_create_and_remove() {
    let agent = MemoryAgent::new().with_device(switch_addr(4), raptor_switch().build());
    let mut global = registry(&agent);

    let session = global.get_or_create_session(switch_addr(4)).await.unwrap();
    assert_eq!(session.name(), "VLSR-Raptor");

    assert!(session.create_vlan(55).await);
    assert!(session.is_vlan_empty(55));
    let verifier = DeviceVerifier::new(&agent, switch_addr(4));
    verifier.assert_vlan_exists(55).unwrap();

    assert!(session.move_port_to_vlan_as_untagged(7, 55).await);
    verifier.assert_untagged(55, &[7]).unwrap();
    verifier.assert_untagged(1, &[1, 2, 6, 8]).unwrap();
    verifier.assert_pvid(7, 55).unwrap();

    assert!(session.remove_vlan(55).await);
    verifier.assert_vlan_absent(55).unwrap();
}

#[tokio::test]
async fn test_intel_uses_generic_variant() {
    let agent = MemoryAgent::new().with_device(switch_addr(2), intel_switch().build());
    let mut global = registry(&agent);

    let session = global.get_or_create_session(switch_addr(2)).await.unwrap();
    assert_eq!(session.vendor(), Vendor::IntelEs530);
    assert_eq!(session.name(), "VLSR-SNMP");
    assert!(session.is_rfc2674_compatible());

    assert!(session.set_vlan_ports_tagged(0x0800_0000, 10).await);
    DeviceVerifier::new(&agent, switch_addr(2))
        .assert_untagged(10, &[])
        .unwrap();
}

#[tokio::test]
async fn test_refresh_sessions_reports_any_failure() {
    let agent = MemoryAgent::new()
        .with_device(switch_addr(1), rfc2674_switch().build())
        .with_device(switch_addr(2), intel_switch().build());
    let mut global = registry(&agent);
    global.get_or_create_session(switch_addr(1)).await.unwrap();
    global.get_or_create_session(switch_addr(2)).await.unwrap();
    assert!(global.refresh_sessions().await);

    // A new row on the healthy switch must still be picked up
    agent.update_device(switch_addr(1), |device| {
        device.insert_vlan_row(30, &[9].into_iter().collect(), &Default::default())
    });
    agent.remove_device(switch_addr(2));

    assert!(!global.refresh_sessions().await);
    let healthy = global.session(switch_addr(1)).unwrap();
    assert_eq!(healthy.get_vlan_by_port(9), 30);
    let broken = global.session(switch_addr(2)).unwrap();
    assert_eq!(broken.get_vlan_by_port(5), 10);
}

#[tokio::test]
async fn test_startup_from_config() {
    let agent = MemoryAgent::new()
        .with_device(switch_addr(1), rfc2674_switch().build())
        .with_device(switch_addr(4), raptor_switch().build());

    let mut preserved = tempfile::NamedTempFile::new().unwrap();
    preserved.write_all(PRESERVED_LOCAL_IDS.as_bytes()).unwrap();

    let config: SwitchCtrlConfig = toml::from_str(&format!(
        r#"
        [snmp]
        community = "dragon"

        [local_ids]
        preserved_path = "{}"

        [[slot]]
        number = 1
        type = "te"

        [[switch]]
        address = "{}"

        [[switch]]
        address = "{}"
        vendor_model = "raptor-er1010"

        [[switch]]
        address = "{}"

        [[local_id]]
        type = 2
        value = 100
        tags = [7]
        "#,
        preserved.path().display(),
        switch_addr(1),
        switch_addr(4),
        switch_addr(9),
    ))
    .unwrap();

    let mut global = SwitchCtrlGlobal::from_config(&config, Arc::new(agent.clone())).unwrap();
    assert_eq!(global.get_slot_type(1), SlotType::TenGigE);
    assert_eq!(global.get_slot_type(2), SlotType::Illegal);

    // Seeded tag is appended to the preserved group
    assert_eq!(
        global.get_ports_by_local_id(encode_handle(2, 100)),
        vec![5, 6, 7]
    );
    assert_eq!(global.get_ports_by_local_id(encode_handle(3, 200)), vec![1, 2, 3]);
    assert_eq!(global.get_ports_by_local_id(encode_handle(1, 8)), vec![8]);

    // The switch at .9 is unreachable and is skipped
    assert_eq!(global.open_configured_sessions(&config).await, 2);
    assert_eq!(global.session(switch_addr(4)).unwrap().name(), "VLSR-Raptor");
    assert!(global.session(switch_addr(9)).is_none());
    assert_eq!(agent.live_connections(), 2);

    global.shutdown().await;
    assert_eq!(agent.live_connections(), 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = SwitchCtrlConfig {
        switches: vec![
            SwitchConfig {
                address: switch_addr(1),
                vendor_model: None,
            },
            SwitchConfig {
                address: switch_addr(1),
                vendor_model: Some("rfc2674".to_string()),
            },
        ],
        ..Default::default()
    };

    let result = SwitchCtrlGlobal::from_config(&config, Arc::new(MemoryAgent::new()));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_local_id_messages_on_shared_registry() {
    let agent = MemoryAgent::new().with_device(switch_addr(1), rfc2674_switch().build());
    let shared = registry(&agent).into_shared();

    let writer = {
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            let mut global = shared.lock().await;
            global.process_local_id_message(&LocalIdMessage::add(LocalId::with_tags(
                3,
                300,
                [4, 5],
            )));
            global.get_or_create_session(switch_addr(1)).await.is_ok()
        })
    };
    assert!(writer.await.unwrap());

    let mut global = shared.lock().await;
    assert!(global.has_local_id(3, 300, 5));
    assert_eq!(global.get_ports_by_local_id(encode_handle(3, 300)), vec![4, 5]);

    global.process_local_id_message(&LocalIdMessage::delete(LocalId::with_tags(3, 300, [4, 5])));
    assert!(!global.has_local_id(3, 300, 0));
    assert_eq!(global.sessions().len(), 1);
}
