use anyhow::Result;
use serde::Serialize;

use super::{model_to_node, ConfigTreeBuilder};
use crate::models::{DeviceRecord, InterfaceRecord, InterfaceRole, L2Mode, Node, ObjectStatus};
use crate::utils::{is_ipv4_host_prefix, is_ipv6_host_prefix, isis_net_from_ipv4};

/// Nokia SR Linux container-per-subsystem shape, with YANG module key prefixes
pub struct SrLinuxBuilder;

#[derive(Debug, Serialize)]
struct SrlConfig {
    #[serde(rename = "srl_nokia-interfaces:interface", skip_serializing_if = "Vec::is_empty")]
    interface: Vec<SrlInterface>,
    #[serde(rename = "srl_nokia-network-instance:network-instance", skip_serializing_if = "Vec::is_empty")]
    network_instance: Vec<SrlNetworkInstance>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct SrlInterface {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vlan_tagging: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    subinterface: Vec<SrlSubinterface>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct SrlSubinterface {
    index: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vlan: Option<SrlVlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ipv4: Option<SrlAddressFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ipv6: Option<SrlAddressFamily>,
}

#[derive(Debug, Serialize)]
struct SrlVlan {
    encap: SrlEncap,
}

#[derive(Debug, Serialize)]
struct SrlEncap {
    #[serde(rename = "single-tagged")]
    single_tagged: SrlVlanId,
}

#[derive(Debug, Serialize)]
struct SrlVlanId {
    #[serde(rename = "vlan-id")]
    vlan_id: u32,
}

#[derive(Debug, Serialize)]
struct SrlAddressFamily {
    address: Vec<SrlPrefix>,
}

#[derive(Debug, Serialize)]
struct SrlPrefix {
    #[serde(rename = "ip-prefix")]
    ip_prefix: String,
}

#[derive(Debug, Serialize)]
struct SrlNetworkInstance {
    name: String,
    protocols: SrlProtocols,
}

#[derive(Debug, Serialize)]
struct SrlProtocols {
    #[serde(rename = "srl_nokia-bgp:bgp")]
    bgp: SrlBgp,
    #[serde(rename = "srl_nokia-isis:isis", skip_serializing_if = "Option::is_none")]
    isis: Option<SrlIsis>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct SrlBgp {
    #[serde(skip_serializing_if = "Option::is_none")]
    router_id: Option<String>,
    autonomous_system: u32,
    neighbor: Vec<SrlBgpNeighbor>,
    group: Vec<SrlBgpGroup>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct SrlBgpNeighbor {
    peer_address: String,
    admin_state: &'static str,
    peer_group: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct SrlBgpGroup {
    group_name: String,
    peer_as: u32,
}

#[derive(Debug, Serialize)]
struct SrlIsis {
    instance: Vec<SrlIsisInstance>,
}

#[derive(Debug, Serialize)]
struct SrlIsisInstance {
    name: String,
    net: Vec<String>,
}

fn admin_state(status: ObjectStatus) -> &'static str {
    if status == ObjectStatus::Active {
        "enable"
    } else {
        "disable"
    }
}

fn address_family(iface: &InterfaceRecord, host_prefix: fn(&str) -> bool) -> Option<SrlAddressFamily> {
    let address: Vec<SrlPrefix> = iface
        .ip_addresses
        .iter()
        .filter(|ip| host_prefix(&ip.address))
        .map(|ip| SrlPrefix { ip_prefix: ip.address.clone() })
        .collect();
    (!address.is_empty()).then_some(SrlAddressFamily { address })
}

fn uplink(iface: &InterfaceRecord) -> SrlInterface {
    SrlInterface {
        name: iface.name.clone(),
        description: iface.description.clone().filter(|d| !d.is_empty()),
        admin_state: Some(admin_state(iface.status)),
        vlan_tagging: None,
        subinterface: vec![],
    }
}

fn loopback(iface: &InterfaceRecord) -> SrlInterface {
    SrlInterface {
        name: iface.name.clone(),
        description: None,
        admin_state: None,
        vlan_tagging: None,
        subinterface: vec![SrlSubinterface {
            index: 0,
            kind: None,
            admin_state: None,
            vlan: None,
            ipv4: address_family(iface, is_ipv4_host_prefix),
            ipv6: address_family(iface, is_ipv6_host_prefix),
        }],
    }
}

/// Bridged access/trunk port; a trunk gets one tagged subinterface per VLAN
fn bridged(iface: &InterfaceRecord, mode: L2Mode) -> SrlInterface {
    let subinterface = match mode {
        L2Mode::Access => vec![SrlSubinterface {
            index: 0,
            kind: Some("bridged"),
            admin_state: Some("enable"),
            vlan: None,
            ipv4: None,
            ipv6: None,
        }],
        L2Mode::Trunk => iface
            .vlans
            .iter()
            .map(|v| SrlSubinterface {
                index: v.vlan_id,
                kind: Some("bridged"),
                admin_state: Some("enable"),
                vlan: Some(SrlVlan {
                    encap: SrlEncap {
                        single_tagged: SrlVlanId { vlan_id: v.vlan_id },
                    },
                }),
                ipv4: None,
                ipv6: None,
            })
            .collect(),
    };

    SrlInterface {
        name: iface.name.clone(),
        description: iface.description.clone().filter(|d| !d.is_empty()),
        admin_state: Some(admin_state(iface.status)),
        vlan_tagging: Some(mode == L2Mode::Trunk),
        subinterface,
    }
}

fn network_instances(device: &DeviceRecord) -> Vec<SrlNetworkInstance> {
    let Some(first) = device.bgp_sessions.first() else {
        return vec![];
    };

    let router_id = device.loopback_ipv4().map(str::to_string);
    let isis = router_id
        .as_deref()
        .and_then(isis_net_from_ipv4)
        .map(|net| SrlIsis {
            instance: vec![SrlIsisInstance {
                name: "ISIS".to_string(),
                net: vec![net],
            }],
        });

    let mut group: Vec<SrlBgpGroup> = Vec::new();
    let mut neighbor = Vec::new();
    for session in device.active_bgp_sessions() {
        if !group.iter().any(|g| g.group_name == session.peer_group) {
            group.push(SrlBgpGroup {
                group_name: session.peer_group.clone(),
                peer_as: session.remote_as,
            });
        }
        neighbor.push(SrlBgpNeighbor {
            peer_address: session.remote_ip.trim_end_matches("/128").to_string(),
            admin_state: "enable",
            peer_group: session.peer_group.clone(),
        });
    }

    vec![SrlNetworkInstance {
        name: "default".to_string(),
        protocols: SrlProtocols {
            bgp: SrlBgp {
                router_id,
                autonomous_system: first.local_as,
                neighbor,
                group,
            },
            isis,
        },
    }]
}

impl ConfigTreeBuilder for SrLinuxBuilder {
    fn name(&self) -> &'static str {
        "srlinux"
    }

    fn build(&self, device: &DeviceRecord) -> Result<Node> {
        let interface = device
            .interfaces
            .iter()
            .filter_map(|iface| match (iface.role, iface.l2_mode) {
                (InterfaceRole::Uplink, _) => Some(uplink(iface)),
                (InterfaceRole::Loopback, _) => Some(loopback(iface)),
                (InterfaceRole::Leaf, Some(mode)) => Some(bridged(iface, mode)),
                // Routed leaf ports are left to the role template
                (InterfaceRole::Leaf, None) => None,
            })
            .collect();

        model_to_node(&SrlConfig {
            interface,
            network_instance: network_instances(device),
        })
    }
}
