use anyhow::Result;
use serde::Serialize;

use super::{model_to_node, ConfigTreeBuilder, MISSING_DESCRIPTION};
use crate::models::{DeviceRecord, InterfaceRecord, L2Mode, Node};

/// Arista EOS flat shape: one record per interface and a `router_bgp` block,
/// laid out close to the CLI so a text template can render it line by line.
pub struct EosBuilder;

#[derive(Debug, Serialize)]
struct EosConfig {
    hostname: String,
    interfaces: Vec<EosInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    router_bgp: Option<EosRouterBgp>,
}

#[derive(Debug, Serialize)]
struct EosInterface {
    name: String,
    description: String,
    shutdown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    switchport: Option<EosSwitchport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ip_addresses: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EosSwitchport {
    mode: &'static str,
    vlans: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct EosRouterBgp {
    #[serde(rename = "as")]
    local_as: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    router_id: Option<String>,
    peer_groups: Vec<EosPeerGroup>,
    neighbors: Vec<EosNeighbor>,
}

#[derive(Debug, Serialize)]
struct EosPeerGroup {
    #[serde(rename = "group-name")]
    group_name: String,
    remote_as: u32,
}

#[derive(Debug, Serialize)]
struct EosNeighbor {
    #[serde(rename = "peer-address")]
    peer_address: String,
    peer_group: String,
}

fn interface(iface: &InterfaceRecord) -> EosInterface {
    let switchport = iface.l2_mode.map(|mode| EosSwitchport {
        mode: match mode {
            L2Mode::Access => "access",
            L2Mode::Trunk => "trunk",
        },
        vlans: iface.vlans.iter().map(|v| v.vlan_id).collect(),
    });

    EosInterface {
        name: iface.name.clone(),
        description: iface
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| MISSING_DESCRIPTION.to_string()),
        shutdown: !iface.enabled,
        // Routed ports only
        ip_addresses: if switchport.is_none() {
            iface.ip_addresses.iter().map(|ip| ip.address.clone()).collect()
        } else {
            vec![]
        },
        switchport,
    }
}

fn router_bgp(device: &DeviceRecord) -> Option<EosRouterBgp> {
    let first = device.bgp_sessions.first()?;

    let mut peer_groups: Vec<EosPeerGroup> = Vec::new();
    let mut neighbors = Vec::new();
    for session in device.active_bgp_sessions() {
        if !peer_groups.iter().any(|g| g.group_name == session.peer_group) {
            peer_groups.push(EosPeerGroup {
                group_name: session.peer_group.clone(),
                remote_as: session.remote_as,
            });
        }
        neighbors.push(EosNeighbor {
            peer_address: session.remote_ip.clone(),
            peer_group: session.peer_group.clone(),
        });
    }

    Some(EosRouterBgp {
        local_as: first.local_as,
        router_id: device.loopback_ipv4().map(str::to_string),
        peer_groups,
        neighbors,
    })
}

impl ConfigTreeBuilder for EosBuilder {
    fn name(&self) -> &'static str {
        "eos"
    }

    fn build(&self, device: &DeviceRecord) -> Result<Node> {
        model_to_node(&EosConfig {
            hostname: device.name.clone(),
            interfaces: device.interfaces.iter().map(interface).collect(),
            router_bgp: router_bgp(device),
        })
    }
}
