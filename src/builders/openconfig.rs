use anyhow::Result;
use serde::Serialize;

use super::{model_to_node, ConfigTreeBuilder, MISSING_DESCRIPTION};
use crate::models::{DeviceRecord, InterfaceRecord, Node};
use crate::utils::split_prefix;

/// OpenConfig interfaces shape (openconfig-interfaces / openconfig-if-ip),
/// used for every platform without a dedicated builder.
///
/// Keys carry their module prefix, so merging these lists by identity needs
/// prefixed names such as `openconfig-interfaces:name` in the identity registry.
pub struct OpenConfigBuilder;

#[derive(Debug, Serialize)]
struct OcDevice {
    #[serde(rename = "openconfig-interfaces:interfaces")]
    interfaces: OcInterfaces,
}

#[derive(Debug, Serialize)]
struct OcInterfaces {
    #[serde(rename = "openconfig-interfaces:interface")]
    interface: Vec<OcInterface>,
}

#[derive(Debug, Serialize)]
struct OcInterface {
    #[serde(rename = "openconfig-interfaces:name")]
    name: String,
    #[serde(rename = "openconfig-interfaces:config")]
    config: OcInterfaceConfig,
    #[serde(rename = "openconfig-interfaces:subinterfaces")]
    subinterfaces: OcSubinterfaces,
}

#[derive(Debug, Serialize)]
struct OcInterfaceConfig {
    #[serde(rename = "openconfig-interfaces:description")]
    description: String,
    #[serde(rename = "openconfig-interfaces:enabled")]
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct OcSubinterfaces {
    #[serde(rename = "openconfig-interfaces:subinterface")]
    subinterface: Vec<OcSubinterface>,
}

#[derive(Debug, Serialize)]
struct OcSubinterface {
    #[serde(rename = "openconfig-interfaces:index")]
    index: usize,
    #[serde(rename = "openconfig-interfaces:config")]
    config: OcInterfaceConfig,
    #[serde(rename = "openconfig-if-ip:ipv4")]
    ipv4: OcIpv4,
}

#[derive(Debug, Serialize)]
struct OcIpv4 {
    #[serde(rename = "openconfig-if-ip:addresses")]
    addresses: OcAddresses,
    #[serde(rename = "openconfig-if-ip:config")]
    config: OcIpv4Config,
}

#[derive(Debug, Serialize)]
struct OcIpv4Config {
    #[serde(rename = "openconfig-if-ip:enabled")]
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct OcAddresses {
    #[serde(rename = "openconfig-if-ip:address")]
    address: Vec<OcAddress>,
}

#[derive(Debug, Serialize)]
struct OcAddress {
    #[serde(rename = "openconfig-if-ip:ip")]
    ip: String,
    #[serde(rename = "openconfig-if-ip:config")]
    config: OcAddressConfig,
}

#[derive(Debug, Serialize)]
struct OcAddressConfig {
    #[serde(rename = "openconfig-if-ip:ip")]
    ip: String,
    #[serde(rename = "openconfig-if-ip:prefix-length", skip_serializing_if = "Option::is_none")]
    prefix_length: Option<u8>,
}

fn interface_config(iface: &InterfaceRecord) -> OcInterfaceConfig {
    OcInterfaceConfig {
        description: iface
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| MISSING_DESCRIPTION.to_string()),
        enabled: iface.enabled,
    }
}

/// One subinterface per address, indexed by position
fn interface(iface: &InterfaceRecord) -> OcInterface {
    let subinterface = iface
        .ip_addresses
        .iter()
        .enumerate()
        .map(|(index, ip)| {
            let (addr, prefix_length) = split_prefix(&ip.address);
            OcSubinterface {
                index,
                config: interface_config(iface),
                ipv4: OcIpv4 {
                    addresses: OcAddresses {
                        address: vec![OcAddress {
                            ip: addr.to_string(),
                            config: OcAddressConfig {
                                ip: addr.to_string(),
                                prefix_length,
                            },
                        }],
                    },
                    config: OcIpv4Config { enabled: iface.enabled },
                },
            }
        })
        .collect();

    OcInterface {
        name: iface.name.clone(),
        config: interface_config(iface),
        subinterfaces: OcSubinterfaces { subinterface },
    }
}

impl ConfigTreeBuilder for OpenConfigBuilder {
    fn name(&self) -> &'static str {
        "openconfig"
    }

    fn build(&self, device: &DeviceRecord) -> Result<Node> {
        model_to_node(&OcDevice {
            interfaces: OcInterfaces {
                interface: device.interfaces.iter().map(interface).collect(),
            },
        })
    }
}
