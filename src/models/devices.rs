use serde::{Deserialize, Serialize};

/// Canonical platform names used to pick a config tree shape
pub mod platform {
    pub const NOKIA_SRL: &str = "Nokia SR Linux";
    pub const ARISTA_EOS: &str = "Arista EOS";
}

/// Lifecycle status shared by interfaces and BGP sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStatus {
    Active,
    Provisioning,
    Maintenance,
}

/// Operational role of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceRole {
    Uplink,
    Leaf,
    Loopback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum L2Mode {
    #[serde(alias = "access")]
    Access,
    #[serde(alias = "trunk")]
    Trunk,
}

/// IpAddressRecord holds an address in CIDR notation, e.g. "10.0.0.1/32"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressRecord {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRecord {
    pub vlan_id: u32,
}

/// InterfaceRecord is one normalized device interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub enabled: bool,
    pub status: ObjectStatus,
    pub role: InterfaceRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2_mode: Option<L2Mode>,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddressRecord>,
    #[serde(default)]
    pub vlans: Vec<VlanRecord>,
}

/// BgpSessionRecord is one peering session, addresses without host mask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpSessionRecord {
    pub status: ObjectStatus,
    pub local_ip: String,
    pub remote_ip: String,
    pub local_as: u32,
    pub remote_as: u32,
    pub peer_group: String,
}

/// DeviceRecord is the normalized inventory view of one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub platform: String,
    #[serde(rename = "type", alias = "device_type")]
    pub device_type: String,
    pub role: String,
    #[serde(default)]
    pub interfaces: Vec<InterfaceRecord>,
    #[serde(default)]
    pub bgp_sessions: Vec<BgpSessionRecord>,
}

impl DeviceRecord {
    pub fn interfaces_with_role(&self, role: InterfaceRole) -> impl Iterator<Item = &InterfaceRecord> {
        self.interfaces.iter().filter(move |i| i.role == role)
    }

    pub fn active_bgp_sessions(&self) -> impl Iterator<Item = &BgpSessionRecord> {
        self.bgp_sessions
            .iter()
            .filter(|s| s.status == ObjectStatus::Active)
    }

    /// First IPv4 host address (/32) on a loopback interface, without mask
    pub fn loopback_ipv4(&self) -> Option<&str> {
        self.interfaces_with_role(InterfaceRole::Loopback)
            .flat_map(|i| i.ip_addresses.iter())
            .find_map(|ip| ip.address.strip_suffix("/32"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_normalized_record() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{
                "name": "leaf1",
                "platform": "Nokia SR Linux",
                "type": "7220 IXR-D2",
                "role": "leaf",
                "interfaces": [
                    {"name": "ethernet-1/1", "enabled": true, "status": "active", "role": "uplink"},
                    {"name": "ethernet-1/2", "enabled": true, "status": "active", "role": "leaf", "l2_mode": "Trunk",
                     "vlans": [{"vlan_id": 10}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(record.device_type, "7220 IXR-D2");
        assert_eq!(record.description, None);
        assert_eq!(record.interfaces[1].l2_mode, Some(L2Mode::Trunk));
        assert!(record.bgp_sessions.is_empty());
    }

    #[test]
    fn test_loopback_ipv4() {
        let record = DeviceRecord {
            name: "spine1".into(),
            description: None,
            platform: platform::NOKIA_SRL.into(),
            device_type: "7250".into(),
            role: "spine".into(),
            interfaces: vec![InterfaceRecord {
                name: "lo0".into(),
                description: None,
                enabled: true,
                status: ObjectStatus::Active,
                role: InterfaceRole::Loopback,
                l2_mode: None,
                ip_addresses: vec![
                    IpAddressRecord { address: "2001:db8::1/128".into() },
                    IpAddressRecord { address: "10.255.0.12/32".into() },
                ],
                vlans: vec![],
            }],
            bgp_sessions: vec![],
        };
        assert_eq!(record.loopback_ipv4(), Some("10.255.0.12"));
    }
}
